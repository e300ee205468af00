//! Compile-time mapping from a requested bit width to integer storage.

use super::Raw;

/// Marker for a requested storage width of `N` bits.
pub struct Bits<const N: u32>;

/// Integer of exactly the requested width.
pub trait ExactWidth {
    type Repr: Raw;
}

/// Fastest native integer holding at least the requested width.
///
/// Follows the `int_fastN_t` choices of 64-bit Linux targets: byte-sized
/// requests stay in `i8`, everything wider runs in a full `i64` register.
pub trait FastWidth {
    type Repr: Raw;
}

impl ExactWidth for Bits<8> {
    type Repr = i8;
}

impl ExactWidth for Bits<16> {
    type Repr = i16;
}

impl ExactWidth for Bits<32> {
    type Repr = i32;
}

impl ExactWidth for Bits<64> {
    type Repr = i64;
}

macro_rules! fast_width {
    ($t:ty => $($n:literal)*) => {
        $(
            impl FastWidth for Bits<$n> {
                type Repr = $t;
            }
        )*
    };
}

fast_width!(i8 => 1 2 3 4 5 6 7 8);
fast_width!(i64 =>
    9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28
    29 30 31 32 33 34 35 36 37 38 39 40 41 42 43 44 45 46 47 48
    49 50 51 52 53 54 55 56 57 58 59 60 61 62 63 64
);

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of<T: Raw>() -> u32 {
        T::BITS
    }

    #[test]
    fn test_exact_widths() {
        assert_eq!(bits_of::<<Bits<8> as ExactWidth>::Repr>(), 8);
        assert_eq!(bits_of::<<Bits<16> as ExactWidth>::Repr>(), 16);
        assert_eq!(bits_of::<<Bits<32> as ExactWidth>::Repr>(), 32);
        assert_eq!(bits_of::<<Bits<64> as ExactWidth>::Repr>(), 64);
    }

    #[test]
    fn test_fast_widths_hold_request() {
        assert_eq!(bits_of::<<Bits<5> as FastWidth>::Repr>(), 8);
        assert_eq!(bits_of::<<Bits<12> as FastWidth>::Repr>(), 64);
        assert_eq!(bits_of::<<Bits<32> as FastWidth>::Repr>(), 64);
        assert_eq!(bits_of::<<Bits<64> as FastWidth>::Repr>(), 64);
    }
}
