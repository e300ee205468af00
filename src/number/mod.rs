//! Numeric kinds the simulation is generic over.
//!
//! Pressure, velocity and flow each pick their own representation: a binary
//! fixed-point number (exact-width or fast storage) or a native float. Values
//! cross between kinds through [`Repr`], which keeps fixed-point conversions
//! exact up to the shift implied by the fractional bit counts.

mod fixed;
mod float;
mod width;

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

pub use fixed::{FixedBase, Raw};
pub use width::{Bits, ExactWidth, FastWidth};

/// Fixed-point number stored in a signed integer of exactly `N` bits with `K` fractional bits.
pub type Fixed<const N: u32, const K: u32> = FixedBase<<Bits<N> as ExactWidth>::Repr, K>;

/// Fixed-point number stored in the fastest native integer of at least `N` bits.
pub type FastFixed<const N: u32, const K: u32> = FixedBase<<Bits<N> as FastWidth>::Repr, K>;

/// Kind-neutral value used when converting between numeric kinds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Repr {
    /// `raw / 2^frac`
    Scaled { raw: i128, frac: u32 },
    Float(f64),
}

/// Number of low bits of a random draw that form a uniform fraction.
pub const RANDOM_BITS: u32 = 16;

pub trait Real:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + Send
    + 'static
{
    fn from_int(v: i64) -> Self;
    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;
    fn to_repr(self) -> Repr;
    fn from_repr(repr: Repr) -> Self;
    fn abs(self) -> Self;

    fn zero() -> Self {
        Self::default()
    }

    fn one() -> Self {
        Self::from_int(1)
    }

    /// Convert into another numeric kind.
    fn cast<T: Real>(self) -> T {
        T::from_repr(self.to_repr())
    }

    /// Uniform fraction in `[0, 1)` built from the low 16 bits of a draw.
    fn random01(draw: u32) -> Self {
        let raw = (draw & ((1 << RANDOM_BITS) - 1)) as i128;
        Self::from_repr(Repr::Scaled { raw, frac: RANDOM_BITS })
    }
}

/// Smaller of two values; `a` wins ties.
pub fn min<T: Real>(a: T, b: T) -> T {
    if b < a { b } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_fixed_to_float_and_back() {
        let x = Fixed::<32, 16>::from_f64(3.25);
        let f: f64 = x.cast();
        assert_eq!(f, 3.25);
        let back: Fixed<32, 16> = f.cast();
        assert_eq!(back, x);
    }

    #[test]
    fn test_widen_then_narrow_is_identity() {
        for raw in [-70000i32, -1, 0, 1, 12345, 1 << 20] {
            let x = Fixed::<32, 8>::from_raw(raw);
            let wide: Fixed<64, 24> = x.cast();
            assert_eq!(wide.raw(), (raw as i64) << 16);
            let narrow: Fixed<32, 8> = wide.cast();
            assert_eq!(narrow.raw(), raw, "round trip changed raw {}", raw);
        }
    }

    #[test]
    fn test_fast_and_exact_agree() {
        let a = Fixed::<32, 16>::from_f64(1.5);
        let b = Fixed::<32, 16>::from_f64(-0.75);
        let fa = FastFixed::<32, 16>::from_f64(1.5);
        let fb = FastFixed::<32, 16>::from_f64(-0.75);
        assert_eq!((a * b).to_f64(), (fa * fb).to_f64());
        assert_eq!((a / b).to_f64(), (fa / fb).to_f64());
        assert_eq!((a + b).to_f64(), (fa + fb).to_f64());
        assert_eq!((a - b).to_f64(), (fa - fb).to_f64());
    }

    #[test]
    fn test_random01_range() {
        assert_eq!(Fixed::<32, 16>::random01(0).raw(), 0);
        assert_eq!(Fixed::<32, 16>::random01(0xFFFF_FFFF).raw(), 0xFFFF);
        let top = f64::random01(0xFFFF);
        assert!(top < 1.0 && top > 0.99, "random01 out of range: {}", top);
        // Only the low 16 bits count
        assert_eq!(f32::random01(0x0001_0000), 0.0);
    }

    #[test]
    fn test_random01_narrow_precision_truncates() {
        // 0x8000 / 2^16 = 0.5 exactly, representable with one fractional bit
        assert_eq!(Fixed::<16, 1>::random01(0x8000).raw(), 1);
        assert_eq!(Fixed::<16, 1>::random01(0x7FFF).raw(), 0);
    }

    #[test]
    fn test_min_prefers_first_on_tie() {
        assert_eq!(min(2.0f64, 2.0), 2.0);
        assert_eq!(min(3.0f64, 1.0), 1.0);
        assert_eq!(min(Fixed::<32, 16>::from_int(-1), Fixed::<32, 16>::from_int(4)).to_f64(), -1.0);
    }
}
