use std::fmt;
use std::hash::Hash;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::{Real, Repr};

/// Signed integer storage for a fixed-point value.
///
/// Arithmetic is carried out in `i128` and wrapped back into the storage
/// width, so overflow wraps instead of saturating.
pub trait Raw: Copy + Default + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    const BITS: u32;

    fn widen(self) -> i128;

    /// Keep the low `BITS` bits of `v`.
    fn wrap(v: i128) -> Self;
}

macro_rules! impl_raw {
    ($($t:ty),*) => {
        $(
            impl Raw for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline(always)]
                fn widen(self) -> i128 {
                    self as i128
                }

                #[inline(always)]
                fn wrap(v: i128) -> Self {
                    v as $t
                }
            }
        )*
    };
}

impl_raw!(i8, i16, i32, i64);

/// Binary fixed-point value `raw / 2^K`.
///
/// Comparison and equality look at `raw` directly; values of different
/// precision must be converted with [`Real::cast`] before comparing.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedBase<S, const K: u32> {
    raw: S,
}

/// Shift `raw` from `from` fractional bits to `to` fractional bits.
#[inline(always)]
fn rescale(raw: i128, from: u32, to: u32) -> i128 {
    if to >= from { raw << (to - from) } else { raw >> (from - to) }
}

impl<S: Raw, const K: u32> FixedBase<S, K> {
    const FRAC_FITS: () = assert!(K <= S::BITS, "fractional bits exceed storage width");

    pub fn from_raw(raw: S) -> Self {
        let () = Self::FRAC_FITS;
        Self { raw }
    }

    pub fn raw(self) -> S {
        self.raw
    }

    #[inline(always)]
    fn wide(self) -> i128 {
        self.raw.widen()
    }

    #[inline(always)]
    fn from_wide(v: i128) -> Self {
        Self::from_raw(S::wrap(v))
    }
}

impl<S: Raw, const K: u32> Real for FixedBase<S, K> {
    fn from_int(v: i64) -> Self {
        Self::from_wide((v as i128) << K)
    }

    fn from_f64(v: f64) -> Self {
        // float -> int casts truncate toward zero
        Self::from_wide((v * (K as f64).exp2()) as i128)
    }

    fn to_f64(self) -> f64 {
        self.wide() as f64 / (K as f64).exp2()
    }

    fn to_repr(self) -> Repr {
        Repr::Scaled { raw: self.wide(), frac: K }
    }

    fn from_repr(repr: Repr) -> Self {
        match repr {
            Repr::Scaled { raw, frac } => Self::from_wide(rescale(raw, frac, K)),
            Repr::Float(v) => Self::from_f64(v),
        }
    }

    fn abs(self) -> Self {
        Self::from_wide(self.wide().abs())
    }
}

// Mixed-precision operators keep the receiver's storage and scale.

impl<S: Raw, const K: u32, S2: Raw, const K2: u32> Add<FixedBase<S2, K2>> for FixedBase<S, K> {
    type Output = Self;

    fn add(self, rhs: FixedBase<S2, K2>) -> Self {
        Self::from_wide(self.wide() + rescale(rhs.wide(), K2, K))
    }
}

impl<S: Raw, const K: u32, S2: Raw, const K2: u32> Sub<FixedBase<S2, K2>> for FixedBase<S, K> {
    type Output = Self;

    fn sub(self, rhs: FixedBase<S2, K2>) -> Self {
        Self::from_wide(self.wide() - rescale(rhs.wide(), K2, K))
    }
}

impl<S: Raw, const K: u32, S2: Raw, const K2: u32> Mul<FixedBase<S2, K2>> for FixedBase<S, K> {
    type Output = Self;

    fn mul(self, rhs: FixedBase<S2, K2>) -> Self {
        Self::from_wide((self.wide() * rhs.wide()) >> K2)
    }
}

impl<S: Raw, const K: u32, S2: Raw, const K2: u32> Div<FixedBase<S2, K2>> for FixedBase<S, K> {
    type Output = Self;

    /// Panics when `rhs` is zero.
    fn div(self, rhs: FixedBase<S2, K2>) -> Self {
        Self::from_wide((self.wide() << K2) / rhs.wide())
    }
}

impl<S: Raw, const K: u32> Neg for FixedBase<S, K> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_wide(-self.wide())
    }
}

impl<S: Raw, const K: u32, S2: Raw, const K2: u32> AddAssign<FixedBase<S2, K2>> for FixedBase<S, K> {
    fn add_assign(&mut self, rhs: FixedBase<S2, K2>) {
        *self = *self + rhs;
    }
}

impl<S: Raw, const K: u32, S2: Raw, const K2: u32> SubAssign<FixedBase<S2, K2>> for FixedBase<S, K> {
    fn sub_assign(&mut self, rhs: FixedBase<S2, K2>) {
        *self = *self - rhs;
    }
}

impl<S: Raw, const K: u32, S2: Raw, const K2: u32> MulAssign<FixedBase<S2, K2>> for FixedBase<S, K> {
    fn mul_assign(&mut self, rhs: FixedBase<S2, K2>) {
        *self = *self * rhs;
    }
}

impl<S: Raw, const K: u32, S2: Raw, const K2: u32> DivAssign<FixedBase<S2, K2>> for FixedBase<S, K> {
    fn div_assign(&mut self, rhs: FixedBase<S2, K2>) {
        *self = *self / rhs;
    }
}

impl<S: Raw, const K: u32> fmt::Display for FixedBase<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl<S: Raw, const K: u32> fmt::Debug for FixedBase<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?}/2^{})", self.to_f64(), self.raw, K)
    }
}
