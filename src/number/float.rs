use super::{Real, Repr};

macro_rules! impl_real_float {
    ($($t:ty),*) => {
        $(
            impl Real for $t {
                fn from_int(v: i64) -> Self {
                    v as $t
                }

                fn from_f64(v: f64) -> Self {
                    v as $t
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn to_repr(self) -> Repr {
                    Repr::Float(self as f64)
                }

                fn from_repr(repr: Repr) -> Self {
                    match repr {
                        Repr::Scaled { raw, frac } => (raw as f64 / (frac as f64).exp2()) as $t,
                        Repr::Float(v) => v as $t,
                    }
                }

                fn abs(self) -> Self {
                    <$t>::abs(self)
                }
            }
        )*
    };
}

impl_real_float!(f32, f64);
