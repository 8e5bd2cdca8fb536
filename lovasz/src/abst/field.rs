use std::fmt::{Debug, Display};
use std::ops::Neg;
use num_complex::Complex;
use num_traits::{Float, FloatConst, Num, NumAssign};

// -- Field trait -- //

/// A real or complex floating-point scalar field.
///
/// `round` rounds each real coordinate to the nearest integer with ties away
/// from zero, so `round(±1.5) = ±2` and, for complex scalars,
/// `round(a+bi) = round(a) + round(b)i`.
pub trait Field:
    Copy +
    Num +
    NumAssign +
    Neg<Output = Self> +
    PartialEq +
    Display +
    Debug +
    Send +
    Sync +
    'static
{
    type Real: Real;

    /// Size-reduction slack of the field: 1 for real scalars, √2 for complex.
    fn phi() -> Self::Real;

    fn from_real(a: Self::Real) -> Self;

    /// For real fields the imaginary part must be zero.
    fn from_parts(re: Self::Real, im: Self::Real) -> Self;

    fn re(&self) -> Self::Real;
    fn im(&self) -> Self::Real;
    fn conj(&self) -> Self;

    /// Modulus, computed overflow-free.
    fn abs(&self) -> Self::Real;
    fn abs_sqr(&self) -> Self::Real;

    fn round(&self) -> Self;
    fn recip(&self) -> Self;
    fn is_finite(&self) -> bool;

    fn eps() -> Self::Real {
        <Self::Real as Float>::epsilon()
    }
}

/// The base real of a [`Field`].
pub trait Real: Field<Real = Self> + Float + FloatConst + PartialOrd {
    fn from_f64(a: f64) -> Self;

    fn from_usize(n: usize) -> Self {
        Self::from_f64(n as f64)
    }

    fn half() -> Self {
        Self::from_f64(0.5)
    }

    /// `√(x² + y²)` without overflow.
    fn safe_norm(self, other: Self) -> Self {
        self.hypot(other)
    }
}

// -- implementations -- //

macro_rules! impl_for_real {
    ($type:ty) => {
        impl Field for $type {
            type Real = Self;

            fn phi() -> Self {
                1.0
            }

            fn from_real(a: Self) -> Self {
                a
            }

            fn from_parts(re: Self, im: Self) -> Self {
                debug_assert!(im == 0.0);
                let _ = im;
                re
            }

            fn re(&self) -> Self {
                *self
            }

            fn im(&self) -> Self {
                0.0
            }

            fn conj(&self) -> Self {
                *self
            }

            fn abs(&self) -> Self {
                Float::abs(*self)
            }

            fn abs_sqr(&self) -> Self {
                self * self
            }

            fn round(&self) -> Self {
                Float::round(*self)
            }

            fn recip(&self) -> Self {
                Float::recip(*self)
            }

            fn is_finite(&self) -> bool {
                <$type>::is_finite(*self)
            }
        }

        impl Real for $type {
            fn from_f64(a: f64) -> Self {
                a as $type
            }
        }
    };
}

impl_for_real!(f32);
impl_for_real!(f64);

macro_rules! impl_for_complex {
    ($base:ty) => {
        impl Field for Complex<$base> {
            type Real = $base;

            fn phi() -> $base {
                <$base as Float>::sqrt(2.0)
            }

            fn from_real(a: $base) -> Self {
                Complex::new(a, 0.0)
            }

            fn from_parts(re: $base, im: $base) -> Self {
                Complex::new(re, im)
            }

            fn re(&self) -> $base {
                self.re
            }

            fn im(&self) -> $base {
                self.im
            }

            fn conj(&self) -> Self {
                Complex::new(self.re, -self.im)
            }

            fn abs(&self) -> $base {
                self.re.hypot(self.im)
            }

            fn abs_sqr(&self) -> $base {
                self.re * self.re + self.im * self.im
            }

            fn round(&self) -> Self {
                Complex::new(self.re.round(), self.im.round())
            }

            fn recip(&self) -> Self {
                Complex::inv(self)
            }

            fn is_finite(&self) -> bool {
                self.re.is_finite() && self.im.is_finite()
            }
        }
    };
}

impl_for_complex!(f32);
impl_for_complex!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_ties_away() {
        assert_eq!(Field::round(&1.5_f64), 2.0);
        assert_eq!(Field::round(&-1.5_f64), -2.0);
        assert_eq!(Field::round(&0.49_f64), 0.0);
        assert_eq!(Field::round(&2.5_f32), 3.0);
    }

    #[test]
    fn round_complex() {
        let a = Complex::new(1.5_f64, -0.5);
        assert_eq!(Field::round(&a), Complex::new(2.0, -1.0));
    }

    #[test]
    fn phi() {
        assert_eq!(<f64 as Field>::phi(), 1.0);
        assert_eq!(<Complex<f64> as Field>::phi(), 2.0_f64.sqrt());
    }

    #[test]
    fn conj() {
        assert_eq!(Field::conj(&3.0_f64), 3.0);

        let a = Complex::new(1.0_f64, 2.0);
        assert_eq!(Field::conj(&a), Complex::new(1.0, -2.0));
        assert_eq!(a.abs_sqr(), 5.0);
    }

    #[test]
    fn safe_norm() {
        assert_eq!(3.0_f64.safe_norm(4.0), 5.0);

        let big = 1e300_f64;
        let r = big.safe_norm(big);
        assert!(r.is_finite());
        assert!((r / big - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn finiteness() {
        assert!(Field::is_finite(&1.0_f64));
        assert!(!Field::is_finite(&f64::INFINITY));
        assert!(!Field::is_finite(&Complex::new(0.0_f64, f64::NAN)));
    }
}
