//! Scalar element types storable in a [`NumericArray`].
//!
//! Real (`f32`, `f64`) and complex (`Complex<f32>`, `Complex<f64>`) scalars
//! share the [`Element`] capabilities: arithmetic, magnitude, conjugation and
//! approximate comparison. Operations that need an ordering (log, negative
//! removal, component maxima) are restricted to [`RealElement`].
//!
//! [`NumericArray`]: crate::NumericArray

use crate::float_cmp::{is_equal, is_equal_f32};
use num_complex::Complex;
use num_traits::{Float, NumAssign};
use std::fmt::{Debug, Display};

/// A scalar stored in a numeric array.
///
/// `bytemuck::Pod` provides the raw byte view used by binary persistence.
pub trait Element:
    NumAssign + Copy + Debug + Display + Send + Sync + bytemuck::Pod + 'static
{
    /// Magnitude |x| as `f64`.
    fn modulus(self) -> f64;

    /// Squared magnitude |x|² as `f64`.
    fn modulus_squared(self) -> f64;

    /// Complex conjugate (identity for real types).
    fn conjugate(self) -> Self;

    /// Multiply by a real factor.
    fn scale(self, factor: f64) -> Self;

    /// Build an element from a real value.
    fn from_real(value: f64) -> Self;

    /// Epsilon-tolerant equality (component-wise for complex values).
    fn approx_eq(self, other: Self) -> bool;

    /// Epsilon-tolerant zero test.
    fn is_approx_zero(self) -> bool {
        self.approx_eq(Self::zero())
    }

    /// |x| represented in the element type (on the real axis for complex).
    fn abs_value(self) -> Self {
        Self::from_real(self.modulus())
    }
}

/// An ordered real scalar.
pub trait RealElement: Element + Float {}

impl Element for f64 {
    #[inline]
    fn modulus(self) -> f64 {
        self.abs()
    }

    #[inline]
    fn modulus_squared(self) -> f64 {
        self * self
    }

    #[inline]
    fn conjugate(self) -> Self {
        self
    }

    #[inline]
    fn scale(self, factor: f64) -> Self {
        self * factor
    }

    #[inline]
    fn from_real(value: f64) -> Self {
        value
    }

    #[inline]
    fn approx_eq(self, other: Self) -> bool {
        is_equal(self, other)
    }
}

impl Element for f32 {
    #[inline]
    fn modulus(self) -> f64 {
        f64::from(self.abs())
    }

    #[inline]
    fn modulus_squared(self) -> f64 {
        let value = f64::from(self);
        value * value
    }

    #[inline]
    fn conjugate(self) -> Self {
        self
    }

    #[inline]
    fn scale(self, factor: f64) -> Self {
        (f64::from(self) * factor) as f32
    }

    #[inline]
    fn from_real(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn approx_eq(self, other: Self) -> bool {
        is_equal_f32(self, other)
    }
}

impl RealElement for f64 {}
impl RealElement for f32 {}

impl<T> Element for Complex<T>
where
    T: RealElement,
    Complex<T>: NumAssign + Display + bytemuck::Pod,
{
    #[inline]
    fn modulus(self) -> f64 {
        self.re.modulus().hypot(self.im.modulus())
    }

    #[inline]
    fn modulus_squared(self) -> f64 {
        self.re.modulus_squared() + self.im.modulus_squared()
    }

    #[inline]
    fn conjugate(self) -> Self {
        self.conj()
    }

    #[inline]
    fn scale(self, factor: f64) -> Self {
        Complex::new(self.re.scale(factor), self.im.scale(factor))
    }

    #[inline]
    fn from_real(value: f64) -> Self {
        Complex::new(T::from_real(value), T::zero())
    }

    #[inline]
    fn approx_eq(self, other: Self) -> bool {
        self.re.approx_eq(other.re) && self.im.approx_eq(other.im)
    }
}
