//! Epsilon-tolerant floating point comparison.
//!
//! Computed results are never tested with `==`. Two values are considered
//! equal when their difference is small relative to their magnitude, or when
//! the difference is below the smallest positive normal `f64` (the subnormal
//! guard that lets values such as `1e-320` compare equal to zero).

/// Relative tolerance multiplier applied to `f64::EPSILON`.
const RELATIVE_TOLERANCE: f64 = 10.0;

/// Approximate equality of two real values.
///
/// `|a - b| < |a + b| * 10 * EPSILON` or `|a - b| < f64::MIN_POSITIVE`.
#[inline]
pub fn is_equal(first: f64, second: f64) -> bool {
    let difference = (first - second).abs();
    let normal_test = difference < (first + second).abs() * f64::EPSILON * RELATIVE_TOLERANCE;
    let subnormal_test = difference < f64::MIN_POSITIVE;

    normal_test || subnormal_test
}

/// Approximate zero test, the same predicate as `is_equal(value, 0.0)`.
#[inline]
pub fn is_zero(value: f64) -> bool {
    is_equal(value, 0.0)
}

/// [`is_equal`] at `f32` precision.
#[inline]
pub fn is_equal_f32(first: f32, second: f32) -> bool {
    let difference = (first - second).abs();
    let normal_test = difference < (first + second).abs() * f32::EPSILON * RELATIVE_TOLERANCE as f32;
    let subnormal_test = difference < f32::MIN_POSITIVE;

    normal_test || subnormal_test
}
