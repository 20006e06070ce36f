//! Elementwise transforms, transpose and padding.
//!
//! Each transform has a single core taking an [`Operand`]: owned operands are
//! rewritten in place, borrowed ones are read into a fresh output. The public
//! `foo(&self)` / `into_foo(self)` pairs are thin wrappers over that core.

use super::{NumericArray, Operand};
use crate::element::{Element, RealElement};
use crate::error::{ArrayError, Result};
use std::ops::Range;

/// Apply `f` to every element of `operand`.
fn map_operand<T, F>(
    op: &'static str,
    operand: Operand<'_, T>,
    f: F,
) -> Result<NumericArray<T>>
where
    T: Element,
    F: Fn(T) -> T + Send + Sync,
{
    if operand.is_empty() {
        return Err(ArrayError::empty(op));
    }

    let parallelism = operand.parallelism();
    match operand {
        Operand::Owned(mut array) => {
            parallelism.for_each_chunk_mut(array.as_mut_slice(), |_, chunk| {
                for value in chunk.iter_mut() {
                    *value = f(*value);
                }
            });
            Ok(array)
        }
        Operand::Borrowed(view) => {
            let (height, width) = view.shape();
            let mut out = NumericArray::new(height, width)?.with_parallelism(parallelism);
            parallelism.zip_chunks_mut(out.as_mut_slice(), view.as_slice(), |out, source| {
                for (value, &x) in out.iter_mut().zip(source) {
                    *value = f(x);
                }
            });
            Ok(out)
        }
    }
}

fn transpose_operand<T: Element>(operand: Operand<'_, T>) -> Result<NumericArray<T>> {
    if operand.is_empty() {
        return Err(ArrayError::empty("transpose"));
    }

    let (height, width) = operand.shape();
    let parallelism = operand.parallelism();

    if height == 1 || width == 1 {
        return operand.into_owned()?.into_reshaped(width, height);
    }

    match operand {
        Operand::Owned(mut array) if height == width => {
            let data = array.as_mut_slice();
            for i in 0..height {
                for j in (i + 1)..width {
                    data.swap(i * width + j, j * width + i);
                }
            }
            Ok(array)
        }
        operand => {
            let source = operand.as_slice();
            let mut out = NumericArray::new(width, height)?.with_parallelism(parallelism);
            parallelism.for_each_row_mut(out.as_mut_slice(), height, |j, row| {
                for (i, value) in row.iter_mut().enumerate() {
                    *value = source[i * width + j];
                }
            });
            Ok(out)
        }
    }
}

fn shrink_operand<T: Element>(
    operand: Operand<'_, T>,
    threshold: f64,
) -> Result<NumericArray<T>> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ArrayError::InvalidArgument(format!(
            "shrink threshold must be finite and non-negative, got {threshold}"
        )));
    }

    map_operand("shrink", operand, move |x: T| {
        let magnitude = x.modulus();
        if magnitude == 0.0 {
            T::zero()
        } else {
            x.scale((1.0 - threshold / magnitude).max(0.0))
        }
    })
}

/// Where negative entries are removed.
enum Targets<'t> {
    Range(Range<usize>),
    Indices(&'t [usize]),
}

fn remove_neg_operand<T: RealElement>(
    operand: Operand<'_, T>,
    targets: Targets<'_>,
) -> Result<NumericArray<T>> {
    if operand.is_empty() {
        return Err(ArrayError::empty("remove_neg"));
    }

    let len = operand.len();
    match &targets {
        Targets::Range(range) if range.start > range.end || range.end > len => {
            return Err(ArrayError::InvalidArgument(format!(
                "range {range:?} is out of bounds for length {len}"
            )));
        }
        Targets::Indices(indices) => {
            if let Some(index) = indices.iter().find(|&&index| index >= len) {
                return Err(ArrayError::InvalidArgument(format!(
                    "index {index} is out of bounds for length {len}"
                )));
            }
        }
        Targets::Range(_) => {}
    }

    let mut out = operand.into_owned()?;
    let data = out.as_mut_slice();
    let mut zero_negative = |index: usize| {
        if data[index] < T::zero() {
            data[index] = T::zero();
        }
    };
    match targets {
        Targets::Range(range) => range.for_each(&mut zero_negative),
        Targets::Indices(indices) => indices.iter().copied().for_each(&mut zero_negative),
    }
    Ok(out)
}

fn pad_operand<T: Element>(
    operand: Operand<'_, T>,
    height: usize,
    width: usize,
) -> Result<NumericArray<T>> {
    let (current_height, current_width) = operand.shape();
    let target = (current_height.max(height), current_width.max(width));

    if target == operand.shape() {
        return operand.into_owned();
    }

    let parallelism = operand.parallelism();
    let mut out = NumericArray::new(target.0, target.1)?.with_parallelism(parallelism);
    if current_width > 0 {
        let source = operand.as_slice();
        for (row, values) in source.chunks(current_width).enumerate() {
            let start = row * target.1;
            out.as_mut_slice()[start..start + current_width].copy_from_slice(values);
        }
    }
    Ok(out)
}

impl<T: Element> NumericArray<T> {
    /// Transposed copy. Vectors only swap labels.
    pub fn transpose(&self) -> Result<Self> {
        transpose_operand(self.into())
    }

    /// Transpose reusing the buffer: vectors swap labels, square matrices swap
    /// across the diagonal in place, rectangular matrices are copied.
    pub fn into_transpose(self) -> Result<Self> {
        transpose_operand(self.into())
    }

    /// Elementwise magnitude.
    pub fn abs(&self) -> Result<Self> {
        map_operand("abs", self.into(), T::abs_value)
    }

    pub fn into_abs(self) -> Result<Self> {
        map_operand("abs", self.into(), T::abs_value)
    }

    /// Soft-threshold every element: `x * max(1 - t/|x|, 0)`.
    ///
    /// Magnitudes below `threshold` become zero, larger ones shrink toward zero
    /// by `threshold` with their sign (phase) preserved. Zero stays zero.
    pub fn shrink(&self, threshold: f64) -> Result<Self> {
        shrink_operand(self.into(), threshold)
    }

    pub fn into_shrink(self, threshold: f64) -> Result<Self> {
        shrink_operand(self.into(), threshold)
    }

    /// Copy zero-extended to at least `height` x `width`.
    pub fn padded(&self, height: usize, width: usize) -> Result<Self> {
        pad_operand(self.into(), height, width)
    }

    pub fn into_padded(self, height: usize, width: usize) -> Result<Self> {
        pad_operand(self.into(), height, width)
    }

    /// Zero-extend in place. No-op when the array already meets the target.
    pub fn pad(&mut self, height: usize, width: usize) -> Result<()> {
        if self.height() >= height && self.width() >= width {
            return Ok(());
        }
        *self = self.padded(height, width)?;
        Ok(())
    }
}

impl<T: RealElement> NumericArray<T> {
    /// Natural log of positive elements; everything else maps to zero.
    pub fn log(&self) -> Result<Self> {
        map_operand("log", self.into(), positive_ln)
    }

    pub fn into_log(self) -> Result<Self> {
        map_operand("log", self.into(), positive_ln)
    }

    /// Zero the negative entries within `range`.
    pub fn remove_neg_range(&self, range: Range<usize>) -> Result<Self> {
        remove_neg_operand(self.into(), Targets::Range(range))
    }

    pub fn into_remove_neg_range(self, range: Range<usize>) -> Result<Self> {
        remove_neg_operand(self.into(), Targets::Range(range))
    }

    /// Zero the negative entries at `indices`.
    pub fn remove_neg_at(&self, indices: &[usize]) -> Result<Self> {
        remove_neg_operand(self.into(), Targets::Indices(indices))
    }

    pub fn into_remove_neg_at(self, indices: &[usize]) -> Result<Self> {
        remove_neg_operand(self.into(), Targets::Indices(indices))
    }
}

#[inline]
fn positive_ln<T: RealElement>(x: T) -> T {
    if x > T::zero() {
        x.ln()
    } else {
        T::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sequence(height: usize, width: usize) -> NumericArray<f64> {
        let values: Vec<f64> = (1..=height * width).map(|v| v as f64).collect();
        NumericArray::from_slice(&values, height, width).unwrap()
    }

    #[test]
    fn test_transpose_moves_elements() {
        let array = sequence(3, 3);
        let transposed = array.transpose().unwrap();
        assert_eq!(array[(0, 2)], 3.0);
        assert_eq!(transposed[(2, 0)], 3.0);
    }

    #[test]
    fn test_transpose_is_involution() {
        for (height, width) in [(1, 5), (5, 1), (4, 4), (3, 7)] {
            let array = sequence(height, width);
            let once = array.transpose().unwrap();
            assert_eq!(once.shape(), (width, height));
            assert_eq!(once.into_transpose().unwrap(), array);
        }
    }

    #[test]
    fn test_square_transpose_is_in_place() {
        let array = sequence(4, 4);
        let before = array.as_slice().as_ptr();
        let transposed = array.into_transpose().unwrap();
        assert_eq!(transposed.as_slice().as_ptr(), before);
        assert_eq!(transposed[(0, 1)], 5.0);
    }

    #[test]
    fn test_transpose_empty_fails() {
        assert!(matches!(
            NumericArray::<f64>::empty().transpose(),
            Err(ArrayError::InvalidState(_))
        ));
    }

    #[test]
    fn test_log_maps_non_positive_to_zero() {
        let values = [1.0f64, std::f64::consts::E, 0.0, -3.0];
        let logged = NumericArray::from_slice(&values, 4, 1).unwrap().into_log().unwrap();

        assert_eq!(logged[0], 0.0);
        assert_relative_eq!(logged[1], 1.0);
        assert_eq!(logged[2], 0.0);
        assert_eq!(logged[3], 0.0);
    }

    #[test]
    fn test_abs_of_complex_is_modulus() {
        let array = NumericArray::from_slice(&[Complex::new(3.0f64, 4.0)], 1, 1).unwrap();
        assert_eq!(array.abs().unwrap()[0], Complex::new(5.0, 0.0));
    }

    #[test]
    fn test_shrink_zero_threshold_is_identity() {
        let array = NumericArray::from_slice(&[-2.0f64, 0.0, 1e-300, 7.5], 4, 1).unwrap();
        assert_eq!(array.shrink(0.0).unwrap(), array);
    }

    #[test]
    fn test_shrink_soft_thresholds() {
        let array = NumericArray::from_slice(&[-4.0f64, -0.5, 0.0, 0.5, 4.0], 5, 1).unwrap();
        let shrunk = array.into_shrink(1.0).unwrap();
        assert_eq!(shrunk.as_slice(), &[-3.0, 0.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_shrink_never_grows_or_flips() {
        let mut rng = StdRng::seed_from_u64(21);
        let values: Vec<f64> = (0..500).map(|_| rng.gen_range(-5.0..5.0)).collect();
        let array = NumericArray::from_slice(&values, 500, 1).unwrap();

        for threshold in [0.1, 1.0, 2.5, 10.0] {
            let shrunk = array.shrink(threshold).unwrap();
            for (&out, &x) in shrunk.as_slice().iter().zip(array.as_slice()) {
                assert!(out.abs() <= x.abs());
                if out != 0.0 {
                    assert_eq!(out.signum(), x.signum());
                }
            }
        }
    }

    #[test]
    fn test_shrink_rejects_bad_threshold() {
        let array = sequence(2, 2);
        assert!(array.shrink(-1.0).is_err());
        assert!(array.shrink(f64::NAN).is_err());
        assert!(array.shrink(f64::INFINITY).is_err());
    }

    #[test]
    fn test_remove_neg_range() {
        let array = NumericArray::from_slice(&[-1.0f64, -2.0, -3.0, -4.0], 4, 1).unwrap();
        let cleaned = array.remove_neg_range(1..3).unwrap();
        assert_eq!(cleaned.as_slice(), &[-1.0, 0.0, 0.0, -4.0]);
    }

    #[test]
    fn test_remove_neg_at_validates_before_writing() {
        let array = NumericArray::from_slice(&[-1.0f64, -2.0, 3.0], 3, 1).unwrap();
        assert!(matches!(
            array.clone().into_remove_neg_at(&[0, 9]),
            Err(ArrayError::InvalidArgument(_))
        ));

        let cleaned = array.into_remove_neg_at(&[1, 2]).unwrap();
        assert_eq!(cleaned.as_slice(), &[-1.0, 0.0, 3.0]);
    }

    #[test]
    fn test_pad_zero_fills() {
        let mut array = sequence(2, 2);
        array.pad(3, 3).unwrap();

        assert_eq!(array.shape(), (3, 3));
        assert_eq!(array.as_slice(), &[1.0, 2.0, 0.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pad_never_shrinks() {
        let array = sequence(4, 2);
        let padded = array.padded(2, 3).unwrap();
        assert_eq!(padded.shape(), (4, 3));

        let same = array.padded(1, 1).unwrap();
        assert_eq!(same, array);
    }
}
