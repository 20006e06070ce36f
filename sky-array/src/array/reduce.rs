//! Norms, sums and counts.
//!
//! Every reduction partitions the buffer into one chunk per worker, reduces
//! each chunk to a partial and combines the partials in chunk order.

use super::NumericArray;
use crate::element::Element;
use crate::error::{ArrayError, Result};

/// Vector norm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Norm {
    /// Σ|x|
    One,
    /// √Σ|x|²
    Two,
    /// Σ|x|²
    TwoSquared,
    /// max|x|
    Inf,
}

impl<T: Element> NumericArray<T> {
    /// Norm of all elements viewed as one vector.
    pub fn norm(&self, norm: Norm) -> Result<f64> {
        if self.is_empty() {
            return Err(ArrayError::empty("norm"));
        }

        let parallelism = self.parallelism();
        let data = self.as_slice();
        let value = match norm {
            Norm::One => parallelism.reduce(
                data,
                0.0,
                |chunk| chunk.iter().map(|x| x.modulus()).sum::<f64>(),
                |acc, partial| acc + partial,
            ),
            Norm::TwoSquared => self.sum_of_squares(),
            Norm::Two => self.sum_of_squares().sqrt(),
            Norm::Inf => parallelism.reduce(
                data,
                0.0,
                |chunk| chunk.iter().map(|x| x.modulus()).fold(0.0, f64::max),
                f64::max,
            ),
        };
        Ok(value)
    }

    fn sum_of_squares(&self) -> f64 {
        self.parallelism().reduce(
            self.as_slice(),
            0.0,
            |chunk| chunk.iter().map(|x| x.modulus_squared()).sum::<f64>(),
            |acc, partial| acc + partial,
        )
    }

    /// Σx over all elements.
    pub fn sum(&self) -> Result<T> {
        if self.is_empty() {
            return Err(ArrayError::empty("sum"));
        }

        Ok(self.parallelism().reduce(
            self.as_slice(),
            T::zero(),
            |chunk| chunk.iter().fold(T::zero(), |acc, &x| acc + x),
            |acc, partial| acc + partial,
        ))
    }

    /// Number of elements that are not approximately zero.
    pub fn non_zero_amount(&self) -> Result<usize> {
        if self.is_empty() {
            return Err(ArrayError::empty("non_zero_amount"));
        }

        Ok(self.parallelism().reduce(
            self.as_slice(),
            0usize,
            |chunk| chunk.iter().filter(|x| !x.is_approx_zero()).count(),
            |acc, partial| acc + partial,
        ))
    }
}
