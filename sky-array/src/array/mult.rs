//! Dense matrix products and the inner product.

use super::{ArrayView, NumericArray};
use crate::element::Element;
use crate::error::{ArrayError, Result};
use crate::parallel::Parallelism;

impl<T: Element> NumericArray<T> {
    /// Matrix product `self * rhs`. See [`NumericArray::product`].
    pub fn matmul(&self, rhs: &Self) -> Result<Self> {
        Self::product(self.view(), rhs.view())
    }

    /// Matrix product of two views.
    ///
    /// Requires `lhs.width == rhs.height`. Dispatches on shape:
    /// `1xn * nx1` yields a 1x1 result, `mxn * nx1` and `1xm * mxn` use the
    /// vector kernels and anything else the general product. An empty operand
    /// yields a copy of the other.
    pub fn product(lhs: ArrayView<'_, T>, rhs: ArrayView<'_, T>) -> Result<Self> {
        if lhs.is_empty() {
            return rhs.to_owned();
        }
        if rhs.is_empty() {
            return lhs.to_owned();
        }
        if lhs.width() != rhs.height() {
            return Err(ArrayError::DimensionMismatch {
                op: "matmul",
                left: lhs.shape(),
                right: rhs.shape(),
            });
        }

        let parallelism = lhs.parallelism();
        let out = match (lhs.shape(), rhs.shape()) {
            ((1, _), (_, 1)) => {
                let dot = dot_product(parallelism, lhs.as_slice(), rhs.as_slice());
                NumericArray::filled(dot, 1, 1)?
            }
            (_, (_, 1)) => matrix_vector(lhs, rhs)?,
            ((1, _), _) => vector_matrix(lhs, rhs)?,
            _ => matrix_matrix(lhs, rhs)?,
        };

        Ok(out.with_parallelism(parallelism))
    }

    /// Inner product Σ conj(aᵢ)·bᵢ of two equal-length arrays.
    pub fn inner(&self, rhs: &Self) -> Result<T> {
        if self.is_empty() || rhs.is_empty() {
            return Err(ArrayError::empty("inner"));
        }
        if self.len() != rhs.len() {
            return Err(ArrayError::DimensionMismatch {
                op: "inner",
                left: self.shape(),
                right: rhs.shape(),
            });
        }

        Ok(self.parallelism().zip_reduce(
            self.as_slice(),
            rhs.as_slice(),
            T::zero(),
            |a, b| {
                a.iter()
                    .zip(b)
                    .fold(T::zero(), |acc, (&x, &y)| acc + x.conjugate() * y)
            },
            |acc, partial| acc + partial,
        ))
    }
}

fn dot_product<T: Element>(parallelism: Parallelism, a: &[T], b: &[T]) -> T {
    parallelism.zip_reduce(
        a,
        b,
        T::zero(),
        |a, b| a.iter().zip(b).fold(T::zero(), |acc, (&x, &y)| acc + x * y),
        |acc, partial| acc + partial,
    )
}

/// `mxn * nx1`, one output row per matrix row.
fn matrix_vector<T: Element>(
    matrix: ArrayView<'_, T>,
    vector: ArrayView<'_, T>,
) -> Result<NumericArray<T>> {
    let width = matrix.width();
    let coefficients = matrix.as_slice();
    let x = vector.as_slice();

    let mut out = NumericArray::new(matrix.height(), 1)?;
    matrix
        .parallelism()
        .for_each_chunk_mut(out.as_mut_slice(), |offset, chunk| {
            for (i, value) in chunk.iter_mut().enumerate() {
                let row = offset + i;
                let coefficients = &coefficients[row * width..(row + 1) * width];
                *value = coefficients
                    .iter()
                    .zip(x)
                    .fold(T::zero(), |acc, (&a, &b)| acc + a * b);
            }
        });
    Ok(out)
}

/// `1xm * mxn`, accumulated row by row over disjoint output columns.
fn vector_matrix<T: Element>(
    vector: ArrayView<'_, T>,
    matrix: ArrayView<'_, T>,
) -> Result<NumericArray<T>> {
    let width = matrix.width();
    let coefficients = matrix.as_slice();
    let v = vector.as_slice();

    let mut out = NumericArray::new(1, width)?;
    vector
        .parallelism()
        .for_each_chunk_mut(out.as_mut_slice(), |offset, chunk| {
            for (k, &scale) in v.iter().enumerate() {
                let row = &coefficients[k * width + offset..k * width + offset + chunk.len()];
                for (value, &a) in chunk.iter_mut().zip(row) {
                    *value += scale * a;
                }
            }
        });
    Ok(out)
}

/// General `mxn * nxp` in i-k-j order.
fn matrix_matrix<T: Element>(
    lhs: ArrayView<'_, T>,
    rhs: ArrayView<'_, T>,
) -> Result<NumericArray<T>> {
    let inner = lhs.width();
    let width = rhs.width();
    let a = lhs.as_slice();
    let b = rhs.as_slice();

    let mut out = NumericArray::new(lhs.height(), width)?;
    lhs.parallelism()
        .for_each_row_mut(out.as_mut_slice(), width, |i, row| {
            for k in 0..inner {
                let scale = a[i * inner + k];
                let b_row = &b[k * width..(k + 1) * width];
                for (value, &coefficient) in row.iter_mut().zip(b_row) {
                    *value += scale * coefficient;
                }
            }
        });
    Ok(out)
}
