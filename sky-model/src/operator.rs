//! The linear operator contract shared by every stage of the forward model.

use crate::error::{ModelError, Result};
use sky_array::{ArrayView, Element, NumericArray, Parallelism};

/// A linear map from vectors of length `width` to vectors of length `height`.
///
/// For the real operators in this crate the algebraic transpose is the
/// adjoint, so `⟨A x, y⟩ = ⟨x, Aᵀ y⟩`. Cloning an operator is a deep copy.
pub trait LinearOperator<T: Element>: Send + Sync {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Output length.
    fn height(&self) -> usize;

    /// Input length.
    fn width(&self) -> usize;

    fn is_transposed(&self) -> bool;

    /// Fail with `InvalidState` when the operator has no coefficients.
    fn validate(&self) -> Result<()>;

    /// Compute `A x`. `x` must hold exactly `width` elements.
    fn apply(&self, x: ArrayView<'_, T>) -> Result<NumericArray<T>>;

    /// Replace the operator with its adjoint. Applying it twice restores the
    /// original operator.
    fn transpose(&mut self) -> Result<()>;

    /// Degree of parallelism used by `apply`.
    fn set_parallelism(&mut self, parallelism: Parallelism);

    /// Consuming form of [`LinearOperator::transpose`].
    fn transposed(mut self) -> Result<Self>
    where
        Self: Sized,
    {
        self.transpose()?;
        Ok(self)
    }

    /// Validate the operator and the length of `x`.
    fn check_input(&self, x: &ArrayView<'_, T>) -> Result<()> {
        self.validate()?;
        if x.len() != self.width() {
            return Err(ModelError::DimensionMismatch {
                operator: self.name(),
                expected: self.width(),
                actual: x.len(),
            });
        }
        Ok(())
    }
}
