//! Dense matrix operator, the core of every structured basis operator.

use crate::error::{ModelError, Result};
use crate::operator::LinearOperator;
use sky_array::{ArrayView, Element, NumericArray, Parallelism};

/// `y = M x` for a dense coefficient matrix `M`.
#[derive(Debug, Clone)]
pub struct MatMult<T: Element> {
    name: &'static str,
    coefficients: NumericArray<T>,
    transposed: bool,
}

impl<T: Element> MatMult<T> {
    /// Wrap a non-empty coefficient matrix.
    pub fn new(name: &'static str, coefficients: NumericArray<T>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(ModelError::InvalidArgument(format!(
                "{name} needs a non-empty coefficient matrix"
            )));
        }
        Ok(Self {
            name,
            coefficients,
            transposed: false,
        })
    }

    /// Coefficients in the current orientation.
    pub fn coefficients(&self) -> &NumericArray<T> {
        &self.coefficients
    }
}

impl<T: Element> LinearOperator<T> for MatMult<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn height(&self) -> usize {
        self.coefficients.height()
    }

    fn width(&self) -> usize {
        self.coefficients.width()
    }

    fn is_transposed(&self) -> bool {
        self.transposed
    }

    fn validate(&self) -> Result<()> {
        if self.coefficients.is_empty() {
            return Err(ModelError::InvalidState(format!(
                "{} has no coefficients",
                self.name
            )));
        }
        Ok(())
    }

    fn apply(&self, x: ArrayView<'_, T>) -> Result<NumericArray<T>> {
        self.check_input(&x)?;
        let column = x.reshaped(x.len(), 1)?;
        Ok(NumericArray::product(self.coefficients.view(), column)?)
    }

    fn transpose(&mut self) -> Result<()> {
        self.coefficients = self.coefficients.take().into_transpose()?;
        self.transposed = !self.transposed;
        Ok(())
    }

    fn set_parallelism(&mut self, parallelism: Parallelism) {
        self.coefficients.set_parallelism(parallelism);
    }
}
