//! Elementwise and scalar arithmetic.

use super::{NumericArray, Operand};
use crate::element::Element;
use crate::error::{ArrayError, Result};

/// Elementwise binary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    /// Hadamard (elementwise) product.
    Mul,
    Div,
}

impl BinaryOp {
    #[inline]
    pub fn apply<T: Element>(self, lhs: T, rhs: T) -> T {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "hadamard",
            BinaryOp::Div => "div",
        }
    }
}

/// Same shape, or two vectors of equal length.
fn check_compatible<T: Element>(
    op: BinaryOp,
    left: &Operand<'_, T>,
    right: &Operand<'_, T>,
) -> Result<()> {
    let same_shape = left.shape() == right.shape();
    let same_vector = left.is_vector() && right.is_vector() && left.len() == right.len();

    if same_shape || same_vector {
        Ok(())
    } else {
        Err(ArrayError::DimensionMismatch {
            op: op.name(),
            left: left.shape(),
            right: right.shape(),
        })
    }
}

impl<T: Element> NumericArray<T> {
    /// `lhs op rhs` elementwise.
    ///
    /// An empty operand yields the other operand unchanged. Whichever operand
    /// is owned has its buffer reused for the result; two borrowed operands
    /// allocate a fresh output. The result takes the shape and parallelism of
    /// `lhs`.
    pub fn elementwise(lhs: Operand<'_, T>, rhs: Operand<'_, T>, op: BinaryOp) -> Result<Self> {
        if lhs.is_empty() {
            return rhs.into_owned();
        }
        if rhs.is_empty() {
            return lhs.into_owned();
        }
        check_compatible(op, &lhs, &rhs)?;

        let parallelism = lhs.parallelism();
        let (height, width) = lhs.shape();

        match (lhs, rhs) {
            (Operand::Borrowed(left), Operand::Owned(mut right)) => {
                parallelism.zip_chunks_mut(right.as_mut_slice(), left.as_slice(), |out, lhs| {
                    for (value, &l) in out.iter_mut().zip(lhs) {
                        *value = op.apply(l, *value);
                    }
                });
                right.reshape(height, width)?;
                Ok(right.with_parallelism(parallelism))
            }
            (left, right) => {
                let mut out = left.into_owned()?;
                parallelism.zip_chunks_mut(out.as_mut_slice(), right.as_slice(), |out, rhs| {
                    for (value, &r) in out.iter_mut().zip(rhs) {
                        *value = op.apply(*value, r);
                    }
                });
                Ok(out)
            }
        }
    }

    pub fn try_add(&self, rhs: &Self) -> Result<Self> {
        Self::elementwise(self.into(), rhs.into(), BinaryOp::Add)
    }

    pub fn try_sub(&self, rhs: &Self) -> Result<Self> {
        Self::elementwise(self.into(), rhs.into(), BinaryOp::Sub)
    }

    pub fn try_hadamard(&self, rhs: &Self) -> Result<Self> {
        Self::elementwise(self.into(), rhs.into(), BinaryOp::Mul)
    }

    pub fn try_div(&self, rhs: &Self) -> Result<Self> {
        Self::elementwise(self.into(), rhs.into(), BinaryOp::Div)
    }

    pub fn into_add(self, rhs: &Self) -> Result<Self> {
        Self::elementwise(self.into(), rhs.into(), BinaryOp::Add)
    }

    pub fn into_sub(self, rhs: &Self) -> Result<Self> {
        Self::elementwise(self.into(), rhs.into(), BinaryOp::Sub)
    }

    pub fn into_hadamard(self, rhs: &Self) -> Result<Self> {
        Self::elementwise(self.into(), rhs.into(), BinaryOp::Mul)
    }

    pub fn into_div(self, rhs: &Self) -> Result<Self> {
        Self::elementwise(self.into(), rhs.into(), BinaryOp::Div)
    }

    /// Apply `op` in place. Shapes are validated before `self` is touched.
    pub fn apply_in_place(&mut self, rhs: &Self, op: BinaryOp) -> Result<()> {
        if !self.is_empty() && !rhs.is_empty() {
            check_compatible(op, &Operand::from(&*self), &Operand::from(rhs))?;
        }
        let lhs = self.take();
        *self = Self::elementwise(lhs.into(), rhs.into(), op)?;
        Ok(())
    }

    pub fn add_in_place(&mut self, rhs: &Self) -> Result<()> {
        self.apply_in_place(rhs, BinaryOp::Add)
    }

    pub fn sub_in_place(&mut self, rhs: &Self) -> Result<()> {
        self.apply_in_place(rhs, BinaryOp::Sub)
    }

    pub fn hadamard_in_place(&mut self, rhs: &Self) -> Result<()> {
        self.apply_in_place(rhs, BinaryOp::Mul)
    }

    pub fn div_in_place(&mut self, rhs: &Self) -> Result<()> {
        self.apply_in_place(rhs, BinaryOp::Div)
    }

    /// `operand op scalar` for every element. Requires a non-empty operand.
    pub fn elementwise_scalar(operand: Operand<'_, T>, scalar: T, op: BinaryOp) -> Result<Self> {
        if operand.is_empty() {
            return Err(ArrayError::empty(op.name()));
        }

        let parallelism = operand.parallelism();
        let mut out = operand.into_owned()?;
        parallelism.for_each_chunk_mut(out.as_mut_slice(), |_, chunk| {
            for value in chunk.iter_mut() {
                *value = op.apply(*value, scalar);
            }
        });
        Ok(out)
    }

    pub fn add_scalar(&self, scalar: T) -> Result<Self> {
        Self::elementwise_scalar(self.into(), scalar, BinaryOp::Add)
    }

    pub fn sub_scalar(&self, scalar: T) -> Result<Self> {
        Self::elementwise_scalar(self.into(), scalar, BinaryOp::Sub)
    }

    pub fn mul_scalar(&self, scalar: T) -> Result<Self> {
        Self::elementwise_scalar(self.into(), scalar, BinaryOp::Mul)
    }

    pub fn div_scalar(&self, scalar: T) -> Result<Self> {
        Self::elementwise_scalar(self.into(), scalar, BinaryOp::Div)
    }

    fn scalar_in_place(&mut self, scalar: T, op: BinaryOp) -> Result<()> {
        self.validate()?;
        let lhs = self.take();
        *self = Self::elementwise_scalar(lhs.into(), scalar, op)?;
        Ok(())
    }

    pub fn add_scalar_in_place(&mut self, scalar: T) -> Result<()> {
        self.scalar_in_place(scalar, BinaryOp::Add)
    }

    pub fn sub_scalar_in_place(&mut self, scalar: T) -> Result<()> {
        self.scalar_in_place(scalar, BinaryOp::Sub)
    }

    pub fn mul_scalar_in_place(&mut self, scalar: T) -> Result<()> {
        self.scalar_in_place(scalar, BinaryOp::Mul)
    }

    pub fn div_scalar_in_place(&mut self, scalar: T) -> Result<()> {
        self.scalar_in_place(scalar, BinaryOp::Div)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::Parallelism;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random(height: usize, width: usize, seed: u64) -> NumericArray<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let values: Vec<f64> = (0..height * width)
            .map(|_| rng.gen_range(-10.0..10.0))
            .collect();
        NumericArray::from_slice(&values, height, width).unwrap()
    }

    #[test]
    fn test_add_then_sub_restores() {
        let a = random(7, 5, 1);
        let b = random(7, 5, 2);

        let restored = a.try_add(&b).unwrap().into_sub(&b).unwrap();
        for (&r, &expected) in restored.as_slice().iter().zip(a.as_slice()) {
            assert_abs_diff_eq!(r, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_empty_operand_returns_other() {
        let a = random(3, 3, 3);
        let empty = NumericArray::<f64>::empty();

        assert_eq!(a.try_add(&empty).unwrap(), a);
        assert_eq!(empty.try_sub(&a).unwrap(), a);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = random(3, 2, 4);
        let b = random(2, 3, 5);
        assert!(matches!(
            a.try_hadamard(&b),
            Err(ArrayError::DimensionMismatch { op: "hadamard", .. })
        ));
    }

    #[test]
    fn test_row_and_column_vectors_are_compatible() {
        let row = NumericArray::from_slice(&[1.0f64, 2.0, 3.0], 1, 3).unwrap();
        let col = NumericArray::from_slice(&[1.0f64, 1.0, 1.0], 3, 1).unwrap();

        let sum = row.try_add(&col).unwrap();
        assert_eq!(sum.shape(), (1, 3));
        assert_eq!(sum.as_slice(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_owned_right_operand_keeps_order() {
        let a = NumericArray::from_slice(&[8.0f64, 6.0], 2, 1).unwrap();
        let b = NumericArray::from_slice(&[2.0f64, 3.0], 2, 1).unwrap();

        let quotient = NumericArray::elementwise((&a).into(), b.into(), BinaryOp::Div).unwrap();
        assert_eq!(quotient.as_slice(), &[4.0, 2.0]);
    }

    #[test]
    fn test_in_place_failure_leaves_receiver_intact() {
        let mut a = random(3, 3, 6);
        let before = a.clone();
        let b = random(2, 2, 7);

        assert!(a.add_in_place(&b).is_err());
        assert_eq!(a, before);
    }

    #[test]
    fn test_scalar_ops() {
        let mut a = NumericArray::from_slice(&[1.0f64, 2.0], 2, 1).unwrap();
        assert_eq!(a.mul_scalar(3.0).unwrap().as_slice(), &[3.0, 6.0]);

        a.sub_scalar_in_place(1.0).unwrap();
        assert_eq!(a.as_slice(), &[0.0, 1.0]);

        let empty = NumericArray::<f64>::empty();
        assert!(matches!(
            empty.add_scalar(1.0),
            Err(ArrayError::InvalidState(_))
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let a = random(100, 50, 8);
        let b = random(100, 50, 9);

        let sequential = a.try_hadamard(&b).unwrap();
        let parallel = a
            .clone()
            .with_parallelism(Parallelism::new(4))
            .into_hadamard(&b)
            .unwrap();
        assert_eq!(sequential, parallel);
    }
}
