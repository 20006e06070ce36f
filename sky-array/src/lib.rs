//! sky-array - Dense numeric arrays for sky image reconstruction
//!
//! This crate provides the array engine consumed by the forward model and
//! the outer shrinkage solver:
//!
//! - **NumericArray** - contiguous, aligned, row-major storage of real or
//!   complex elements with explicit ownership transfer
//! - **Arithmetic** - elementwise and scalar operations that reuse an owned
//!   operand's buffer instead of allocating
//! - **Multiplication** - inner product, matrix·vector, vector·matrix and
//!   matrix·matrix kernels
//! - **Reductions** - norms, sums and nonzero counts computed with
//!   deterministic partial-then-combine parallel reductions
//! - **Transforms** - transpose, log, abs, shrinkage, negative removal,
//!   connected component maxima and padding
//! - **Persistence** - raw headerless binary dump and load
//!
//! # Example
//!
//! ```
//! use sky_array::{NumericArray, Norm};
//!
//! let values: Vec<f64> = (1..=9).map(f64::from).collect();
//! let array = NumericArray::from_slice(&values, 3, 3)?;
//!
//! assert_eq!(array.norm(Norm::One)?, 45.0);
//! assert_eq!(array.norm(Norm::Inf)?, 9.0);
//!
//! let transposed = array.transpose()?;
//! assert_eq!(transposed[(2, 0)], 3.0);
//! # Ok::<(), sky_array::ArrayError>(())
//! ```

pub mod array;
pub mod element;
pub mod error;
pub mod float_cmp;
pub mod parallel;

pub use array::{
    ArrayView, AsArrayView, BinaryOp, CompareReport, Norm, NumericArray, Operand,
};
pub use element::{Element, RealElement};
pub use error::{ArrayError, Result};
pub use float_cmp::{is_equal, is_equal_f32, is_zero};
pub use parallel::Parallelism;
