//! Error types for array operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or operating on a [`NumericArray`].
///
/// Every operation validates its preconditions before writing to any owned
/// buffer, so an `Err` never leaves the receiver partially modified.
///
/// [`NumericArray`]: crate::NumericArray
#[derive(Error, Debug)]
pub enum ArrayError {
    #[error("dimension mismatch in {op}: left is {left:?}, right is {right:?}")]
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("could not allocate {bytes} bytes for array storage")]
    AllocationFailure { bytes: usize },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("input file {0} is empty")]
    EmptyFile(PathBuf),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ArrayError>;

impl ArrayError {
    pub(crate) fn empty(op: &str) -> Self {
        ArrayError::InvalidState(format!(
            "{op} requires non-zero dimensions and allocated storage"
        ))
    }
}
