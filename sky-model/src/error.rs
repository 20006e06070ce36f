//! Error types for operators and the forward model.

use sky_array::ArrayError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("array error: {0}")]
    Array(#[from] ArrayError),
    #[error("{operator} expects input of length {expected}, got {actual}")]
    DimensionMismatch {
        operator: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
