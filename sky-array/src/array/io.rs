//! Raw binary persistence and tolerant comparison.
//!
//! The binary format is the row-major element stream with no header; the
//! reader must supply the dimensions and element type. Elements are written
//! in the machine's byte order, which is little-endian on every supported
//! target.

use super::NumericArray;
use crate::element::{Element, RealElement};
use crate::error::{ArrayError, Result};
use log::{debug, info, trace};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

#[cfg(not(target_endian = "little"))]
compile_error!("binary array persistence assumes a little-endian target");

fn io_error(path: &Path, source: std::io::Error) -> ArrayError {
    ArrayError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Outcome of [`NumericArray::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareReport {
    pub mismatches: usize,
    pub total: usize,
}

impl CompareReport {
    /// True when every element matched.
    pub fn is_match(&self) -> bool {
        self.mismatches == 0
    }

    /// Mismatches as a percentage of all compared elements.
    pub fn mismatch_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.mismatches as f64 / self.total as f64
        }
    }
}

impl<T: Element> NumericArray<T> {
    /// Write the raw element stream to `path`.
    pub fn write_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if self.is_empty() {
            return Err(ArrayError::empty("write_binary"));
        }

        let file = File::create(path).map_err(|e| io_error(path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(bytemuck::cast_slice(self.as_slice()))
            .and_then(|_| writer.flush())
            .map_err(|e| io_error(path, e))?;

        debug!(
            "wrote {}x{} array to {}",
            self.height(),
            self.width(),
            path.display()
        );
        Ok(())
    }

    /// Load a `height` x `width` array from a raw element stream.
    ///
    /// An empty file fails with `EmptyFile`, a file holding fewer than
    /// `height * width` elements with `Io`. Trailing bytes are ignored.
    pub fn read_binary<P: AsRef<Path>>(path: P, height: usize, width: usize) -> Result<Self> {
        let path = path.as_ref();
        let file_len = file_len(path)?;

        let mut array = Self::new(height, width)?;
        let needed = array.len() * std::mem::size_of::<T>();
        if file_len < needed as u64 {
            return Err(io_error(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("file holds {file_len} bytes, {height}x{width} array needs {needed}"),
                ),
            ));
        }

        let mut file = File::open(path).map_err(|e| io_error(path, e))?;
        file.read_exact(bytemuck::cast_slice_mut(array.as_mut_slice()))
            .map_err(|e| io_error(path, e))?;

        debug!("read {height}x{width} array from {}", path.display());
        Ok(array)
    }

    /// Load a column vector holding every whole element in the file.
    pub fn read_binary_inferred<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let count = file_len(path)? as usize / std::mem::size_of::<T>();
        if count == 0 {
            return Err(io_error(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "file is shorter than one element",
                ),
            ));
        }
        Self::read_binary(path, count, 1)
    }

    /// Elementwise approximate comparison with another array of equal length.
    ///
    /// The summary is logged at `info`, each mismatch at `trace`.
    pub fn compare(&self, other: &Self) -> Result<CompareReport> {
        if self.len() != other.len() {
            return Err(ArrayError::DimensionMismatch {
                op: "compare",
                left: self.shape(),
                right: other.shape(),
            });
        }

        let mut mismatches = 0;
        for (index, (&a, &b)) in self.as_slice().iter().zip(other.as_slice()).enumerate() {
            if !a.approx_eq(b) {
                trace!("mismatch at {index}: {a} != {b}");
                mismatches += 1;
            }
        }

        let report = CompareReport {
            mismatches,
            total: self.len(),
        };
        info!(
            "compare: {} of {} elements differ ({:.2}%)",
            report.mismatches,
            report.total,
            report.mismatch_percentage()
        );
        Ok(report)
    }
}

impl<T: RealElement> NumericArray<T> {
    /// Load a file of element type `U` and convert it to `T`.
    pub fn read_binary_as<U: RealElement, P: AsRef<Path>>(
        path: P,
        height: usize,
        width: usize,
    ) -> Result<Self> {
        NumericArray::<U>::read_binary(path, height, width)?.cast()
    }
}

fn file_len(path: &Path) -> Result<u64> {
    let len = std::fs::metadata(path)
        .map_err(|e| io_error(path, e))?
        .len();
    if len == 0 {
        return Err(ArrayError::EmptyFile(path.to_path_buf()));
    }
    Ok(len)
}
