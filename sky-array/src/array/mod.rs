//! Dense, row-major numeric arrays with aligned storage.
//!
//! A [`NumericArray`] is either empty (zero dimensions, no buffer) or holds a
//! non-empty aligned buffer of exactly `height * width` elements. The
//! operations are split across submodules by concern: elementwise arithmetic,
//! multiplication kernels, reductions, transforms, connected components and
//! binary persistence.

mod arith;
mod components;
mod io;
mod mult;
mod reduce;
mod storage;
mod transform;
mod view;

pub use arith::BinaryOp;
pub use io::CompareReport;
pub use reduce::Norm;
pub use storage::{is_aligned, required_alignment};
pub use view::{ArrayView, AsArrayView, Operand};

use crate::element::{Element, RealElement};
use crate::error::{ArrayError, Result};
use crate::parallel::Parallelism;
use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use std::fmt;
use std::ops::{Index, IndexMut, Range};
use storage::AlignedBuffer;

/// Dense row-major matrix or vector of [`Element`]s.
pub struct NumericArray<T> {
    height: usize,
    width: usize,
    buffer: Option<AlignedBuffer<T>>,
    parallelism: Parallelism,
}

impl<T: Element> NumericArray<T> {
    /// Zero-filled `height` x `width` array. A zero dimension yields the
    /// empty array.
    pub fn new(height: usize, width: usize) -> Result<Self> {
        Self::filled(T::zero(), height, width)
    }

    /// `height` x `width` array with every element set to `value`.
    pub fn filled(value: T, height: usize, width: usize) -> Result<Self> {
        if height == 0 || width == 0 {
            return Ok(Self::empty());
        }
        let len = checked_len(height, width)?;
        Ok(Self::with_buffer(AlignedBuffer::filled(len, value)?, height, width))
    }

    /// Copy `values` into a new `height` x `width` array.
    pub fn from_slice(values: &[T], height: usize, width: usize) -> Result<Self> {
        check_len("from_slice", values.len(), height, width)?;
        if values.is_empty() {
            return Ok(Self::empty());
        }
        Ok(Self::with_buffer(AlignedBuffer::from_slice(values)?, height, width))
    }

    /// Take ownership of `values` without copying.
    ///
    /// The vector's allocation must already sit on the array alignment
    /// boundary (see [`required_alignment`]), otherwise `InvalidArgument`.
    pub fn from_vec(values: Vec<T>, height: usize, width: usize) -> Result<Self> {
        check_len("from_vec", values.len(), height, width)?;
        if values.is_empty() {
            return Ok(Self::empty());
        }
        Ok(Self::with_buffer(AlignedBuffer::adopt(values)?, height, width))
    }

    /// Column vector copied from `values`.
    pub fn column(values: &[T]) -> Result<Self> {
        Self::from_slice(values, values.len(), 1)
    }

    /// Copy of `values`.
    pub fn from_array2(values: &Array2<T>) -> Result<Self> {
        let (height, width) = values.dim();
        match values.as_slice() {
            Some(slice) => Self::from_slice(slice, height, width),
            None => {
                let copied: Vec<T> = values.iter().copied().collect();
                Self::from_slice(&copied, height, width)
            }
        }
    }

    fn with_buffer(buffer: AlignedBuffer<T>, height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            buffer: Some(buffer),
            parallelism: Parallelism::default(),
        }
    }

    /// Fallible deep copy.
    pub fn try_clone(&self) -> Result<Self> {
        let buffer = match &self.buffer {
            Some(buffer) => Some(buffer.try_clone()?),
            None => None,
        };
        Ok(Self {
            height: self.height,
            width: self.width,
            buffer,
            parallelism: self.parallelism,
        })
    }

    /// Fail with `InvalidState` when the array is empty.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ArrayError::empty("validate"));
        }
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        match &self.buffer {
            Some(buffer) => buffer.as_slice(),
            None => &[],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.buffer {
            Some(buffer) => buffer.as_mut_slice(),
            None => &mut [],
        }
    }

    /// Non-owning view of the whole array.
    pub fn view(&self) -> ArrayView<'_, T> {
        ArrayView::from_parts(self.as_slice(), self.height, self.width, self.parallelism)
    }

    /// Non-owning view of `range` labelled `height` x `width`.
    pub fn segment(
        &self,
        range: Range<usize>,
        height: usize,
        width: usize,
    ) -> Result<ArrayView<'_, T>> {
        self.view().segment(range, height, width)
    }

    /// Relabel the dimensions without moving data.
    pub fn reshape(&mut self, height: usize, width: usize) -> Result<()> {
        if !holds_shape(self.len(), height, width) {
            return Err(ArrayError::DimensionMismatch {
                op: "reshape",
                left: self.shape(),
                right: (height, width),
            });
        }
        if !self.is_empty() {
            self.height = height;
            self.width = width;
        }
        Ok(())
    }

    /// Consuming form of [`NumericArray::reshape`].
    pub fn into_reshaped(mut self, height: usize, width: usize) -> Result<Self> {
        self.reshape(height, width)?;
        Ok(self)
    }

    /// Owned copy of the elements in `range` as a column vector.
    pub fn partial(&self, range: Range<usize>) -> Result<Self> {
        self.validate()?;
        let len = range.len();
        self.segment(range, len, 1)?.to_owned()
    }

    /// Move the contents out, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::empty().with_parallelism(self.parallelism))
    }

    /// Element at (`row`, `col`), if in bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.as_slice().get(row * self.width + col).copied()
    }

    /// Copy into an owned `ndarray` matrix.
    pub fn to_array2(&self) -> Array2<T> {
        Array2::from_shape_vec((self.height, self.width), self.as_slice().to_vec())
            .unwrap_or_else(|_| Array2::from_elem((0, 0), T::zero()))
    }

    /// Borrow as an `ndarray` matrix view.
    pub fn as_array2(&self) -> Result<ArrayView2<'_, T>> {
        ArrayView2::from_shape((self.height, self.width), self.as_slice()).map_err(|e| {
            ArrayError::InvalidState(format!("array storage does not match its shape: {e}"))
        })
    }

    /// Borrow as a mutable `ndarray` matrix view.
    pub fn as_array2_mut(&mut self) -> Result<ArrayViewMut2<'_, T>> {
        let shape = self.shape();
        ArrayViewMut2::from_shape(shape, self.as_mut_slice()).map_err(|e| {
            ArrayError::InvalidState(format!("array storage does not match its shape: {e}"))
        })
    }

    /// True when both arrays share the same buffer (identity, not value).
    pub fn same_storage(&self, other: &Self) -> bool {
        match (&self.buffer, &other.buffer) {
            (Some(a), Some(b)) => std::ptr::eq(a.as_ptr(), b.as_ptr()),
            _ => false,
        }
    }
}

impl<T> NumericArray<T> {
    /// The empty array: zero dimensions, no buffer.
    pub fn empty() -> Self {
        Self {
            height: 0,
            width: 0,
            buffer: None,
            parallelism: Parallelism::default(),
        }
    }

    /// Set the degree of parallelism used by kernels on this array and on
    /// results derived from it.
    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn set_parallelism(&mut self, parallelism: Parallelism) {
        self.parallelism = parallelism;
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_none()
    }

    /// Row or column vector (including 1x1).
    pub fn is_vector(&self) -> bool {
        !self.is_empty() && (self.height == 1 || self.width == 1)
    }

    pub fn is_square(&self) -> bool {
        !self.is_empty() && self.height == self.width
    }
}

impl<T: RealElement> NumericArray<T> {
    /// True if any element is strictly negative.
    pub fn contains_negative(&self) -> bool {
        self.as_slice().iter().any(|&value| value < T::zero())
    }

    /// Convert every element into another real type.
    pub fn cast<U: RealElement>(&self) -> Result<NumericArray<U>> {
        let converted = self
            .as_slice()
            .iter()
            .map(|&value| {
                <U as num_traits::NumCast>::from(value).ok_or_else(|| {
                    ArrayError::InvalidArgument(format!("{value} is not representable"))
                })
            })
            .collect::<Result<Vec<U>>>()?;

        Ok(NumericArray::from_slice(&converted, self.height, self.width)?
            .with_parallelism(self.parallelism))
    }
}

fn checked_len(height: usize, width: usize) -> Result<usize> {
    height
        .checked_mul(width)
        .ok_or(ArrayError::AllocationFailure { bytes: usize::MAX })
}

/// `height * width == len` without overflowing.
fn holds_shape(len: usize, height: usize, width: usize) -> bool {
    height.checked_mul(width) == Some(len)
}

fn check_len(op: &'static str, len: usize, height: usize, width: usize) -> Result<()> {
    if checked_len(height, width)? != len {
        return Err(ArrayError::DimensionMismatch {
            op,
            left: (height, width),
            right: (len, 1),
        });
    }
    Ok(())
}

impl<T> Default for NumericArray<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Element> Clone for NumericArray<T> {
    fn clone(&self) -> Self {
        Self {
            height: self.height,
            width: self.width,
            buffer: self.buffer.clone(),
            parallelism: self.parallelism,
        }
    }
}

impl<T> fmt::Debug for NumericArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericArray")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("empty", &self.buffer.is_none())
            .field("parallelism", &self.parallelism)
            .finish()
    }
}

/// One row per line, tab separated.
impl<T: Element> fmt::Display for NumericArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "[empty]");
        }
        for row in self.as_slice().chunks(self.width) {
            let line: Vec<String> = row.iter().map(|value| value.to_string()).collect();
            writeln!(f, "{}", line.join("\t"))?;
        }
        Ok(())
    }
}

/// Exact value equality: identical shapes and identical elements. Use
/// [`NumericArray::compare`] for tolerant comparison of computed results.
impl<T: Element> PartialEq for NumericArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.as_slice() == other.as_slice()
    }
}

impl<T: Element> Index<usize> for NumericArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Element> IndexMut<usize> for NumericArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T: Element> Index<(usize, usize)> for NumericArray<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.height && col < self.width,
            "index ({row}, {col}) out of bounds for {}x{} array",
            self.height,
            self.width
        );
        &self.as_slice()[row * self.width + col]
    }
}

impl<T: Element> IndexMut<(usize, usize)> for NumericArray<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(
            row < self.height && col < self.width,
            "index ({row}, {col}) out of bounds for {}x{} array",
            self.height,
            self.width
        );
        let width = self.width;
        &mut self.as_mut_slice()[row * width + col]
    }
}
