//! Non-owning array views and owned-or-borrowed operands.

use super::{holds_shape, NumericArray};
use crate::element::Element;
use crate::error::{ArrayError, Result};
use crate::parallel::Parallelism;
use std::ops::Range;

/// A read-only window onto row-major elements owned elsewhere.
///
/// Views borrow their source and can never release it. They are the only
/// way to slice an array into segments.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a, T> {
    height: usize,
    width: usize,
    data: &'a [T],
    parallelism: Parallelism,
}

impl<'a, T: Element> ArrayView<'a, T> {
    /// Wrap `data` as a `height` x `width` view.
    pub fn new(data: &'a [T], height: usize, width: usize) -> Result<Self> {
        if !holds_shape(data.len(), height, width) {
            return Err(ArrayError::DimensionMismatch {
                op: "view",
                left: (height, width),
                right: (data.len(), 1),
            });
        }
        let (height, width) = if data.is_empty() { (0, 0) } else { (height, width) };

        Ok(Self {
            height,
            width,
            data,
            parallelism: Parallelism::default(),
        })
    }

    pub(crate) fn from_parts(
        data: &'a [T],
        height: usize,
        width: usize,
        parallelism: Parallelism,
    ) -> Self {
        debug_assert_eq!(height * width, data.len());
        Self {
            height,
            width,
            data,
            parallelism,
        }
    }

    /// Set the degree of parallelism used by kernels reading this view.
    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row or column vector (including 1x1).
    pub fn is_vector(&self) -> bool {
        !self.is_empty() && (self.height == 1 || self.width == 1)
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Same elements under different dimension labels.
    pub fn reshaped(self, height: usize, width: usize) -> Result<Self> {
        if !holds_shape(self.len(), height, width) {
            return Err(ArrayError::DimensionMismatch {
                op: "reshape",
                left: self.shape(),
                right: (height, width),
            });
        }
        Ok(Self {
            height,
            width,
            ..self
        })
    }

    /// Sub-range of the elements labelled `height` x `width`.
    pub fn segment(self, range: Range<usize>, height: usize, width: usize) -> Result<Self> {
        if range.start > range.end || range.end > self.len() {
            return Err(ArrayError::InvalidArgument(format!(
                "segment {range:?} is out of bounds for length {}",
                self.len()
            )));
        }
        ArrayView::new(&self.data[range], height, width)
            .map(|view| view.with_parallelism(self.parallelism))
    }

    /// Copy into a new owned array.
    pub fn to_owned(&self) -> Result<NumericArray<T>> {
        NumericArray::from_slice(self.data, self.height, self.width)
            .map(|array| array.with_parallelism(self.parallelism))
    }
}

/// Anything that can be read as an [`ArrayView`].
pub trait AsArrayView<T> {
    fn array_view(&self) -> ArrayView<'_, T>;
}

impl<T: Element> AsArrayView<T> for NumericArray<T> {
    fn array_view(&self) -> ArrayView<'_, T> {
        self.view()
    }
}

impl<T: Element> AsArrayView<T> for ArrayView<'_, T> {
    fn array_view(&self) -> ArrayView<'_, T> {
        *self
    }
}

/// An operand whose buffer may be reused (`Owned`) or must be left alone
/// (`Borrowed`).
///
/// Every transform has a single core that takes an `Operand`: an owned
/// operand is modified in place and returned, a borrowed one is read while
/// a fresh output is allocated.
#[derive(Debug)]
pub enum Operand<'a, T> {
    Owned(NumericArray<T>),
    Borrowed(ArrayView<'a, T>),
}

impl<'a, T: Element> Operand<'a, T> {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Operand::Owned(array) => array.shape(),
            Operand::Borrowed(view) => view.shape(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Operand::Owned(array) => array.len(),
            Operand::Borrowed(view) => view.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_vector(&self) -> bool {
        match self {
            Operand::Owned(array) => array.is_vector(),
            Operand::Borrowed(view) => view.is_vector(),
        }
    }

    pub fn parallelism(&self) -> Parallelism {
        match self {
            Operand::Owned(array) => array.parallelism(),
            Operand::Borrowed(view) => view.parallelism(),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Operand::Owned(array) => array.as_slice(),
            Operand::Borrowed(view) => view.as_slice(),
        }
    }

    /// Take the owned array, copying a borrowed view.
    pub fn into_owned(self) -> Result<NumericArray<T>> {
        match self {
            Operand::Owned(array) => Ok(array),
            Operand::Borrowed(view) => view.to_owned(),
        }
    }
}

impl<T> From<NumericArray<T>> for Operand<'_, T> {
    fn from(array: NumericArray<T>) -> Self {
        Operand::Owned(array)
    }
}

impl<'a, T: Element> From<&'a NumericArray<T>> for Operand<'a, T> {
    fn from(array: &'a NumericArray<T>) -> Self {
        Operand::Borrowed(array.view())
    }
}

impl<'a, T> From<ArrayView<'a, T>> for Operand<'a, T> {
    fn from(view: ArrayView<'a, T>) -> Self {
        Operand::Borrowed(view)
    }
}
