//! Owned, aligned element storage.
//!
//! The buffer is aligned to `size_of::<T>()` rounded up to the next power of
//! two, so a `Complex<f64>` element always starts on a 16 byte boundary. The
//! layout used for the allocation is stored alongside the pointer and the
//! buffer is released exactly once, in `Drop`.

use crate::element::Element;
use crate::error::{ArrayError, Result};
use std::alloc::Layout;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

/// Byte boundary every array buffer of `T` is aligned to.
pub fn required_alignment<T>() -> usize {
    std::mem::size_of::<T>()
        .next_power_of_two()
        .max(std::mem::align_of::<T>())
}

/// Check whether `ptr` sits on an `align` byte boundary.
#[inline]
pub fn is_aligned<T>(ptr: *const T, align: usize) -> bool {
    (ptr as usize) % align == 0
}

pub(crate) struct AlignedBuffer<T> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
}

// Safety: the buffer exclusively owns its elements.
unsafe impl<T: Send> Send for AlignedBuffer<T> {}
unsafe impl<T: Sync> Sync for AlignedBuffer<T> {}

impl<T: Element> AlignedBuffer<T> {
    /// Allocate room for `len` elements without initializing them.
    ///
    /// Callers must write every element before exposing the buffer.
    fn allocate(len: usize) -> Result<Self> {
        debug_assert!(len > 0, "buffers always hold at least one element");

        let bytes = std::mem::size_of::<T>()
            .checked_mul(len)
            .ok_or(ArrayError::AllocationFailure { bytes: usize::MAX })?;
        let layout = Layout::from_size_align(bytes, required_alignment::<T>())
            .map_err(|_| ArrayError::AllocationFailure { bytes })?;

        // Safety: layout has non-zero size since len > 0 and T is not a ZST.
        let raw = unsafe { std::alloc::alloc(layout) };
        let ptr = NonNull::new(raw.cast::<T>()).ok_or(ArrayError::AllocationFailure { bytes })?;

        Ok(Self { ptr, len, layout })
    }

    /// Allocate `len` elements all set to `value`.
    pub fn filled(len: usize, value: T) -> Result<Self> {
        let buffer = Self::allocate(len)?;
        for i in 0..len {
            // Safety: i < len and the allocation holds len elements.
            unsafe { buffer.ptr.as_ptr().add(i).write(value) };
        }
        Ok(buffer)
    }

    /// Allocate a copy of `values`.
    pub fn from_slice(values: &[T]) -> Result<Self> {
        let buffer = Self::allocate(values.len())?;
        // Safety: both regions hold values.len() elements and cannot overlap.
        unsafe {
            std::ptr::copy_nonoverlapping(values.as_ptr(), buffer.ptr.as_ptr(), values.len());
        }
        Ok(buffer)
    }

    /// Take ownership of a vector's allocation.
    ///
    /// Fails with `InvalidArgument` when the vector's storage does not sit on
    /// the array alignment boundary.
    pub fn adopt(values: Vec<T>) -> Result<Self> {
        if values.is_empty() {
            return Err(ArrayError::InvalidArgument(
                "cannot adopt an empty buffer".to_string(),
            ));
        }

        let align = required_alignment::<T>();
        if !is_aligned(values.as_ptr(), align) {
            return Err(ArrayError::InvalidArgument(format!(
                "foreign buffer is not {align} byte aligned"
            )));
        }

        let mut values = ManuallyDrop::new(values);
        let layout = Layout::array::<T>(values.capacity()).map_err(|_| {
            ArrayError::AllocationFailure {
                bytes: values.capacity().saturating_mul(std::mem::size_of::<T>()),
            }
        })?;
        let ptr = NonNull::new(values.as_mut_ptr()).ok_or_else(|| {
            ArrayError::InvalidArgument("foreign buffer pointer is null".to_string())
        })?;

        Ok(Self {
            ptr,
            len: values.len(),
            layout,
        })
    }

    /// Fallible deep copy.
    pub fn try_clone(&self) -> Result<Self> {
        Self::from_slice(self.as_slice())
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // Safety: every element is initialized at construction.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // Safety: every element is initialized and the buffer is uniquely owned.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }
}

impl<T> Drop for AlignedBuffer<T> {
    fn drop(&mut self) {
        // Safety: ptr was obtained from the global allocator with this layout.
        unsafe { std::alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), self.layout) };
    }
}

impl<T: Element> Clone for AlignedBuffer<T> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(buffer) => buffer,
            Err(_) => std::alloc::handle_alloc_error(self.layout),
        }
    }
}
