//! Data-parallel kernel configuration and chunked execution helpers.
//!
//! Kernels split an index range into at most `workers` disjoint chunks and
//! process them with rayon. Reductions compute one partial per chunk and then
//! combine the partials sequentially in chunk order, so results depend only
//! on the degree of parallelism and never on thread scheduling.

use rayon::prelude::*;
use std::num::NonZeroUsize;

/// Minimum number of elements handed to a single worker.
const MIN_CHUNK_LEN: usize = 1024;

/// Explicit degree of parallelism threaded through the numeric kernels.
///
/// The default is sequential execution; callers opt in to parallel kernels
/// with [`Parallelism::new`] or [`Parallelism::available`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parallelism {
    workers: NonZeroUsize,
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::sequential()
    }
}

impl Parallelism {
    /// Single-threaded execution.
    pub const fn sequential() -> Self {
        Self {
            workers: NonZeroUsize::MIN,
        }
    }

    /// Use up to `workers` parallel chunks. Zero is treated as one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: NonZeroUsize::new(workers).unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Query the machine's available parallelism.
    pub fn available() -> Self {
        let workers = std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        Self { workers }
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// True when kernels run on the calling thread only.
    pub fn is_sequential(&self) -> bool {
        self.workers.get() == 1
    }

    /// Chunk length used to split `len` elements across the workers.
    pub fn chunk_len(&self, len: usize) -> usize {
        len.div_ceil(self.workers()).max(MIN_CHUNK_LEN).max(1)
    }

    /// Whether `len` elements are worth splitting.
    fn splits(&self, len: usize) -> bool {
        !self.is_sequential() && len > MIN_CHUNK_LEN
    }

    /// Run `kernel` over disjoint mutable chunks of `data`.
    ///
    /// The closure receives the offset of the chunk within `data`.
    pub fn for_each_chunk_mut<T, F>(&self, data: &mut [T], kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        if !self.splits(data.len()) {
            kernel(0, data);
            return;
        }

        let chunk_len = self.chunk_len(data.len());
        data.par_chunks_mut(chunk_len)
            .enumerate()
            .for_each(|(chunk_idx, chunk)| kernel(chunk_idx * chunk_len, chunk));
    }

    /// Run `kernel` over disjoint mutable chunks of `data` alongside the
    /// matching read-only chunks of `other`.
    ///
    /// Both slices must have the same length.
    pub fn zip_chunks_mut<T, U, F>(&self, data: &mut [T], other: &[U], kernel: F)
    where
        T: Send,
        U: Sync,
        F: Fn(&mut [T], &[U]) + Send + Sync,
    {
        debug_assert_eq!(data.len(), other.len());

        if !self.splits(data.len()) {
            kernel(data, other);
            return;
        }

        let chunk_len = self.chunk_len(data.len());
        data.par_chunks_mut(chunk_len)
            .zip(other.par_chunks(chunk_len))
            .for_each(|(chunk, other_chunk)| kernel(chunk, other_chunk));
    }

    /// Partition `data`, compute one partial per chunk, then fold the
    /// partials sequentially in chunk order.
    pub fn reduce<T, A, M, C>(&self, data: &[T], identity: A, map: M, combine: C) -> A
    where
        T: Sync,
        A: Send,
        M: Fn(&[T]) -> A + Send + Sync,
        C: Fn(A, A) -> A,
    {
        if !self.splits(data.len()) {
            return combine(identity, map(data));
        }

        let chunk_len = self.chunk_len(data.len());
        let partials: Vec<A> = data.par_chunks(chunk_len).map(&map).collect();

        partials.into_iter().fold(identity, combine)
    }

    /// Like [`Parallelism::reduce`] over two equal-length slices partitioned
    /// at the same boundaries.
    pub fn zip_reduce<T, U, A, M, C>(
        &self,
        data: &[T],
        other: &[U],
        identity: A,
        map: M,
        combine: C,
    ) -> A
    where
        T: Sync,
        U: Sync,
        A: Send,
        M: Fn(&[T], &[U]) -> A + Send + Sync,
        C: Fn(A, A) -> A,
    {
        debug_assert_eq!(data.len(), other.len());

        if !self.splits(data.len()) {
            return combine(identity, map(data, other));
        }

        let chunk_len = self.chunk_len(data.len());
        let partials: Vec<A> = data
            .par_chunks(chunk_len)
            .zip(other.par_chunks(chunk_len))
            .map(|(chunk, other_chunk)| map(chunk, other_chunk))
            .collect();

        partials.into_iter().fold(identity, combine)
    }

    /// Fill every row of a row-major buffer with `width` columns in parallel.
    ///
    /// The closure receives the row index and the row slice.
    pub fn for_each_row_mut<T, F>(&self, data: &mut [T], width: usize, kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        if width == 0 {
            return;
        }

        if !self.splits(data.len()) {
            data.chunks_mut(width)
                .enumerate()
                .for_each(|(row, values)| kernel(row, values));
            return;
        }

        let rows_per_chunk = (self.chunk_len(data.len()) / width).max(1);
        data.par_chunks_mut(width)
            .with_min_len(rows_per_chunk)
            .enumerate()
            .for_each(|(row, values)| kernel(row, values));
    }
}
