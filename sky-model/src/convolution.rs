//! Same-size 2D correlation with an odd kernel and zero padding.
//!
//! The operator acts on vectors that are row-major `rows` x `cols` grids:
//!
//! `y[i, j] = Σ K[ki, kj] · x[i + ki - cr, j + kj - cc]`
//!
//! where `(cr, cc)` is the kernel centre and samples outside the grid are
//! zero. The adjoint of zero-padded correlation is correlation with the
//! kernel rotated by 180°, which is what [`LinearOperator::transpose`] does.

use crate::error::{ModelError, Result};
use crate::operator::LinearOperator;
use ndarray::{s, Array2, ArrayView2};
use sky_array::{ArrayView, Element, NumericArray, Parallelism};

#[derive(Debug, Clone)]
pub struct Convolution<T: Element> {
    kernel: Array2<T>,
    rows: usize,
    cols: usize,
    transposed: bool,
    parallelism: Parallelism,
}

impl<T: Element> Convolution<T> {
    /// Convolution of `rows` x `cols` grids with `kernel`.
    ///
    /// Both kernel dimensions must be odd and the grid non-empty.
    pub fn new(kernel: Array2<T>, rows: usize, cols: usize) -> Result<Self> {
        let (kernel_rows, kernel_cols) = kernel.dim();
        if kernel_rows % 2 == 0 || kernel_cols % 2 == 0 {
            return Err(ModelError::InvalidArgument(format!(
                "convolution kernel must have odd dimensions, got {kernel_rows}x{kernel_cols}"
            )));
        }
        if rows == 0 || cols == 0 {
            return Err(ModelError::InvalidArgument(
                "convolution grid must be non-empty".to_string(),
            ));
        }

        Ok(Self {
            kernel,
            rows,
            cols,
            transposed: false,
            parallelism: Parallelism::default(),
        })
    }

    /// Kernel in the current orientation.
    pub fn kernel(&self) -> ArrayView2<'_, T> {
        self.kernel.view()
    }

    /// Grid shape `(rows, cols)`.
    pub fn grid(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

/// Correlation of `grid` with `kernel` at output cell `(i, j)`.
#[inline]
fn correlate_at<T: Element>(grid: &ArrayView2<'_, T>, kernel: &Array2<T>, i: usize, j: usize) -> T {
    let (rows, cols) = grid.dim();
    let (kernel_rows, kernel_cols) = kernel.dim();
    let centre_row = (kernel_rows / 2) as isize;
    let centre_col = (kernel_cols / 2) as isize;

    let mut sum = T::zero();
    for ki in 0..kernel_rows {
        let row = i as isize + ki as isize - centre_row;
        if row < 0 || row >= rows as isize {
            continue;
        }
        for kj in 0..kernel_cols {
            let col = j as isize + kj as isize - centre_col;
            if col < 0 || col >= cols as isize {
                continue;
            }
            sum += kernel[[ki, kj]] * grid[[row as usize, col as usize]];
        }
    }
    sum
}

impl<T: Element> LinearOperator<T> for Convolution<T> {
    fn name(&self) -> &'static str {
        "convolution"
    }

    fn height(&self) -> usize {
        self.rows * self.cols
    }

    fn width(&self) -> usize {
        self.rows * self.cols
    }

    fn is_transposed(&self) -> bool {
        self.transposed
    }

    fn validate(&self) -> Result<()> {
        if self.kernel.is_empty() || self.rows == 0 || self.cols == 0 {
            return Err(ModelError::InvalidState(
                "convolution has an empty kernel or grid".to_string(),
            ));
        }
        Ok(())
    }

    fn apply(&self, x: ArrayView<'_, T>) -> Result<NumericArray<T>> {
        self.check_input(&x)?;

        let grid = ArrayView2::from_shape((self.rows, self.cols), x.as_slice())
            .map_err(|e| ModelError::InvalidState(format!("input does not fit grid: {e}")))?;

        let mut out = NumericArray::new(self.rows, self.cols)?.with_parallelism(self.parallelism);
        self.parallelism
            .for_each_row_mut(out.as_mut_slice(), self.cols, |i, values| {
                for (j, value) in values.iter_mut().enumerate() {
                    *value = correlate_at(&grid, &self.kernel, i, j);
                }
            });

        Ok(out)
    }

    fn transpose(&mut self) -> Result<()> {
        self.kernel = self.kernel.slice(s![..;-1, ..;-1]).to_owned();
        self.transposed = !self.transposed;
        Ok(())
    }

    fn set_parallelism(&mut self, parallelism: Parallelism) {
        self.parallelism = parallelism;
    }
}
