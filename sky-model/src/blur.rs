//! Point spread function blur over the `pic_size` x `pic_size` image.

use crate::convolution::Convolution;
use crate::error::{ModelError, Result};
use crate::operator::LinearOperator;
use log::debug;
use ndarray::{Array2, ArrayView2};
use sky_array::{ArrayView, NumericArray, Parallelism};

/// King profile `(1 + r²/r0²)^(-alpha)`, peak 1 at the origin.
#[inline]
pub fn king_profile(r: f64, r0: f64, alpha: f64) -> f64 {
    (1.0 + (r * r) / (r0 * r0)).powf(-alpha)
}

/// Square King PSF kernel for a `pic_size` image.
///
/// The half-width is the largest radius up to `pic_size - 1` where the profile
/// along an axis still reaches `threshold`. Entries below `threshold` are
/// dropped and the kernel is normalized to sum to one.
pub fn king_kernel(pic_size: usize, r0: f64, alpha: f64, threshold: f64) -> Result<Array2<f64>> {
    if pic_size == 0 {
        return Err(ModelError::InvalidArgument(
            "blur needs a positive picture size".to_string(),
        ));
    }
    if !(r0.is_finite() && r0 > 0.0) || !(alpha.is_finite() && alpha > 0.0) {
        return Err(ModelError::InvalidArgument(format!(
            "king profile needs positive r0 and alpha, got r0={r0} alpha={alpha}"
        )));
    }
    if !(0.0..1.0).contains(&threshold) {
        return Err(ModelError::InvalidArgument(format!(
            "blur threshold must lie in [0, 1), got {threshold}"
        )));
    }

    let half_width = (0..pic_size)
        .take_while(|&k| king_profile(k as f64, r0, alpha) >= threshold)
        .last()
        .unwrap_or(0);
    let size = 2 * half_width + 1;

    let mut kernel = Array2::from_shape_fn((size, size), |(i, j)| {
        let dy = i as f64 - half_width as f64;
        let dx = j as f64 - half_width as f64;
        let value = king_profile(dx.hypot(dy), r0, alpha);
        if value >= threshold {
            value
        } else {
            0.0
        }
    });
    let total = kernel.sum();
    kernel /= total;

    debug!("king kernel {size}x{size} (r0={r0}, alpha={alpha}, threshold={threshold})");
    Ok(kernel)
}

/// Blur of a flattened `pic_size` x `pic_size` image.
#[derive(Debug, Clone)]
pub struct Blur {
    pic_size: usize,
    convolution: Convolution<f64>,
}

impl Blur {
    /// King PSF blur, see [`king_kernel`].
    pub fn king(pic_size: usize, r0: f64, alpha: f64, threshold: f64) -> Result<Self> {
        Self::from_kernel(king_kernel(pic_size, r0, alpha, threshold)?, pic_size)
    }

    /// Blur with a caller-supplied odd kernel.
    pub fn from_kernel(kernel: Array2<f64>, pic_size: usize) -> Result<Self> {
        Ok(Self {
            pic_size,
            convolution: Convolution::new(kernel, pic_size, pic_size)?,
        })
    }

    pub fn pic_size(&self) -> usize {
        self.pic_size
    }

    /// Kernel in the current orientation.
    pub fn kernel(&self) -> ArrayView2<'_, f64> {
        self.convolution.kernel()
    }
}

impl LinearOperator<f64> for Blur {
    fn name(&self) -> &'static str {
        "blur"
    }

    fn height(&self) -> usize {
        self.convolution.height()
    }

    fn width(&self) -> usize {
        self.convolution.width()
    }

    fn is_transposed(&self) -> bool {
        self.convolution.is_transposed()
    }

    fn validate(&self) -> Result<()> {
        self.convolution.validate()
    }

    fn apply(&self, x: ArrayView<'_, f64>) -> Result<NumericArray<f64>> {
        self.convolution.apply(x)
    }

    fn transpose(&mut self) -> Result<()> {
        self.convolution.transpose()
    }

    fn set_parallelism(&mut self, parallelism: Parallelism) {
        self.convolution.set_parallelism(parallelism);
    }
}
