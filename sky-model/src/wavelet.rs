//! Orthonormal periodized wavelet basis.
//!
//! The operator maps wavelet coefficients to a signal of length `pic_size`
//! (a power of two). Coefficients are laid out as
//! `[coarse | details at the coarsest level | ... | details at the finest level]`,
//! the coarse block holding `2^coarsest_level` entries. The synthesis matrix is
//! orthonormal, so its transpose is the analysis transform.

use crate::error::{ModelError, Result};
use crate::matmult::MatMult;
use crate::operator::LinearOperator;
use log::debug;
use serde::{Deserialize, Serialize};
use sky_array::{ArrayView, NumericArray, Parallelism};

/// Quadrature mirror filter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveletFamily {
    Haar,
    Daubechies4,
    Daubechies6,
    Daubechies8,
}

impl WaveletFamily {
    /// Low-pass filter taps, normalized to unit energy.
    pub fn low_pass(&self) -> Vec<f64> {
        match self {
            WaveletFamily::Haar => vec![std::f64::consts::FRAC_1_SQRT_2; 2],
            WaveletFamily::Daubechies4 => {
                let s3 = 3f64.sqrt();
                let norm = 4.0 * std::f64::consts::SQRT_2;
                vec![
                    (1.0 + s3) / norm,
                    (3.0 + s3) / norm,
                    (3.0 - s3) / norm,
                    (1.0 - s3) / norm,
                ]
            }
            WaveletFamily::Daubechies6 => vec![
                0.332_670_552_950_082_6,
                0.806_891_509_311_092_5,
                0.459_877_502_118_491_5,
                -0.135_011_020_010_254_6,
                -0.085_441_273_882_026_7,
                0.035_226_291_885_709_5,
            ],
            WaveletFamily::Daubechies8 => vec![
                0.230_377_813_308_896_4,
                0.714_846_570_552_915_4,
                0.630_880_767_929_858_7,
                -0.027_983_769_416_859_9,
                -0.187_034_811_719_093_1,
                0.030_841_381_835_560_8,
                0.032_883_011_666_885_2,
                -0.010_597_401_785_069_0,
            ],
        }
    }

    /// High-pass mirror filter `g[k] = (-1)^k h[L - 1 - k]`.
    pub fn high_pass(&self) -> Vec<f64> {
        let low = self.low_pass();
        let len = low.len();
        (0..len)
            .map(|k| {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                sign * low[len - 1 - k]
            })
            .collect()
    }
}

/// One analysis level on the first `len` entries of `signal`.
fn analysis_step(signal: &mut [f64], len: usize, low: &[f64], high: &[f64]) {
    let half = len / 2;
    let mut out = vec![0.0; len];
    for i in 0..half {
        let (mut coarse, mut detail) = (0.0, 0.0);
        for (k, (&h, &g)) in low.iter().zip(high).enumerate() {
            let sample = signal[(2 * i + k) % len];
            coarse += h * sample;
            detail += g * sample;
        }
        out[i] = coarse;
        out[half + i] = detail;
    }
    signal[..len].copy_from_slice(&out);
}

/// Inverse of [`analysis_step`].
fn synthesis_step(coefficients: &mut [f64], len: usize, low: &[f64], high: &[f64]) {
    let half = len / 2;
    let mut out = vec![0.0; len];
    for i in 0..half {
        let coarse = coefficients[i];
        let detail = coefficients[half + i];
        for (k, (&h, &g)) in low.iter().zip(high).enumerate() {
            out[(2 * i + k) % len] += h * coarse + g * detail;
        }
    }
    coefficients[..len].copy_from_slice(&out);
}

/// Forward discrete wavelet transform down to `2^coarsest_level` coarse
/// coefficients.
pub fn forward_dwt(signal: &[f64], family: WaveletFamily, coarsest_level: usize) -> Vec<f64> {
    let (low, high) = (family.low_pass(), family.high_pass());
    let mut coefficients = signal.to_vec();
    let coarse_len = 1usize << coarsest_level;

    let mut len = signal.len();
    while len > coarse_len {
        analysis_step(&mut coefficients, len, &low, &high);
        len /= 2;
    }
    coefficients
}

/// Inverse of [`forward_dwt`].
pub fn inverse_dwt(coefficients: &[f64], family: WaveletFamily, coarsest_level: usize) -> Vec<f64> {
    let (low, high) = (family.low_pass(), family.high_pass());
    let mut signal = coefficients.to_vec();

    let mut len = 2usize << coarsest_level;
    while len <= signal.len() {
        synthesis_step(&mut signal, len, &low, &high);
        len *= 2;
    }
    signal
}

/// Wavelet synthesis operator for signals of length `pic_size`.
#[derive(Debug, Clone)]
pub struct Wavelet {
    family: WaveletFamily,
    coarsest_level: usize,
    matrix: MatMult<f64>,
}

impl Wavelet {
    /// Build the `pic_size` x `pic_size` synthesis matrix.
    ///
    /// `pic_size` must be a power of two and `coarsest_level` below its
    /// base-2 logarithm.
    pub fn new(pic_size: usize, family: WaveletFamily, coarsest_level: usize) -> Result<Self> {
        if !pic_size.is_power_of_two() {
            return Err(ModelError::InvalidArgument(format!(
                "wavelet size must be a power of two, got {pic_size}"
            )));
        }
        let levels = pic_size.trailing_zeros() as usize;
        if coarsest_level >= levels {
            return Err(ModelError::InvalidArgument(format!(
                "coarsest level {coarsest_level} must be below {levels} for size {pic_size}"
            )));
        }

        let mut coefficients = NumericArray::<f64>::new(pic_size, pic_size)?;
        let mut unit = vec![0.0; pic_size];
        for column in 0..pic_size {
            unit[column] = 1.0;
            let basis = inverse_dwt(&unit, family, coarsest_level);
            unit[column] = 0.0;
            for (row, value) in basis.into_iter().enumerate() {
                coefficients[(row, column)] = value;
            }
        }

        debug!(
            "generated {pic_size}x{pic_size} {family:?} wavelet basis, coarsest level {coarsest_level}"
        );
        Ok(Self {
            family,
            coarsest_level,
            matrix: MatMult::new("wavelet", coefficients)?,
        })
    }

    pub fn family(&self) -> WaveletFamily {
        self.family
    }

    pub fn coarsest_level(&self) -> usize {
        self.coarsest_level
    }

    pub fn coefficients(&self) -> &NumericArray<f64> {
        self.matrix.coefficients()
    }
}

impl LinearOperator<f64> for Wavelet {
    fn name(&self) -> &'static str {
        "wavelet"
    }

    fn height(&self) -> usize {
        self.matrix.height()
    }

    fn width(&self) -> usize {
        self.matrix.width()
    }

    fn is_transposed(&self) -> bool {
        self.matrix.is_transposed()
    }

    fn validate(&self) -> Result<()> {
        self.matrix.validate()
    }

    fn apply(&self, x: ArrayView<'_, f64>) -> Result<NumericArray<f64>> {
        self.matrix.apply(x)
    }

    fn transpose(&mut self) -> Result<()> {
        self.matrix.transpose()
    }

    fn set_parallelism(&mut self, parallelism: Parallelism) {
        self.matrix.set_parallelism(parallelism);
    }
}
