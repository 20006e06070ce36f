//! King-profile spline basis.
//!
//! A table of `2 * pic_size` candidate rows is filled from the King falloff
//! `(1 + ((col + 1) / r)²)^(-3b)` mirrored around the centre column, for `h²`
//! pairs `(b, r)` with `h = ⌊√(2 * pic_size)⌋`, `b` spaced linearly over
//! `[1/6, 10]` and `r` over `[1, pic_size / 2]`. Each row is shifted to a zero
//! minimum and normalized to sum to one, then `pic_size` rows are picked by
//! nearest index to form the operator.

use crate::error::{ModelError, Result};
use crate::matmult::MatMult;
use crate::operator::LinearOperator;
use log::{debug, warn};
use sky_array::{ArrayView, NumericArray, Parallelism};

const B_RANGE: (f64, f64) = (1.0 / 6.0, 10.0);
const R_MIN: f64 = 1.0;

/// `count` values spaced linearly over `[start, end]`. A single sample takes
/// `start`.
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![start; count];
    }
    let step = (end - start) / (count as f64 - 1.0);
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Fill `row` with the mirrored King profile for `(b, r)`, shift it to a zero
/// minimum and normalize it. Returns false when the row sums to zero.
fn king_row(row: &mut [f64], b: f64, r: f64) -> bool {
    let pic_size = row.len();
    let half = pic_size / 2;
    for col in 0..half {
        let value = (1.0 + ((col as f64 + 1.0) / r).powi(2)).powf(-3.0 * b);
        row[half + col] = value;
        row[half - col - 1] = value;
    }

    let min = row.iter().copied().fold(f64::INFINITY, f64::min);
    row.iter_mut().for_each(|value| *value -= min);

    let sum: f64 = row.iter().sum();
    if sum > 0.0 {
        row.iter_mut().for_each(|value| *value /= sum);
        true
    } else {
        false
    }
}

/// Generate the `pic_size` x `pic_size` spline coefficient matrix.
pub fn generate_basis(pic_size: usize) -> Result<NumericArray<f64>> {
    if pic_size < 2 {
        return Err(ModelError::InvalidArgument(format!(
            "spline basis needs a picture size of at least 2, got {pic_size}"
        )));
    }

    let table_height = 2 * pic_size;
    let samples = (table_height as f64).sqrt().floor() as usize;
    let b_values = linspace(B_RANGE.0, B_RANGE.1, samples);
    let r_values = linspace(R_MIN, pic_size as f64 / 2.0, samples);

    let mut table = vec![0.0; table_height * pic_size];
    let mut degenerate = 0;
    for (i, &b) in b_values.iter().enumerate() {
        for (j, &r) in r_values.iter().enumerate() {
            let row = i * samples + j;
            if !king_row(&mut table[row * pic_size..(row + 1) * pic_size], b, r) {
                degenerate += 1;
            }
        }
    }
    if degenerate > 0 {
        warn!("{degenerate} spline rows sum to zero and were left empty");
    }

    let last_row = (samples * samples - 1) as f64;
    let mut basis = NumericArray::new(pic_size, pic_size)?;
    for (i, out) in basis.as_mut_slice().chunks_mut(pic_size).enumerate() {
        let index = (i as f64 * last_row / (pic_size as f64 - 1.0)).floor() as usize;
        out.copy_from_slice(&table[index * pic_size..(index + 1) * pic_size]);
    }

    debug!("generated {pic_size}x{pic_size} spline basis from {samples}x{samples} profiles");
    Ok(basis)
}

/// Spline operator: `pic_size` coefficients to a radial profile of length
/// `pic_size`.
#[derive(Debug, Clone)]
pub struct Spline {
    matrix: MatMult<f64>,
}

impl Spline {
    pub fn new(pic_size: usize) -> Result<Self> {
        Ok(Self {
            matrix: MatMult::new("spline", generate_basis(pic_size)?)?,
        })
    }

    /// Wrap a precomputed square coefficient matrix.
    pub fn from_matrix(coefficients: NumericArray<f64>) -> Result<Self> {
        if !coefficients.is_square() {
            return Err(ModelError::InvalidArgument(format!(
                "spline matrix must be square, got {:?}",
                coefficients.shape()
            )));
        }
        Ok(Self {
            matrix: MatMult::new("spline", coefficients)?,
        })
    }

    pub fn coefficients(&self) -> &NumericArray<f64> {
        self.matrix.coefficients()
    }
}

impl LinearOperator<f64> for Spline {
    fn name(&self) -> &'static str {
        "spline"
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
