//! Abel projection of a symmetric radial profile onto the image plane.
//!
//! The profile has `pic_size` entries. Entry `k` sits at signed radius
//! `u = k - c` with `c = (pic_size - 1) / 2` and stands for the spherical shell
//! `[max(|u| - ½, 0), |u| + ½]`. A pixel whose centre lies at projected
//! distance `d` from the image centre collects the length of the line of sight
//! through every shell:
//!
//! `2 (√(outer² - d²) - √(max(inner², d²) - d²))`
//!
//! Entries `k` and `pic_size - 1 - k` describe the same shell, so each gets
//! half of the chord.

use crate::error::{ModelError, Result};
use crate::matmult::MatMult;
use crate::operator::LinearOperator;
use log::debug;
use sky_array::{ArrayView, NumericArray, Parallelism};

/// Chord length through the shell `[inner, outer]` at impact parameter `d`.
#[inline]
pub fn shell_chord(inner: f64, outer: f64, d: f64) -> f64 {
    if d >= outer {
        return 0.0;
    }
    let d2 = d * d;
    let outer_part = (outer * outer - d2).sqrt();
    let inner_part = (inner * inner).max(d2) - d2;
    2.0 * (outer_part - inner_part.sqrt())
}

/// Projection from a radial profile of length `pic_size` to a
/// `pic_size` x `pic_size` image (flattened row-major).
#[derive(Debug, Clone)]
pub struct AbelTransform {
    pic_size: usize,
    matrix: MatMult<f64>,
}

impl AbelTransform {
    /// Build the `pic_size²` x `pic_size` projection matrix.
    pub fn generate(pic_size: usize) -> Result<Self> {
        Self::generate_with(pic_size, Parallelism::default())
    }

    /// [`AbelTransform::generate`] with the rows filled in parallel.
    pub fn generate_with(pic_size: usize, parallelism: Parallelism) -> Result<Self> {
        if pic_size == 0 {
            return Err(ModelError::InvalidArgument(
                "abel transform needs a positive picture size".to_string(),
            ));
        }

        let centre = (pic_size as f64 - 1.0) / 2.0;
        let shells: Vec<(f64, f64, f64)> = (0..pic_size)
            .map(|k| {
                let radius = (k as f64 - centre).abs();
                let weight = if k == pic_size - 1 - k { 1.0 } else { 0.5 };
                ((radius - 0.5).max(0.0), radius + 0.5, weight)
            })
            .collect();

        let mut coefficients =
            NumericArray::<f64>::new(pic_size * pic_size, pic_size)?.with_parallelism(parallelism);
        parallelism.for_each_row_mut(coefficients.as_mut_slice(), pic_size, |pixel, row| {
            let dy = (pixel / pic_size) as f64 - centre;
            let dx = (pixel % pic_size) as f64 - centre;
            let d = dx.hypot(dy);
            for (value, &(inner, outer, weight)) in row.iter_mut().zip(&shells) {
                *value = weight * shell_chord(inner, outer, d);
            }
        });

        debug!("generated {pic_size}x{pic_size} abel projection");
        Ok(Self {
            pic_size,
            matrix: MatMult::new("abel", coefficients)?,
        })
    }

    /// Wrap a precomputed `pic_size²` x `pic_size` matrix.
    pub fn from_matrix(pic_size: usize, coefficients: NumericArray<f64>) -> Result<Self> {
        if coefficients.shape() != (pic_size * pic_size, pic_size) {
            return Err(ModelError::InvalidArgument(format!(
                "abel matrix must be {}x{pic_size}, got {:?}",
                pic_size * pic_size,
                coefficients.shape()
            )));
        }
        Ok(Self {
            pic_size,
            matrix: MatMult::new("abel", coefficients)?,
        })
    }

    pub fn pic_size(&self) -> usize {
        self.pic_size
    }

    pub fn coefficients(&self) -> &NumericArray<f64> {
        self.matrix.coefficients()
    }
}

impl LinearOperator<f64> for AbelTransform {
    fn name(&self) -> &'static str {
        "abel"
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_chord_through_solid_sphere() {
        // Full sphere of radius 1 at impact parameter 0 is a diameter.
        assert_relative_eq!(shell_chord(0.0, 1.0, 0.0), 2.0);
        assert_relative_eq!(shell_chord(0.0, 1.0, 0.6), 1.6);
        assert_eq!(shell_chord(0.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_chord_through_hollow_shell() {
        let chord = shell_chord(1.0, 2.0, 0.0);
        assert_relative_eq!(chord, 2.0);
        assert_relative_eq!(shell_chord(1.0, 2.0, 1.5), 2.0 * (4.0f64 - 2.25).sqrt());
    }

    #[test]
    fn test_matrix_shape_and_sign() {
        let abel = AbelTransform::generate(8).unwrap();
        assert_eq!((abel.height(), abel.width()), (64, 8));
        assert!(!abel.coefficients().contains_negative());
    }

    #[test]
    fn test_image_is_symmetric() {
        let n = 7;
        let abel = AbelTransform::generate(n).unwrap();
        let profile = NumericArray::column(&[1.0; 7]).unwrap();
        let image = abel.apply(profile.view()).unwrap();

        for r in 0..n {
            for c in 0..n {
                let value = image[r * n + c];
                assert_relative_eq!(value, image[c * n + r], epsilon = 1e-12);
                assert_relative_eq!(value, image[(n - 1 - r) * n + c], epsilon = 1e-12);
            }
        }
        // The centre pixel sees the full diameter of the outer shell.
        assert_relative_eq!(image[3 * n + 3], 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_generation_matches() {
        let sequential = AbelTransform::generate(12).unwrap();
        let parallel = AbelTransform::generate_with(12, Parallelism::new(4)).unwrap();
        assert_eq!(sequential.coefficients(), parallel.coefficients());
    }

    #[test]
    fn test_from_matrix_checks_shape() {
        let wrong = NumericArray::<f64>::new(4, 4).unwrap();
        assert!(AbelTransform::from_matrix(4, wrong).is_err());
    }
}
