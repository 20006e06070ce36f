//! Composite forward model from a source vector to an observed image.
//!
//! The source vector of length `2 * pic_size + pic_size²` holds, in order,
//! wavelet coefficients, spline coefficients and a point-source image. The
//! forward direction computes
//!
//! `y = S ⊙ Blur(Abel(W x_w + Sp x_s) + x_ps)`
//!
//! with `x = source ⊘ standardization`, and the adjoint is its exact
//! transpose. Sub-operators are kept in their forward orientation; the
//! adjoint multiplies row vectors into the same coefficient matrices and uses
//! a flipped copy of the blur.

use crate::abel::AbelTransform;
use crate::blur::Blur;
use crate::config::{ForwardModelConfig, ModelModes};
use crate::error::{ModelError, Result};
use crate::operator::LinearOperator;
use crate::spline::Spline;
use crate::wavelet::Wavelet;
use log::{debug, info};
use sky_array::{is_zero, ArrayView, BinaryOp, NumericArray, Parallelism};

#[derive(Debug, Clone)]
pub struct ForwardModel {
    pic_size: usize,
    wavelet: Wavelet,
    spline: Spline,
    abel: AbelTransform,
    blur: Blur,
    blur_adjoint: Blur,
    sensitivity: NumericArray<f64>,
    standardization: NumericArray<f64>,
    modes: ModelModes,
    transposed: bool,
    parallelism: Parallelism,
}

/// `Mᵀ v` computed as the row product `vᵀ M`, returned as a column.
fn adjoint_product(
    coefficients: &NumericArray<f64>,
    v: ArrayView<'_, f64>,
) -> Result<NumericArray<f64>> {
    let row = v.reshaped(1, v.len())?;
    let product = NumericArray::product(row, coefficients.view())?;
    let len = product.len();
    Ok(product.into_reshaped(len, 1)?)
}

fn check_square(name: &str, shape: (usize, usize), pic_size: usize) -> Result<()> {
    if shape != (pic_size, pic_size) {
        return Err(ModelError::InvalidArgument(format!(
            "{name} must be {pic_size}x{pic_size}, got {shape:?}"
        )));
    }
    Ok(())
}

fn into_column(array: NumericArray<f64>, len: usize, name: &str) -> Result<NumericArray<f64>> {
    if array.len() != len {
        return Err(ModelError::InvalidArgument(format!(
            "{name} must hold {len} values, got {}",
            array.len()
        )));
    }
    Ok(array.into_reshaped(len, 1)?)
}

impl ForwardModel {
    /// Assemble a model from its sub-operators and correction arrays.
    ///
    /// Every operator must be in its forward orientation and sized for the
    /// Abel transform's picture size. `sensitivity` holds `pic_size²` values
    /// and `standardization` `2 * pic_size + pic_size²` nonzero values.
    pub fn new(
        wavelet: Wavelet,
        spline: Spline,
        abel: AbelTransform,
        blur: Blur,
        sensitivity: NumericArray<f64>,
        standardization: NumericArray<f64>,
    ) -> Result<Self> {
        let pic_size = abel.pic_size();
        check_square("wavelet", (wavelet.height(), wavelet.width()), pic_size)?;
        check_square("spline", (spline.height(), spline.width()), pic_size)?;
        if blur.pic_size() != pic_size {
            return Err(ModelError::InvalidArgument(format!(
                "blur is sized for {}, model for {pic_size}",
                blur.pic_size()
            )));
        }
        if wavelet.is_transposed()
            || spline.is_transposed()
            || abel.is_transposed()
            || blur.is_transposed()
        {
            return Err(ModelError::InvalidArgument(
                "forward model operators must not be transposed".to_string(),
            ));
        }

        let image_len = pic_size * pic_size;
        let sensitivity = into_column(sensitivity, image_len, "sensitivity")?;
        let standardization =
            into_column(standardization, 2 * pic_size + image_len, "standardization")?;
        if standardization.as_slice().iter().any(|&v| is_zero(v)) {
            return Err(ModelError::InvalidArgument(
                "standardization contains zero entries".to_string(),
            ));
        }

        let blur_adjoint = blur.clone().transposed()?;
        debug!("assembled forward model for {pic_size}x{pic_size} images");
        Ok(Self {
            pic_size,
            wavelet,
            spline,
            abel,
            blur,
            blur_adjoint,
            sensitivity,
            standardization,
            modes: ModelModes::default(),
            transposed: false,
            parallelism: Parallelism::default(),
        })
    }

    /// Build every sub-operator described by `config`.
    pub fn from_config(config: &ForwardModelConfig) -> Result<Self> {
        config.validate()?;
        let pic_size = config.pic_size;
        let parallelism = Parallelism::new(config.workers);

        let wavelet = Wavelet::new(pic_size, config.wavelet.family, config.wavelet.coarsest_level)?;
        let spline = Spline::new(pic_size)?;
        let abel = AbelTransform::generate_with(pic_size, parallelism)?;
        let blur = Blur::king(
            pic_size,
            config.blur.r0,
            config.blur.alpha,
            config.blur.threshold,
        )?;

        let mut model = Self::new(
            wavelet,
            spline,
            abel,
            blur,
            config.load_sensitivity()?,
            config.load_standardization()?,
        )?;
        model.set_modes(config.modes);
        model.set_parallelism(parallelism);

        info!(
            "built forward model: pic_size={pic_size}, {:?} wavelet, {} workers",
            config.wavelet.family,
            parallelism.workers()
        );
        Ok(model)
    }

    pub fn pic_size(&self) -> usize {
        self.pic_size
    }

    /// Length of the source vector.
    pub fn source_len(&self) -> usize {
        2 * self.pic_size + self.image_len()
    }

    /// Length of the observed image.
    pub fn image_len(&self) -> usize {
        self.pic_size * self.pic_size
    }

    /// Modes used by [`LinearOperator::apply`].
    pub fn modes(&self) -> ModelModes {
        self.modes
    }

    pub fn set_modes(&mut self, modes: ModelModes) {
        self.modes = modes;
    }

    pub fn sensitivity(&self) -> &NumericArray<f64> {
        &self.sensitivity
    }

    pub fn standardization(&self) -> &NumericArray<f64> {
        &self.standardization
    }

    fn check_len(&self, actual: usize, expected: usize) -> Result<()> {
        if actual != expected {
            return Err(ModelError::DimensionMismatch {
                operator: self.name(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Map a source vector to a `pic_size²` x 1 image.
    pub fn forward(&self, x: ArrayView<'_, f64>, modes: ModelModes) -> Result<NumericArray<f64>> {
        self.check_len(x.len(), self.source_len())?;
        let pic = self.pic_size;

        let source = NumericArray::elementwise(
            x.with_parallelism(self.parallelism).into(),
            self.standardization.view().into(),
            BinaryOp::Div,
        )?;
        let wavelet_part = source.segment(0..pic, pic, 1)?;
        let spline_part = source.segment(pic..2 * pic, pic, 1)?;
        let point_source = source.segment(2 * pic..self.source_len(), pic, pic)?;

        let mut profile = NumericArray::new(pic, 1)?.with_parallelism(self.parallelism);
        if modes.apply_wavelet {
            profile.add_in_place(&self.wavelet.apply(wavelet_part)?)?;
        }
        if modes.apply_spline {
            profile.add_in_place(&self.spline.apply(spline_part)?)?;
        }

        let mut image = self.abel.apply(profile.view())?.into_reshaped(pic, pic)?;
        if modes.include_point_source {
            image = NumericArray::elementwise(image.into(), point_source.into(), BinaryOp::Add)?;
        }

        let blurred = self
            .blur
            .apply(image.view())?
            .into_reshaped(self.image_len(), 1)?;
        Ok(blurred.into_hadamard(&self.sensitivity)?)
    }

    /// Map a `pic_size²` image back to source space with the transpose of
    /// [`ForwardModel::forward`]. Disabled components come back as zeros.
    pub fn adjoint(&self, y: ArrayView<'_, f64>, modes: ModelModes) -> Result<NumericArray<f64>> {
        self.check_len(y.len(), self.image_len())?;
        let pic = self.pic_size;

        let weighted = NumericArray::elementwise(
            y.with_parallelism(self.parallelism).into(),
            self.sensitivity.view().into(),
            BinaryOp::Mul,
        )?;
        let image = self.blur_adjoint.apply(weighted.view())?;

        let mut out = NumericArray::new(self.source_len(), 1)?.with_parallelism(self.parallelism);
        if modes.apply_wavelet || modes.apply_spline {
            let profile = adjoint_product(self.abel.coefficients(), image.view())?;
            if modes.apply_wavelet {
                let wavelet_part = adjoint_product(self.wavelet.coefficients(), profile.view())?;
                out.as_mut_slice()[..pic].copy_from_slice(wavelet_part.as_slice());
            }
            if modes.apply_spline {
                let spline_part = adjoint_product(self.spline.coefficients(), profile.view())?;
                out.as_mut_slice()[pic..2 * pic].copy_from_slice(spline_part.as_slice());
            }
        }
        if modes.include_point_source {
            out.as_mut_slice()[2 * pic..].copy_from_slice(image.as_slice());
        }

        Ok(out.into_div(&self.standardization)?)
    }
}

impl LinearOperator<f64> for ForwardModel {
    fn name(&self) -> &'static str {
        "forward_model"
    }

    fn height(&self) -> usize {
        if self.transposed {
            self.source_len()
        } else {
            self.image_len()
        }
    }

    fn width(&self) -> usize {
        if self.transposed {
            self.image_len()
        } else {
            self.source_len()
        }
    }

    fn is_transposed(&self) -> bool {
        self.transposed
    }

    fn validate(&self) -> Result<()> {
        self.wavelet.validate()?;
        self.spline.validate()?;
        self.abel.validate()?;
        self.blur.validate()?;
        if self.sensitivity.is_empty() || self.standardization.is_empty() {
            return Err(ModelError::InvalidState(
                "forward model has no correction arrays".to_string(),
            ));
        }
        Ok(())
    }

    fn apply(&self, x: ArrayView<'_, f64>) -> Result<NumericArray<f64>> {
        self.check_input(&x)?;
        if self.transposed {
            self.adjoint(x, self.modes)
        } else {
            self.forward(x, self.modes)
        }
    }

    fn transpose(&mut self) -> Result<()> {
        self.transposed = !self.transposed;
        Ok(())
    }

    fn set_parallelism(&mut self, parallelism: Parallelism) {
        self.parallelism = parallelism;
        self.wavelet.set_parallelism(parallelism);
        self.spline.set_parallelism(parallelism);
        self.abel.set_parallelism(parallelism);
        self.blur.set_parallelism(parallelism);
        self.blur_adjoint.set_parallelism(parallelism);
        self.sensitivity.set_parallelism(parallelism);
        self.standardization.set_parallelism(parallelism);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelet::WaveletFamily;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::ops::Range;

    const PIC: usize = 8;
    const SOURCE_LEN: usize = 2 * PIC + PIC * PIC;

    fn random_column(len: usize, range: Range<f64>, rng: &mut StdRng) -> NumericArray<f64> {
        let values: Vec<f64> = (0..len).map(|_| rng.gen_range(range.clone())).collect();
        NumericArray::column(&values).unwrap()
    }

    fn model_with(blur: Blur, rng: &mut StdRng) -> ForwardModel {
        ForwardModel::new(
            Wavelet::new(PIC, WaveletFamily::Haar, 0).unwrap(),
            Spline::new(PIC).unwrap(),
            AbelTransform::generate(PIC).unwrap(),
            blur,
            random_column(PIC * PIC, 0.5..1.5, rng),
            random_column(SOURCE_LEN, 0.5..2.0, rng),
        )
        .unwrap()
    }

    fn unit_model() -> ForwardModel {
        ForwardModel::new(
            Wavelet::new(PIC, WaveletFamily::Haar, 0).unwrap(),
            Spline::new(PIC).unwrap(),
            AbelTransform::generate(PIC).unwrap(),
            Blur::from_kernel(array![[1.0]], PIC).unwrap(),
            NumericArray::filled(1.0, PIC * PIC, 1).unwrap(),
            NumericArray::filled(1.0, SOURCE_LEN, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_source_gives_zero_image() {
        let mut rng = StdRng::seed_from_u64(71);
        let model = model_with(Blur::king(PIC, 1.0, 1.5, 0.05).unwrap(), &mut rng);
        let x = NumericArray::<f64>::new(SOURCE_LEN, 1).unwrap();

        let y = model.forward(x.view(), ModelModes::default()).unwrap();
        assert_eq!(y.shape(), (PIC * PIC, 1));
        assert!(y.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_point_source_passes_through_identity_blur() {
        let model = unit_model();
        let mut values = vec![0.0; SOURCE_LEN];
        values[2 * PIC + 3 * PIC + 5] = 4.0;
        let x = NumericArray::column(&values).unwrap();

        let modes = ModelModes {
            apply_wavelet: false,
            apply_spline: false,
            include_point_source: true,
        };
        let y = model.forward(x.view(), modes).unwrap();
        assert_eq!(y.as_slice(), &values[2 * PIC..]);
    }

    #[test]
    fn test_disabled_components_are_ignored() {
        let model = unit_model();
        let mut rng = StdRng::seed_from_u64(72);
        let x = random_column(SOURCE_LEN, -1.0..1.0, &mut rng);

        let modes = ModelModes {
            apply_wavelet: false,
            apply_spline: false,
            include_point_source: false,
        };
        let y = model.forward(x.view(), modes).unwrap();
        assert!(y.as_slice().iter().all(|&v| v == 0.0));

        let back = model
            .adjoint(random_column(PIC * PIC, -1.0..1.0, &mut rng).view(), modes)
            .unwrap();
        assert_eq!(back.shape(), (SOURCE_LEN, 1));
        assert!(back.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_adjoint_matches_forward() {
        let mut rng = StdRng::seed_from_u64(73);
        let model = model_with(Blur::king(PIC, 1.2, 1.5, 0.02).unwrap(), &mut rng);
        let x = random_column(SOURCE_LEN, -1.0..1.0, &mut rng);
        let y = random_column(PIC * PIC, -1.0..1.0, &mut rng);

        let lhs = model
            .forward(x.view(), ModelModes::default())
            .unwrap()
            .inner(&y)
            .unwrap();
        let rhs = x
            .inner(&model.adjoint(y.view(), ModelModes::default()).unwrap())
            .unwrap();
        assert_relative_eq!(lhs, rhs, epsilon = 1e-10, max_relative = 1e-10);
    }

    #[test]
    fn test_transpose_switches_direction() {
        let mut model = unit_model();
        assert_eq!((model.height(), model.width()), (PIC * PIC, SOURCE_LEN));

        model.transpose().unwrap();
        assert_eq!((model.height(), model.width()), (SOURCE_LEN, PIC * PIC));
        let y = NumericArray::filled(1.0, PIC * PIC, 1).unwrap();
        assert_eq!(model.apply(y.view()).unwrap().len(), SOURCE_LEN);

        model.transpose().unwrap();
        assert!(!model.is_transposed());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let model = unit_model();
        let x = NumericArray::<f64>::new(SOURCE_LEN - 1, 1).unwrap();
        assert!(matches!(
            model.apply(x.view()),
            Err(ModelError::DimensionMismatch {
                expected: SOURCE_LEN,
                ..
            })
        ));
        assert!(matches!(
            model.adjoint(x.view(), ModelModes::default()),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_standardization_rejected() {
        let mut standardization = NumericArray::filled(1.0, SOURCE_LEN, 1).unwrap();
        standardization[4] = 0.0;
        let result = ForwardModel::new(
            Wavelet::new(PIC, WaveletFamily::Haar, 0).unwrap(),
            Spline::new(PIC).unwrap(),
            AbelTransform::generate(PIC).unwrap(),
            Blur::from_kernel(array![[1.0]], PIC).unwrap(),
            NumericArray::filled(1.0, PIC * PIC, 1).unwrap(),
            standardization,
        );
        assert!(matches!(result, Err(ModelError::InvalidArgument(_))));
    }

    #[test]
    fn test_mismatched_operators_rejected() {
        let result = ForwardModel::new(
            Wavelet::new(16, WaveletFamily::Haar, 0).unwrap(),
            Spline::new(PIC).unwrap(),
            AbelTransform::generate(PIC).unwrap(),
            Blur::from_kernel(array![[1.0]], PIC).unwrap(),
            NumericArray::filled(1.0, PIC * PIC, 1).unwrap(),
            NumericArray::filled(1.0, SOURCE_LEN, 1).unwrap(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_config_builds_every_stage() {
        let config = ForwardModelConfig {
            pic_size: PIC,
            workers: 2,
            ..ForwardModelConfig::default()
        };
        let model = ForwardModel::from_config(&config).unwrap();
        assert_eq!(model.pic_size(), PIC);
        assert_eq!(model.width(), SOURCE_LEN);
        model.validate().unwrap();
    }
}
