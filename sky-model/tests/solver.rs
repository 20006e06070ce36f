//! The forward model driven the way a proximal gradient solver uses it.

use approx::assert_relative_eq;
use sky_array::{Norm, NumericArray};
use sky_model::{
    BlurConfig, ForwardModel, ForwardModelConfig, LinearOperator, ModelModes, WaveletConfig,
    WaveletFamily,
};
use test_helpers::output_path;

const PIC: usize = 16;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> ForwardModelConfig {
    ForwardModelConfig {
        pic_size: PIC,
        wavelet: WaveletConfig {
            family: WaveletFamily::Daubechies4,
            coarsest_level: 1,
        },
        blur: BlurConfig {
            threshold: 0.02,
            r0: 1.2,
            alpha: 1.5,
        },
        ..ForwardModelConfig::default()
    }
}

fn objective(
    model: &ForwardModel,
    x: &NumericArray<f64>,
    b: &NumericArray<f64>,
    lambda: f64,
) -> f64 {
    let residual = model
        .forward(x.view(), ModelModes::default())
        .unwrap()
        .into_sub(b)
        .unwrap();
    0.5 * residual.norm(Norm::TwoSquared).unwrap() + lambda * x.norm(Norm::One).unwrap()
}

/// Largest eigenvalue of `FᵀF` by power iteration.
fn lipschitz(model: &ForwardModel) -> f64 {
    let modes = ModelModes::default();
    let mut v = NumericArray::filled(1.0, model.source_len(), 1).unwrap();
    let mut estimate = 0.0;
    for _ in 0..40 {
        let w = model
            .adjoint(model.forward(v.view(), modes).unwrap().view(), modes)
            .unwrap();
        estimate = w.norm(Norm::Two).unwrap() / v.norm(Norm::Two).unwrap();
        v = w.div_scalar(w.norm(Norm::Two).unwrap()).unwrap();
    }
    estimate
}

#[test]
fn test_soft_thresholding_iterations_decrease_objective() {
    init_logger();
    let model = ForwardModel::from_config(&config()).unwrap();
    let modes = ModelModes::default();

    let mut truth = NumericArray::<f64>::new(model.source_len(), 1).unwrap();
    truth[2 * PIC + 5 * PIC + 6] = 10.0;
    truth[2 * PIC + 11 * PIC + 3] = 4.0;
    let observed = model.forward(truth.view(), modes).unwrap();

    let step = 0.5 / lipschitz(&model);
    let lambda = 0.01;
    let mut x = NumericArray::<f64>::new(model.source_len(), 1).unwrap();
    let initial = objective(&model, &x, &observed, lambda);
    let mut previous = initial;

    for _ in 0..25 {
        let residual = model
            .forward(x.view(), modes)
            .unwrap()
            .into_sub(&observed)
            .unwrap();
        let gradient = model.adjoint(residual.view(), modes).unwrap();
        x = x
            .into_sub(&gradient.mul_scalar(step).unwrap())
            .unwrap()
            .into_shrink(step * lambda)
            .unwrap();

        let current = objective(&model, &x, &observed, lambda);
        assert!(current <= previous + 1e-9, "{current} > {previous}");
        previous = current;
    }
    assert!(previous < initial);
}

#[test]
fn test_apply_and_transpose_alternate() {
    let mut model = ForwardModel::from_config(&config()).unwrap();
    let x = NumericArray::filled(0.1, model.width(), 1).unwrap();

    let image = model.apply(x.view()).unwrap();
    model.transpose().unwrap();
    let back = model.apply(image.view()).unwrap();
    model.transpose().unwrap();

    assert_eq!(back.len(), x.len());
    let again = model.apply(x.view()).unwrap();
    assert_eq!(again, image);
}

#[test]
fn test_correction_arrays_load_from_binary_files() {
    init_logger();
    let sensitivity: Vec<f64> = (0..PIC * PIC).map(|i| 0.5 + (i % 7) as f64 * 0.1).collect();
    let sensitivity = NumericArray::column(&sensitivity).unwrap();
    let path = output_path("solver_sensitivity.bin");
    sensitivity.write_binary(&path).unwrap();

    let config = ForwardModelConfig {
        sensitivity: Some(path),
        ..config()
    };
    let model = ForwardModel::from_config(&config).unwrap();
    assert!(model.sensitivity().compare(&sensitivity).unwrap().is_match());

    // A centred point source keeps its flux once exposure is divided out.
    let mut x = NumericArray::<f64>::new(model.source_len(), 1).unwrap();
    x[2 * PIC + 8 * PIC + 8] = 1.0;
    let only_point = ModelModes {
        apply_wavelet: false,
        apply_spline: false,
        include_point_source: true,
    };
    let image = model.forward(x.view(), only_point).unwrap();
    let flux: f64 = image
        .as_slice()
        .iter()
        .zip(sensitivity.as_slice())
        .map(|(v, s)| v / s)
        .sum();
    assert_relative_eq!(flux, 1.0, epsilon = 1e-12);
}

#[test]
fn test_wrong_sized_correction_file_fails() {
    let short = NumericArray::filled(1.0, 10, 1).unwrap();
    let path = output_path("solver_short_standardization.bin");
    short.write_binary(&path).unwrap();

    let config = ForwardModelConfig {
        standardization: Some(path),
        ..config()
    };
    assert!(ForwardModel::from_config(&config).is_err());
}
