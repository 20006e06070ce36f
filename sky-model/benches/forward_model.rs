use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use sky_array::{NumericArray, Parallelism};
use sky_model::{
    AbelTransform, Convolution, ForwardModel, ForwardModelConfig, LinearOperator, ModelModes,
};

fn make_model(pic_size: usize, workers: usize) -> ForwardModel {
    let config = ForwardModelConfig {
        pic_size,
        workers,
        ..ForwardModelConfig::default()
    };
    ForwardModel::from_config(&config).expect("bench config is valid")
}

fn make_source(len: usize) -> NumericArray<f64> {
    let values: Vec<f64> = (0..len).map(|i| ((i * 37) % 101) as f64 * 0.01).collect();
    NumericArray::column(&values).expect("non-empty source")
}

fn bench_forward_model(c: &mut Criterion) {
    let sequential = make_model(64, 1);
    let parallel = make_model(64, 4);
    let source = make_source(sequential.source_len());
    let image = make_source(sequential.image_len());
    let modes = ModelModes::default();

    let mut group = c.benchmark_group("forward_model");
    group.bench_function("forward_64_sequential", |b| {
        b.iter(|| sequential.forward(black_box(source.view()), modes))
    });
    group.bench_function("forward_64_4_workers", |b| {
        b.iter(|| parallel.forward(black_box(source.view()), modes))
    });
    group.bench_function("adjoint_64_sequential", |b| {
        b.iter(|| sequential.adjoint(black_box(image.view()), modes))
    });
    group.bench_function("adjoint_64_4_workers", |b| {
        b.iter(|| parallel.adjoint(black_box(image.view()), modes))
    });
    group.finish();
}

fn bench_convolution(c: &mut Criterion) {
    let kernel = Array2::from_shape_fn((9, 9), |(r, c)| 1.0 / (1.0 + (r * c) as f64));
    let sequential = Convolution::new(kernel, 256, 256).expect("odd kernel");
    let mut parallel = sequential.clone();
    parallel.set_parallelism(Parallelism::new(4));
    let image = make_source(256 * 256);

    let mut group = c.benchmark_group("convolution");
    group.bench_function("9x9_256x256_sequential", |b| {
        b.iter(|| sequential.apply(black_box(image.view())))
    });
    group.bench_function("9x9_256x256_4_workers", |b| {
        b.iter(|| parallel.apply(black_box(image.view())))
    });
    group.finish();
}

fn bench_abel_generation(c: &mut Criterion) {
    c.bench_function("abel_generate_64", |b| {
        b.iter(|| AbelTransform::generate(black_box(64)))
    });
}

criterion_group!(
    benches,
    bench_forward_model,
    bench_convolution,
    bench_abel_generation,
);
criterion_main!(benches);
