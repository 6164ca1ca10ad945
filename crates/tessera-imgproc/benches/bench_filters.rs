use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tessera_image::{PixelBuffer, Status};
use tessera_imgproc::fft::FftConvolution;
use tessera_imgproc::filter::{
    gaussian_kernel, gaussian_kernel_2d, ConvolutionConfig, SeparableConvolution,
    SeparableMedianFilter,
};
use tessera_imgproc::kernel::StructuringElement;
use tessera_imgproc::morphology::{MorphologicalOperator, MorphologicalTransformation};

fn test_image(width: usize, height: usize) -> PixelBuffer<f32> {
    let data = (0..width * height)
        .map(|i| ((i * 2654435761usize) % 1000) as f32 / 1000.0)
        .collect();
    PixelBuffer::new(width, height, 1, data).unwrap()
}

fn bench_separable(c: &mut Criterion) {
    let mut group = c.benchmark_group("SeparableConvolution");

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        for kernel_size in [3, 7, 15].iter() {
            group.throughput(criterion::Throughput::Elements(
                (*width * *height * *kernel_size) as u64,
            ));

            let parameter_string = format!("{}x{}x{}", width, height, kernel_size);
            let image = test_image(*width, *height);
            let kernel = gaussian_kernel(*kernel_size, *kernel_size as f64 / 4.0).unwrap();

            let serial = SeparableConvolution::with_config(
                kernel.clone(),
                ConvolutionConfig {
                    parallel: false,
                    ..Default::default()
                },
            )
            .unwrap();
            group.bench_with_input(
                BenchmarkId::new("gaussian_serial_f32", &parameter_string),
                &image,
                |b, i| {
                    b.iter(|| {
                        let mut dst = i.clone();
                        black_box(serial.apply(&mut dst, &Status::new()))
                    })
                },
            );

            let banded = SeparableConvolution::new(kernel.clone());
            group.bench_with_input(
                BenchmarkId::new("gaussian_parallel_f32", &parameter_string),
                &image,
                |b, i| {
                    b.iter(|| {
                        let mut dst = i.clone();
                        black_box(banded.apply(&mut dst, &Status::new()))
                    })
                },
            );

            let median = SeparableMedianFilter::new(*kernel_size).unwrap();
            group.bench_with_input(
                BenchmarkId::new("separable_median_f32", &parameter_string),
                &image,
                |b, i| {
                    b.iter(|| {
                        let mut dst = i.clone();
                        black_box(median.apply(&mut dst, &Status::new()))
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_morphology(c: &mut Criterion) {
    let mut group = c.benchmark_group("MorphologicalTransformation");

    for size in [3, 5, 9].iter() {
        let parameter_string = format!("512x448x{}", size);
        let image = test_image(512, 448);
        group.throughput(criterion::Throughput::Elements((512 * 448 * size) as u64));

        let erosion = MorphologicalTransformation::new(
            MorphologicalOperator::Erosion,
            StructuringElement::boxed(*size).unwrap(),
        );
        group.bench_with_input(
            BenchmarkId::new("erosion_box_f32", &parameter_string),
            &image,
            |b, i| {
                b.iter(|| {
                    let mut dst = i.clone();
                    black_box(erosion.apply(&mut dst, &Status::new()))
                })
            },
        );

        let median = MorphologicalTransformation::new(
            MorphologicalOperator::Median,
            StructuringElement::circular(*size).unwrap(),
        );
        group.bench_with_input(
            BenchmarkId::new("median_circular_f32", &parameter_string),
            &image,
            |b, i| {
                b.iter(|| {
                    let mut dst = i.clone();
                    black_box(median.apply(&mut dst, &Status::new()))
                })
            },
        );
    }
    group.finish();
}

fn bench_fft_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("FftConvolution");
    group.sample_size(20);

    for size in [7, 15, 31].iter() {
        let parameter_string = format!("512x448x{}", size);
        let image = test_image(512, 448);
        group.throughput(criterion::Throughput::Elements((512 * 448) as u64));

        let engine = FftConvolution::new(gaussian_kernel_2d(*size, *size as f64 / 4.0).unwrap());
        group.bench_with_input(
            BenchmarkId::new("gaussian_response_f32", &parameter_string),
            &image,
            |b, i| {
                b.iter(|| {
                    let mut dst = i.clone();
                    black_box(engine.apply(&mut dst, &Status::new()))
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_separable,
    bench_morphology,
    bench_fft_convolution
);
criterion_main!(benches);
