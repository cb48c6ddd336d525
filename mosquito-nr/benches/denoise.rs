//! Benchmarks for the denoising pipeline.
//!
//! Run with: cargo bench -p mosquito-nr

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mosquito_nr::{Denoiser, FilterParameters, Plane, Pyramid, Radius, Scheduler, Scratch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZES: [(usize, usize); 3] = [(320, 240), (1280, 720), (1920, 1080)];

fn random_plane(width: usize, height: usize, seed: u64) -> Plane {
    let mut rng = StdRng::seed_from_u64(seed);
    let samples: Vec<i16> = (0..width * height)
        .map(|_| rng.random_range(0..1024))
        .collect();
    Plane::from_samples(width, height, &samples).unwrap()
}

fn bench_wavelet(c: &mut Criterion) {
    let mut group = c.benchmark_group("wavelet");
    let mut scheduler = Scheduler::new(rayon::current_num_threads()).unwrap();

    for (width, height) in SIZES {
        let input = random_plane(width, height, 42);
        let mut pyramid = Pyramid::new(width, height, 2).unwrap();
        let mut output = Plane::new(width, height).unwrap();
        let id = format!("{width}x{height}");

        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_function(BenchmarkId::new("round_trip", &id), |b| {
            b.iter(|| {
                pyramid.forward(&mut scheduler, black_box(&input)).unwrap();
                pyramid.inverse(&mut scheduler, &mut output).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_denoise(c: &mut Criterion) {
    let mut group = c.benchmark_group("denoise");

    for (width, height) in SIZES {
        let input = random_plane(width, height, 7);
        let mut scratch = Scratch::new(width, height).unwrap();
        let mut output = Plane::new(width, height).unwrap();
        let id = format!("{width}x{height}");

        group.throughput(Throughput::Elements((width * height) as u64));

        for radius in [Radius::One, Radius::Two] {
            let params = FilterParameters::default().with_radius(radius);
            let mut denoiser = Denoiser::new(params).unwrap();
            let name = format!("radius_{}", radius.get());

            group.bench_function(BenchmarkId::new(name, &id), |b| {
                b.iter(|| {
                    denoiser
                        .process(black_box(&input), &mut scratch, &mut output)
                        .unwrap();
                })
            });
        }
    }

    group.finish();
}

fn bench_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("threads");
    let (width, height) = (1920, 1080);
    let input = random_plane(width, height, 9);
    let mut scratch = Scratch::new(width, height).unwrap();
    let mut output = Plane::new(width, height).unwrap();

    group.throughput(Throughput::Elements((width * height) as u64));

    for threads in [1, 2, 4, 8] {
        let params = FilterParameters::default().with_threads(threads);
        let mut denoiser = Denoiser::new(params).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, _| {
            b.iter(|| {
                denoiser
                    .process(black_box(&input), &mut scratch, &mut output)
                    .unwrap();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_wavelet, bench_denoise, bench_threads);
criterion_main!(benches);
