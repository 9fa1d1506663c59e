//! Benchmarks for galaxy generation and shader source assembly.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use galaxy::shader::{fragment_stage, vertex_stage};
use galaxy::{generate, GalaxyParameters, VisualConfig};

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.sample_size(20);

    for count in [10_000u32, 200_000, 1_000_000] {
        let params = GalaxyParameters {
            count,
            ..GalaxyParameters::default()
        };
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("particles", count), &params, |b, params| {
            let mut rng = SmallRng::seed_from_u64(0);
            b.iter(|| black_box(generate(params, &mut rng)))
        });
    }

    group.finish();
}

fn bench_jitter_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("randomness_power");

    for power in [1.0f32, 3.0, 10.0] {
        let params = GalaxyParameters {
            count: 100_000,
            randomness_power: power,
            ..GalaxyParameters::default()
        };
        group.bench_with_input(BenchmarkId::new("power", power), &params, |b, params| {
            let mut rng = SmallRng::seed_from_u64(0);
            b.iter(|| black_box(generate(params, &mut rng)))
        });
    }

    group.finish();
}

fn bench_shader_source(c: &mut Criterion) {
    let visuals = VisualConfig::default();
    c.bench_function("shader_source", |b| {
        b.iter(|| black_box((vertex_stage(&visuals), fragment_stage(&visuals))))
    });
}

criterion_group!(benches, bench_generate, bench_jitter_power, bench_shader_source);
criterion_main!(benches);
