//! Benchmarks for each ladder model.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_ladder::dsp::ladder::{Ladder, LadderFilter, LadderModel, Oberheim, RkSimulation};

use crate::BLOCK_SIZES;

pub fn bench_ladder(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/ladder");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Runtime-selected models, one match per block
        for model in LadderModel::ALL {
            let mut filter = Ladder::from_model(model, 48_000.0);
            filter.set_cutoff(1000.0);
            filter.set_resonance(0.7);
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(model.name(), size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.process(black_box(&mut buffer));
                })
            });
        }

        // Concrete type, for comparison with the enum dispatch above
        let mut filter = Oberheim::new(48_000.0);
        filter.set_cutoff(1000.0);
        filter.set_resonance(0.7);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("oberheim-static", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.process(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}

pub fn bench_rk_oversample(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/ladder_rk_oversample");
    let size = 256;
    let input: Vec<f32> = (0..size)
        .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
        .collect();

    for factor in [1, 2, 4, 8, 16] {
        let mut filter = RkSimulation::with_oversample(48_000.0, factor);
        filter.set_cutoff(5000.0);
        filter.set_resonance(0.9);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("rk-simulation", factor), &factor, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.process(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
