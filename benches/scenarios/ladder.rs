//! Benchmarks for ladder graph nodes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_ladder::dsp::ladder::{Improved, Ladder, LadderModel};
use saavy_ladder::graph::{
    GraphNode, LadderNode, LadderParam, Modulatable, RenderCtx, SharedLadderNode,
};

use crate::BLOCK_SIZES;

pub fn bench_ladder_nodes(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/ladder");
    let ctx = RenderCtx::new(48_000.0);

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut buffer = input.clone();

        // === ACID SWEEP ===
        // block-rate cutoff sweep, as an LFO would drive it
        let mut acid = LadderNode::<Improved>::with_params(48_000.0, 400.0, 0.85);
        let mut phase = 0.0f32;
        group.bench_with_input(BenchmarkId::new("acid_sweep", size), &size, |b, _| {
            b.iter(|| {
                phase = (phase + 0.05) % std::f32::consts::TAU;
                acid.apply_modulation(LadderParam::Cutoff, 400.0, phase.sin() * 800.0);
                buffer.copy_from_slice(&input);
                acid.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // === REMOTE CONTROL ===
        // one cutoff message drained per block
        let ladder = Ladder::from_model(LadderModel::Oberheim, 48_000.0);
        let (mut shared, mut handle) = SharedLadderNode::new(ladder);
        let mut cutoff = 200.0f32;
        group.bench_with_input(BenchmarkId::new("shared_messages", size), &size, |b, _| {
            b.iter(|| {
                cutoff = if cutoff > 8000.0 { 200.0 } else { cutoff * 1.01 };
                handle.set_cutoff(cutoff);
                buffer.copy_from_slice(&input);
                shared.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
