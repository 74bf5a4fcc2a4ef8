//! Benchmarks for the ladder models.

mod ladder;

pub use ladder::{bench_ladder, bench_rk_oversample};
