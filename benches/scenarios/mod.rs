//! Real-world scenario benchmarks.
//!
//! A ladder inside a voice is swept by an envelope or LFO once per block and
//! retuned by the UI between blocks. These measure that overhead on top of
//! the raw filter cost.

mod ladder;

pub use ladder::bench_ladder_nodes;
