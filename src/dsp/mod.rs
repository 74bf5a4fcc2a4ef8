//! Low-level DSP primitives.
//!
//! Everything here is allocation-free and realtime-safe, so filters can be
//! embedded directly in voice structs or owned by the audio thread. The
//! modules stay focused on the signal-processing math; block rendering,
//! modulation and cross-thread control live in `graph` and `control`.

/// Seven Moog-style ladder lowpass models behind one trait.
pub mod ladder;
/// Saturation curves used inside the ladder loops.
pub mod saturation;

pub use ladder::{Ladder, LadderFilter, LadderModel};
