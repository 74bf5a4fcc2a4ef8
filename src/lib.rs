pub mod control; // Lock-free parameter handoff to the audio thread
pub mod dsp;
pub mod error;
pub mod graph; // Block-rendering node adapters
pub mod patch; // Serializable filter descriptors

pub use dsp::ladder::{Ladder, LadderFilter, LadderModel};
pub use error::{LadderError, Result};

/// Largest block a graph node accepts per render call.
pub const MAX_BLOCK_SIZE: usize = 2048;
