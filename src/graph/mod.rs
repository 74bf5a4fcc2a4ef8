//! Block-rendering adapters for the ladder filters.
//!
//! Graph nodes wrap the per-sample DSP with what an instrument needs on top:
//! block rendering, note events, and modulation of a base value. The ladder
//! nodes follow the same traits as every other node, so they can be boxed
//! and chained with the rest of a patch.

/// Ladder filter nodes, owned or remote-controlled.
pub mod ladder;
/// Core traits shared by all graph nodes.
pub mod node;

pub use ladder::{LadderNode, LadderParam};
#[cfg(feature = "rtrb")]
pub use ladder::{LadderHandle, SharedLadderNode, LADDER_QUEUE_SIZE};
pub use node::{GraphNode, Modulatable, RenderCtx};
