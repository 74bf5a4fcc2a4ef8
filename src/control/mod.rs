//! Parameter changes from a control thread to the audio thread.
//!
//! A filter owned by the audio callback cannot be touched directly from a UI
//! or MIDI thread. Instead the control side sends [`LadderMessage`]s through
//! a single-producer/single-consumer queue, and the audio side drains them at
//! the start of each block. Nothing on the draining side locks, allocates or
//! logs.

pub mod message;

pub use message::{apply_message, drain_messages, LadderMessage, MessageReceiver};
