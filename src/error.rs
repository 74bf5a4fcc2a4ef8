//! Errors raised by the configuration layer.
//!
//! The realtime contract never fails: setters clamp and ticks compute. Only
//! building a filter from a [`LadderDescriptor`](crate::patch::LadderDescriptor)
//! or parsing a [`LadderModel`](crate::dsp::ladder::LadderModel) name can
//! return one of these, and both happen off the audio thread.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LadderError {
    #[error("sample rate must be finite and positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("unknown ladder model '{0}'")]
    UnknownModel(String),

    #[error("oversample factor must be between 1 and {max}, got {value}")]
    InvalidOversample { value: u32, max: u32 },

    #[error("parameter '{name}' must be finite, got {value}")]
    InvalidParameter { name: &'static str, value: f32 },
}

pub type Result<T> = std::result::Result<T, LadderError>;
