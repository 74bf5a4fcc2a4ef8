//! Moog-style resonant ladder filters.
//!
//! Seven independent models of the same circuit share one contract,
//! [`LadderFilter`]. Pick a concrete type when the model is known at compile
//! time (the per-sample call monomorphizes and inlines), or [`Ladder`] when
//! it is chosen at runtime (one `match` per sample, no vtable).

/*
The Transistor Ladder
=====================

Bob Moog's 1965 lowpass is four identical one-pole RC stages in series.
Each stage rolls off 6 dB/octave, so the cascade gives 24 dB/octave. The
output of the last stage is fed back, inverted, to the input:

    in ──(+)──> [stage 1] ──> [stage 2] ──> [stage 3] ──> [stage 4] ──┬──> out
          ^-                                                           │
          └──────────────────────── k * out ───────────────────────────┘

At the cutoff frequency each stage shifts phase by 45°, four stages by 180°.
The inverted feedback is therefore back in phase there and boosts it: that
is resonance. At k = 4 the loop gain reaches 1 and the filter sings on its
own (self-oscillation). The transistors saturate, which keeps that
oscillation bounded instead of growing forever.

Why seven models?
-----------------

Turning that circuit into a per-sample recurrence is where the tradeoffs
live. The naive approach delays the feedback by one sample, which detunes
the resonance and shifts the oscillation threshold with cutoff. Each model
below fixes that differently:

| model          | strategy                                   | cost   |
| -------------- | ------------------------------------------ | ------ |
| Stilson        | empirical gain table + cubic pole fit      | low    |
| Krajeski       | polynomial fits of pole and feedback gain  | low    |
| MusicDSP       | bilinear stages, cubic clip at the output  | low    |
| Microtracker   | delayed-output mix fitted by optimization  | low    |
| Oberheim       | zero-delay feedback, solved analytically   | medium |
| Improved       | trapezoidal tanh integrators (D'Angelo)    | medium |
| RK simulation  | RK4 on the circuit's differential eqs      | high   |

They are alternatives, not refinements of each other, and they do not agree
sample for sample. Every one of them accepts the same parameters:

  cutoff     Hz, clamped per model to a stable range below Nyquist
  resonance  0.0 (none) .. 1.0 (at or past self-oscillation)
  drive      input gain into the first nonlinearity (where the model has one)

Example usage:
  let mut filter = Oberheim::new(48_000.0);
  filter.set_cutoff(800.0);
  filter.set_resonance(0.7);
  filter.process(&mut buffer);

  // Chosen at runtime
  let mut filter = Ladder::from_model(LadderModel::RkSimulation, 48_000.0);
*/

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::LadderError;

pub mod improved;
pub mod krajeski;
pub mod microtracker;
pub mod musicdsp;
pub mod oberheim;
pub mod rk_simulation;
pub mod stilson;

pub use improved::Improved;
pub use krajeski::Krajeski;
pub use microtracker::Microtracker;
pub use musicdsp::MusicDsp;
pub use oberheim::{Oberheim, OberheimResponse};
pub use rk_simulation::{RkSimulation, MAX_OVERSAMPLE};
pub use stilson::Stilson;

pub const DEFAULT_CUTOFF_HZ: f32 = 1000.0;
pub const DEFAULT_RESONANCE: f32 = 0.1;
pub const MIN_CUTOFF_HZ: f32 = 20.0;
pub const MAX_DRIVE: f32 = 10.0;

/// Cutoff at and above which makeup gain is unity.
pub const MAKEUP_KNEE_HZ: f64 = 500.0;
pub const MAX_MAKEUP_GAIN: f64 = 8.0;

/// The operation set every ladder model implements.
///
/// Everything here is allocation-free and bounded in time, so it can be
/// called from an audio callback. Setters clamp instead of failing and only
/// touch coefficients; `tick` is the only thing that advances filter state.
pub trait LadderFilter: Send {
    /// Create a filter with zeroed state, 1 kHz cutoff and 0.1 resonance.
    ///
    /// `sample_rate` must be positive. This is not checked in release builds.
    fn new(sample_rate: f32) -> Self
    where
        Self: Sized;

    fn sample_rate(&self) -> f32;

    /// Re-derive every coefficient for a new sample rate.
    ///
    /// The stored cutoff is re-clamped to the new ceiling. State is kept.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Cutoff in Hz after clamping.
    fn cutoff(&self) -> f32;

    fn set_cutoff(&mut self, hz: f32);

    /// Normalized resonance in `[0, 1]`.
    fn resonance(&self) -> f32;

    fn set_resonance(&mut self, amount: f32);

    /// Input drive, or `None` for models without a drive stage.
    fn drive(&self) -> Option<f32> {
        None
    }

    /// Set the input drive. Ignored by models without a drive stage.
    fn set_drive(&mut self, _amount: f32) {}

    /// Advance the ladder by one sample.
    fn tick(&mut self, input: f32) -> f32;

    /// Filter a block in place.
    fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick(*sample);
        }
    }

    /// Forget signal history. Coefficients and parameters are kept.
    fn reset(&mut self);
}

/// Clamp a cutoff request into `[MIN_CUTOFF_HZ, max_hz]`. NaN maps to the minimum.
#[inline]
pub(crate) fn clamp_cutoff(hz: f32, max_hz: f32) -> f32 {
    hz.max(MIN_CUTOFF_HZ).min(max_hz)
}

/// Clamp to `[0, 1]`. NaN maps to 0.
#[inline]
pub(crate) fn clamp_unit(amount: f32) -> f32 {
    amount.max(0.0).min(1.0)
}

/// Clamp to `[0, MAX_DRIVE]`. NaN maps to 0.
#[inline]
pub(crate) fn clamp_drive(amount: f32) -> f32 {
    amount.max(0.0).min(MAX_DRIVE)
}

/// Output compensation for the loudness lost at low cutoff.
///
/// Unity at and above [`MAKEUP_KNEE_HZ`], reciprocal below it, capped at
/// [`MAX_MAKEUP_GAIN`].
#[inline]
pub(crate) fn makeup_gain(cutoff_hz: f32) -> f64 {
    (MAKEUP_KNEE_HZ / f64::from(cutoff_hz)).clamp(1.0, MAX_MAKEUP_GAIN)
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LadderModel {
    Stilson,
    Krajeski,
    MusicDsp,
    Oberheim,
    #[default]
    Improved,
    Microtracker,
    RkSimulation,
}

impl LadderModel {
    pub const ALL: [LadderModel; 7] = [
        LadderModel::Stilson,
        LadderModel::Krajeski,
        LadderModel::MusicDsp,
        LadderModel::Oberheim,
        LadderModel::Improved,
        LadderModel::Microtracker,
        LadderModel::RkSimulation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LadderModel::Stilson => "stilson",
            LadderModel::Krajeski => "krajeski",
            LadderModel::MusicDsp => "music-dsp",
            LadderModel::Oberheim => "oberheim",
            LadderModel::Improved => "improved",
            LadderModel::Microtracker => "microtracker",
            LadderModel::RkSimulation => "rk-simulation",
        }
    }
}

impl fmt::Display for LadderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LadderModel {
    type Err = LadderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LadderModel::ALL
            .into_iter()
            .find(|model| model.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LadderError::UnknownModel(wanted.to_string()))
    }
}

/// Any ladder model, selected at runtime.
pub enum Ladder {
    Stilson(Stilson),
    Krajeski(Krajeski),
    MusicDsp(MusicDsp),
    Oberheim(Oberheim),
    Improved(Improved),
    Microtracker(Microtracker),
    RkSimulation(RkSimulation),
}

macro_rules! dispatch {
    ($self:expr, $filter:ident => $body:expr) => {
        match $self {
            Ladder::Stilson($filter) => $body,
            Ladder::Krajeski($filter) => $body,
            Ladder::MusicDsp($filter) => $body,
            Ladder::Oberheim($filter) => $body,
            Ladder::Improved($filter) => $body,
            Ladder::Microtracker($filter) => $body,
            Ladder::RkSimulation($filter) => $body,
        }
    };
}

impl Ladder {
    pub fn from_model(model: LadderModel, sample_rate: f32) -> Self {
        match model {
            LadderModel::Stilson => Ladder::Stilson(Stilson::new(sample_rate)),
            LadderModel::Krajeski => Ladder::Krajeski(Krajeski::new(sample_rate)),
            LadderModel::MusicDsp => Ladder::MusicDsp(MusicDsp::new(sample_rate)),
            LadderModel::Oberheim => Ladder::Oberheim(Oberheim::new(sample_rate)),
            LadderModel::Improved => Ladder::Improved(Improved::new(sample_rate)),
            LadderModel::Microtracker => Ladder::Microtracker(Microtracker::new(sample_rate)),
            LadderModel::RkSimulation => Ladder::RkSimulation(RkSimulation::new(sample_rate)),
        }
    }

    pub fn model(&self) -> LadderModel {
        match self {
            Ladder::Stilson(_) => LadderModel::Stilson,
            Ladder::Krajeski(_) => LadderModel::Krajeski,
            Ladder::MusicDsp(_) => LadderModel::MusicDsp,
            Ladder::Oberheim(_) => LadderModel::Oberheim,
            Ladder::Improved(_) => LadderModel::Improved,
            Ladder::Microtracker(_) => LadderModel::Microtracker,
            Ladder::RkSimulation(_) => LadderModel::RkSimulation,
        }
    }
}

impl LadderFilter for Ladder {
    /// Builds the default model ([`LadderModel::Improved`]).
    fn new(sample_rate: f32) -> Self {
        Ladder::from_model(LadderModel::default(), sample_rate)
    }

    fn sample_rate(&self) -> f32 {
        dispatch!(self, f => f.sample_rate())
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        dispatch!(self, f => f.set_sample_rate(sample_rate))
    }

    fn cutoff(&self) -> f32 {
        dispatch!(self, f => f.cutoff())
    }

    fn set_cutoff(&mut self, hz: f32) {
        dispatch!(self, f => f.set_cutoff(hz))
    }

    fn resonance(&self) -> f32 {
        dispatch!(self, f => f.resonance())
    }

    fn set_resonance(&mut self, amount: f32) {
        dispatch!(self, f => f.set_resonance(amount))
    }

    fn drive(&self) -> Option<f32> {
        dispatch!(self, f => f.drive())
    }

    fn set_drive(&mut self, amount: f32) {
        dispatch!(self, f => f.set_drive(amount))
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        dispatch!(self, f => f.tick(input))
    }

    // Dispatch once per block rather than once per sample.
    fn process(&mut self, buffer: &mut [f32]) {
        dispatch!(self, f => f.process(buffer))
    }

    fn reset(&mut self) {
        dispatch!(self, f => f.reset())
    }
}
