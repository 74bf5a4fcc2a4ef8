//! Serializable filter settings.
//!
//! A [`LadderDescriptor`] is what a preset stores for one filter. Values are
//! validated and then applied through the same setters the audio thread
//! uses, so anything out of range ends up clamped exactly as a live
//! parameter change would be. Building happens off the audio thread, which
//! is the only place this crate logs.

use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::ladder::{
        Ladder, LadderFilter, LadderModel, DEFAULT_CUTOFF_HZ, DEFAULT_RESONANCE, MAX_OVERSAMPLE,
    },
    error::{LadderError, Result},
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct LadderDescriptor {
    pub model: LadderModel,
    pub cutoff_hz: f32,
    pub resonance: f32,
    /// Ignored by models without a drive stage.
    pub drive: f32,
    /// RK4 sub-steps per sample. Only used by the RK simulation.
    pub oversample: u32,
    /// Limiter scale. Only used by the RK simulation.
    pub saturation: f32,
}

/// A descriptor value the built filter does not run with as written.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Adjustment {
    Clamped {
        name: &'static str,
        requested: f32,
        applied: f32,
    },
    Ignored {
        name: &'static str,
        value: f32,
    },
}

impl Default for LadderDescriptor {
    fn default() -> Self {
        Self {
            model: LadderModel::default(),
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            resonance: DEFAULT_RESONANCE,
            drive: 1.0,
            oversample: 1,
            saturation: 3.0,
        }
    }
}

impl LadderDescriptor {
    pub fn new(model: LadderModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Reject values no setter can make sense of.
    ///
    /// Finite values outside a parameter's range are accepted here and
    /// clamped on build.
    pub fn validate(&self) -> Result<()> {
        let params = [
            ("cutoff_hz", self.cutoff_hz),
            ("resonance", self.resonance),
            ("drive", self.drive),
            ("saturation", self.saturation),
        ];
        for (name, value) in params {
            if !value.is_finite() {
                return Err(LadderError::InvalidParameter { name, value });
            }
        }

        if self.oversample == 0 || self.oversample > MAX_OVERSAMPLE {
            return Err(LadderError::InvalidOversample {
                value: self.oversample,
                max: MAX_OVERSAMPLE,
            });
        }

        Ok(())
    }

    /// Validate and build a filter running at `sample_rate`.
    pub fn build(&self, sample_rate: f32) -> Result<Ladder> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(LadderError::InvalidSampleRate(sample_rate));
        }
        self.validate()?;

        let mut ladder = Ladder::from_model(self.model, sample_rate);

        if let Ladder::RkSimulation(rk) = &mut ladder {
            rk.set_oversample(self.oversample);
            rk.set_saturation(f64::from(self.saturation));
        }

        ladder.set_cutoff(self.cutoff_hz);
        ladder.set_resonance(self.resonance);
        ladder.set_drive(self.drive);

        for adjustment in self.adjustments(&ladder) {
            match adjustment {
                Adjustment::Clamped {
                    name,
                    requested,
                    applied,
                } => warn!(
                    "{} {name} {requested} clamped to {applied} at {sample_rate} Hz sample rate",
                    self.model
                ),
                Adjustment::Ignored { name, value } => {
                    warn!("{} has no {name} control, ignoring {value}", self.model)
                }
            }
        }

        debug!(
            "built {} ladder: cutoff={} Hz resonance={} sample_rate={}",
            self.model,
            ladder.cutoff(),
            ladder.resonance(),
            sample_rate
        );

        Ok(ladder)
    }

    /// Compare the descriptor with what `ladder` ended up running.
    fn adjustments(&self, ladder: &Ladder) -> Vec<Adjustment> {
        let defaults = Self::default();
        let mut out = Vec::new();

        let mut compare = |name, requested: f32, applied: f32| {
            if requested != applied {
                out.push(Adjustment::Clamped {
                    name,
                    requested,
                    applied,
                });
            }
        };
        compare("cutoff_hz", self.cutoff_hz, ladder.cutoff());
        compare("resonance", self.resonance, ladder.resonance());
        if let Some(drive) = ladder.drive() {
            compare("drive", self.drive, drive);
        }
        if let Ladder::RkSimulation(rk) = ladder {
            compare("saturation", self.saturation, rk.saturation() as f32);
        }

        if ladder.drive().is_none() && self.drive != defaults.drive {
            out.push(Adjustment::Ignored {
                name: "drive",
                value: self.drive,
            });
        }
        if !matches!(ladder, Ladder::RkSimulation(_)) {
            if self.oversample != defaults.oversample {
                out.push(Adjustment::Ignored {
                    name: "oversample",
                    value: self.oversample as f32,
                });
            }
            if self.saturation != defaults.saturation {
                out.push(Adjustment::Ignored {
                    name: "saturation",
                    value: self.saturation,
                });
            }
        }

        out
    }
}

impl From<LadderModel> for LadderDescriptor {
    fn from(model: LadderModel) -> Self {
        Self::new(model)
    }
}
