//! Microtracker ladder: saturated Euler stages with a fitted output mix.
//!
//! Each stage integrates the difference between the `fast_tanh` of its input
//! and of itself. Feedback uses a weighted mix of the last stage's current
//! and three previous values; the weights came out of a differential
//! evolution fit against a reference ladder, and they cancel most of the
//! phase error of the one-sample feedback delay.

use std::f64::consts::TAU;

use super::{clamp_cutoff, clamp_unit, LadderFilter, DEFAULT_CUTOFF_HZ, DEFAULT_RESONANCE};
use crate::dsp::saturation::fast_tanh;

/// Weights for `[p3, p3[n-1], p3[n-2], p3[n-3]]`.
const OUTPUT_MIX: [f64; 4] = [0.360891, 0.417290, 0.177896, 0.0439725];

pub struct Microtracker {
    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,

    omega: f64,
    k: f64,
    p: [f64; 4],
    history: [f64; 3],
}

impl Microtracker {
    /// Euler step stays stable while `omega <= 1`, i.e. `fc <= fs / 2pi`.
    fn max_cutoff(&self) -> f32 {
        self.sample_rate / std::f32::consts::TAU
    }
}

impl LadderFilter for Microtracker {
    fn new(sample_rate: f32) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        let mut filter = Self {
            sample_rate,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            resonance: DEFAULT_RESONANCE,
            omega: 0.0,
            k: 0.0,
            p: [0.0; 4],
            history: [0.0; 3],
        };
        filter.set_cutoff(DEFAULT_CUTOFF_HZ);
        filter.set_resonance(DEFAULT_RESONANCE);
        filter
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.set_cutoff(self.cutoff_hz);
    }

    fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    fn set_cutoff(&mut self, hz: f32) {
        self.cutoff_hz = clamp_cutoff(hz, self.max_cutoff());
        self.omega = (TAU * f64::from(self.cutoff_hz) / f64::from(self.sample_rate)).min(1.0);
    }

    fn resonance(&self) -> f32 {
        self.resonance
    }

    fn set_resonance(&mut self, amount: f32) {
        self.resonance = clamp_unit(amount);
        self.k = 4.0 * f64::from(self.resonance);
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let p = &mut self.p;
        let h = &mut self.history;
        let w = self.omega;

        let out = p[3] * OUTPUT_MIX[0]
            + h[0] * OUTPUT_MIX[1]
            + h[1] * OUTPUT_MIX[2]
            + h[2] * OUTPUT_MIX[3];

        h[2] = h[1];
        h[1] = h[0];
        h[0] = p[3];

        p[0] += (fast_tanh(f64::from(input) - self.k * out) - fast_tanh(p[0])) * w;
        p[1] += (fast_tanh(p[0]) - fast_tanh(p[1])) * w;
        p[2] += (fast_tanh(p[1]) - fast_tanh(p[2])) * w;
        p[3] += (fast_tanh(p[2]) - fast_tanh(p[3])) * w;

        out as f32
    }

    fn reset(&mut self) {
        self.p = [0.0; 4];
        self.history = [0.0; 3];
    }
}
