//! MusicDSP ladder: bilinear cascade with a cubic clip on the output.
//!
//! The four stages are plain bilinear one-poles,
//!
//! ```text
//! y[n] = p * (x[n] + x[n-1]) - k * y[n-1]
//! ```
//!
//! and only the last stage is saturated, standing in for the output
//! transistor pair. The feedback gain is scaled by a rational function of the
//! pole (`t1`, `t2`) that compensates for the loop's one-sample delay.

use std::f64::consts::PI;

use super::{clamp_cutoff, clamp_unit, LadderFilter, DEFAULT_CUTOFF_HZ, DEFAULT_RESONANCE};
use crate::dsp::saturation::cubic_soft_clip;

const MAX_CUTOFF_RATIO: f32 = 0.45;

pub struct MusicDsp {
    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,

    p: f64,
    k: f64,
    t1: f64,
    t2: f64,
    feedback: f64,
    stage: [f64; 4],
    delay: [f64; 4],
}

impl MusicDsp {
    fn max_cutoff(&self) -> f32 {
        self.sample_rate * MAX_CUTOFF_RATIO
    }

    fn update_feedback(&mut self) {
        // t2 - 6 * t1 = (t1 - 3)^2 + 3, never zero
        self.feedback =
            f64::from(self.resonance) * (self.t2 + 6.0 * self.t1) / (self.t2 - 6.0 * self.t1);
    }
}

impl LadderFilter for MusicDsp {
    fn new(sample_rate: f32) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        let mut filter = Self {
            sample_rate,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            resonance: DEFAULT_RESONANCE,
            p: 0.0,
            k: 0.0,
            t1: 0.0,
            t2: 0.0,
            feedback: 0.0,
            stage: [0.0; 4],
            delay: [0.0; 4],
        };
        filter.set_cutoff(DEFAULT_CUTOFF_HZ);
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

        let c = 2.0 * f64::from(self.cutoff_hz) / f64::from(self.sample_rate);
        self.p = c * (1.8 - 0.8 * c);
        self.k = 2.0 * (c * PI * 0.5).sin() - 1.0;
        self.t1 = (1.0 - self.p) * 1.386249;
        self.t2 = 12.0 + self.t1 * self.t1;

        self.update_feedback();
    }

    fn resonance(&self) -> f32 {
        self.resonance
    }

    fn set_resonance(&mut self, amount: f32) {
        self.resonance = clamp_unit(amount);
        self.update_feedback();
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let (p, k) = (self.p, self.k);
        let x = f64::from(input) - self.feedback * self.stage[3];

        self.stage[0] = x * p + self.delay[0] * p - k * self.stage[0];
        self.stage[1] = self.stage[0] * p + self.delay[1] * p - k * self.stage[1];
        self.stage[2] = self.stage[1] * p + self.delay[2] * p - k * self.stage[2];
        self.stage[3] = self.stage[2] * p + self.delay[3] * p - k * self.stage[3];

        self.stage[3] = cubic_soft_clip(self.stage[3]);

        self.delay = [x, self.stage[0], self.stage[1], self.stage[2]];

        self.stage[3] as f32
    }

    fn reset(&mut self) {
        self.stage = [0.0; 4];
        self.delay = [0.0; 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_reaches_four_at_low_cutoff() {
        let mut filter = MusicDsp::new(48_000.0);
        filter.set_cutoff(20.0);
        filter.set_resonance(1.0);
        assert!(
            (filter.feedback - 4.0).abs() < 0.1,
            "feedback = {}",
            filter.feedback
        );
    }

    #[test]
    fn test_feedback_tracks_resonance_linearly() {
        let mut filter = MusicDsp::new(48_000.0);
        filter.set_resonance(1.0);
        let full = filter.feedback;
        filter.set_resonance(0.25);
        assert!((filter.feedback - 0.25 * full).abs() < 1e-12);
    }

    #[test]
    fn test_output_bounded_by_clip() {
        let ceiling = cubic_soft_clip(10.0) as f32;
        let mut filter = MusicDsp::new(48_000.0);
        filter.set_cutoff(3000.0);
        filter.set_resonance(1.0);

        for i in 0..8192 {
            let y = filter.tick(if i % 64 < 32 { 1.0 } else { -1.0 });
            assert!(y.abs() <= ceiling + 1e-6, "y = {y}");
        }
    }

    #[test]
    fn test_cutoff_changes_keep_resonance() {
        let mut filter = MusicDsp::new(48_000.0);
        filter.set_resonance(0.7);
        filter.set_cutoff(5000.0);
        assert_eq!(filter.resonance(), 0.7);
        assert!(filter.feedback > 0.0);
    }
}
