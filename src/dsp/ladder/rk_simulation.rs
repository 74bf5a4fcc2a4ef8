//! RK simulation: the ladder's differential equations integrated with RK4.
//!
//! The circuit is written as four coupled first-order ODEs,
//!
//! ```text
//! dy0/dt = w * (S(x - k * y3) - S(y0))
//! dyi/dt = w * (S(y(i-1))    - S(yi))
//! ```
//!
//! where `S` is a scaled cubic limiter standing in for the transistor
//! curves. Each output sample advances the system by `oversample` classic
//! fourth-order Runge-Kutta steps. This is the most expensive model in the
//! bank and the closest to the continuous-time circuit, which makes it a
//! reference for the others.

use std::f64::consts::TAU;

use super::{
    clamp_cutoff, clamp_unit, makeup_gain, LadderFilter, DEFAULT_CUTOFF_HZ, DEFAULT_RESONANCE,
};
use crate::dsp::saturation::soft_limit;

/// Upper bound on RK4 sub-steps per output sample.
pub const MAX_OVERSAMPLE: u32 = 16;

pub const DEFAULT_SATURATION: f64 = 3.0;
pub const MIN_SATURATION: f64 = 0.1;
pub const MAX_SATURATION: f64 = 10.0;

const MAX_CUTOFF_RATIO: f32 = 0.45;

/// Cutoff per RK4 sub-step, as a fraction of the sample rate, that keeps the
/// linearized ladder inside RK4's stability region at every resonance.
///
/// Full feedback puts a pole pair at `w * (-2 +/- i)`; RK4 holds it for
/// `w * h` up to about 1.275, i.e. `fc` up to `0.203 / h`. Above that the
/// state grows until the limiter catches it and the filter rings forever.
const STABLE_STEP_RATIO: f32 = 0.2;

pub struct RkSimulation {
    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,
    oversample: u32,

    omega: f64,
    k: f64,
    step_size: f64,
    makeup: f64,
    saturation: f64,
    saturation_inv: f64,

    state: [f64; 4],
}

impl RkSimulation {
    /// Create a filter that takes `factor` RK4 steps per sample.
    pub fn with_oversample(sample_rate: f32, factor: u32) -> Self {
        let mut filter = Self::new(sample_rate);
        filter.set_oversample(factor);
        filter
    }

    pub fn oversample(&self) -> u32 {
        self.oversample
    }

    /// Clamp `factor` into `1..=MAX_OVERSAMPLE` and re-derive the step size.
    ///
    /// The cutoff ceiling depends on the step size, so the stored cutoff is
    /// clamped again.
    pub fn set_oversample(&mut self, factor: u32) {
        self.oversample = factor.clamp(1, MAX_OVERSAMPLE);
        self.set_cutoff(self.cutoff_hz);
    }

    pub fn saturation(&self) -> f64 {
        self.saturation
    }

    /// Limiter scale. Output of each limiter stays within `2/3` of it.
    pub fn set_saturation(&mut self, level: f64) {
        self.saturation = level.max(MIN_SATURATION).min(MAX_SATURATION);
        self.saturation_inv = 1.0 / self.saturation;
    }

    /// `0.45 * fs`, lowered to what a single RK4 step can integrate stably.
    fn max_cutoff(&self) -> f32 {
        let stable = STABLE_STEP_RATIO * self.oversample as f32;
        self.sample_rate * stable.min(MAX_CUTOFF_RATIO)
    }

    fn update_step_size(&mut self) {
        self.step_size = 1.0 / (f64::from(self.oversample) * f64::from(self.sample_rate));
    }

    #[inline]
    fn limit(&self, value: f64) -> f64 {
        soft_limit(value, self.saturation, self.saturation_inv)
    }

    #[inline]
    fn derivatives(&self, input: f64, y: &[f64; 4]) -> [f64; 4] {
        let s0 = self.limit(y[0]);
        let s1 = self.limit(y[1]);
        let s2 = self.limit(y[2]);
        let s3 = self.limit(y[3]);
        let w = self.omega;

        [
            w * (self.limit(input - self.k * y[3]) - s0),
            w * (s0 - s1),
            w * (s1 - s2),
            w * (s2 - s3),
        ]
    }

    #[inline]
    fn rk4_step(&mut self, input: f64) {
        let h = self.step_size;
        let y = self.state;

        let offset = |d: &[f64; 4], scale: f64| -> [f64; 4] {
            [
                y[0] + scale * d[0],
                y[1] + scale * d[1],
                y[2] + scale * d[2],
                y[3] + scale * d[3],
            ]
        };

        let k1 = self.derivatives(input, &y);
        let k2 = self.derivatives(input, &offset(&k1, 0.5 * h));
        let k3 = self.derivatives(input, &offset(&k2, 0.5 * h));
        let k4 = self.derivatives(input, &offset(&k3, h));

        for i in 0..4 {
            self.state[i] = y[i] + h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
        }
    }
}

impl LadderFilter for RkSimulation {
    fn new(sample_rate: f32) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        let mut filter = Self {
            sample_rate,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            resonance: DEFAULT_RESONANCE,
            oversample: 1,
            omega: 0.0,
            k: 0.0,
            step_size: 0.0,
            makeup: 1.0,
            saturation: DEFAULT_SATURATION,
            saturation_inv: 1.0 / DEFAULT_SATURATION,
            state: [0.0; 4],
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
        self.omega = TAU * f64::from(self.cutoff_hz);
        self.makeup = makeup_gain(self.cutoff_hz);
        self.update_step_size();
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
        let x = f64::from(input);
        for _ in 0..self.oversample {
            self.rk4_step(x);
        }
        (self.state[3] * self.makeup) as f32
    }

    fn reset(&mut self) {
        self.state = [0.0; 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversample_clamps() {
        let mut filter = RkSimulation::new(48_000.0);
        filter.set_oversample(0);
        assert_eq!(filter.oversample(), 1);
        filter.set_oversample(64);
        assert_eq!(filter.oversample(), MAX_OVERSAMPLE);
    }

    #[test]
    fn test_step_size_follows_oversample() {
        let filter = RkSimulation::with_oversample(48_000.0, 4);
        assert!((filter.step_size - 1.0 / 192_000.0).abs() < 1e-15);
    }

    #[test]
    fn test_saturation_clamps_and_caches_reciprocal() {
        let mut filter = RkSimulation::new(48_000.0);
        filter.set_saturation(0.0);
        assert_eq!(filter.saturation(), MIN_SATURATION);
        filter.set_saturation(50.0);
        assert_eq!(filter.saturation(), MAX_SATURATION);
        assert!((filter.saturation_inv - 0.1).abs() < 1e-15);
    }

    #[test]
    fn test_oversampling_converges() {
        // More sub-steps should agree closely with fewer at a moderate cutoff.
        let mut coarse = RkSimulation::with_oversample(48_000.0, 1);
        let mut fine = RkSimulation::with_oversample(48_000.0, 8);
        for f in [&mut coarse, &mut fine] {
            f.set_cutoff(2000.0);
            f.set_resonance(0.5);
        }

        let mut max_diff = 0.0f32;
        for i in 0..2048 {
            let x = (i as f32 * 0.05).sin() * 0.5;
            max_diff = max_diff.max((coarse.tick(x) - fine.tick(x)).abs());
        }
        assert!(max_diff < 0.01, "max_diff = {max_diff}");
    }

    #[test]
    fn test_ceiling_follows_oversample() {
        let mut filter = RkSimulation::new(48_000.0);
        filter.set_cutoff(30_000.0);
        assert_eq!(filter.cutoff(), 9600.0);

        filter.set_oversample(2);
        assert_eq!(filter.cutoff(), 9600.0);
        filter.set_cutoff(30_000.0);
        assert_eq!(filter.cutoff(), 19_200.0);

        filter.set_oversample(4);
        filter.set_cutoff(30_000.0);
        assert_eq!(filter.cutoff(), 48_000.0 * MAX_CUTOFF_RATIO);

        // Dropping back to one step pulls the stored cutoff down with it.
        filter.set_oversample(1);
        assert_eq!(filter.cutoff(), 9600.0);
    }

    #[test]
    fn test_step_stays_inside_rk4_stability() {
        for factor in 1..=MAX_OVERSAMPLE {
            let mut filter = RkSimulation::with_oversample(48_000.0, factor);
            filter.set_cutoff(f32::MAX);
            let wh = filter.omega * filter.step_size;
            assert!(wh < 1.275, "oversample {factor}: w*h = {wh}");
        }
    }

    #[test]
    fn test_rings_out_at_ceiling() {
        // Any leftover state must die out with no input at the top cutoff.
        for factor in [1, 2, 4] {
            for resonance in [0.0, 0.5, 0.9] {
                let mut filter = RkSimulation::with_oversample(48_000.0, factor);
                filter.set_cutoff(f32::MAX);
                filter.set_resonance(resonance);
                for i in 0..4000 {
                    filter.tick(if i % 2 == 0 { 1.0 } else { -1.0 });
                }
                for _ in 0..4096 {
                    filter.tick(0.0);
                }
                let tail = (0..256).fold(0.0f32, |m, _| m.max(filter.tick(0.0).abs()));
                assert!(
                    tail < 1e-6,
                    "oversample {factor} resonance {resonance}: tail {tail}"
                );
            }
        }
    }

    #[test]
    fn test_dc_unity_with_makeup() {
        let mut filter = RkSimulation::new(48_000.0);
        filter.set_resonance(0.0);
        filter.set_cutoff(250.0);
        let mut y = 0.0;
        for _ in 0..20_000 {
            y = filter.tick(0.25);
        }
        // 0.25 * makeup(250 Hz) = 0.5
        assert!((y - 0.5).abs() < 1e-3, "y = {y}");
    }
}
