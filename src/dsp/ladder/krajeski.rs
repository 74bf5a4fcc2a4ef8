//! Krajeski ladder: bilinear stages with polynomial-fitted coefficients.
//!
//! Each stage is a one-pole lowpass whose zero sits partway between the
//! current and previous input ("compromise pole", weights 0.3 and 1.0 over
//! 1.3). The feedback still comes from the previous sample's output, but
//! rather than correcting for that with a table, both the stage gain `g` and
//! the feedback gain `g_res` are polynomials in the normalized angular cutoff
//! `wc`, fitted so the resonance stays put as cutoff moves.

use std::f64::consts::PI;

use super::{
    clamp_cutoff, clamp_drive, clamp_unit, LadderFilter, DEFAULT_CUTOFF_HZ, DEFAULT_RESONANCE,
};

const MAX_CUTOFF_RATIO: f32 = 0.45;

const STAGE_MIX: f64 = 0.3 / 1.3;
const DELAY_MIX: f64 = 1.0 / 1.3;

/// Stage values are held inside this range so a runaway loop stays finite.
const STATE_LIMIT: f64 = 1.0e30;

pub struct Krajeski {
    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,
    drive: f32,

    wc: f64,
    g: f64,
    g_res: f64,
    g_comp: f64, // passband compensation, 1.0 keeps full low end at high resonance
    state: [f64; 5],
    delay: [f64; 4],
}

impl Krajeski {
    fn max_cutoff(&self) -> f32 {
        self.sample_rate * MAX_CUTOFF_RATIO
    }

    fn update_feedback(&mut self) {
        let wc = self.wc;
        self.g_res = f64::from(self.resonance)
            * (1.0029 + 0.0526 * wc - 0.926 * wc.powi(2) + 0.0218 * wc.powi(3));
    }
}

impl LadderFilter for Krajeski {
    fn new(sample_rate: f32) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        let mut filter = Self {
            sample_rate,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            resonance: DEFAULT_RESONANCE,
            drive: 1.0,
            wc: 0.0,
            g: 0.0,
            g_res: 0.0,
            g_comp: 1.0,
            state: [0.0; 5],
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
        let wc = 2.0 * PI * f64::from(self.cutoff_hz) / f64::from(self.sample_rate);
        self.wc = wc;
        self.g = 0.9892 * wc - 0.4342 * wc.powi(2) + 0.1381 * wc.powi(3) - 0.0202 * wc.powi(4);
        self.update_feedback();
    }

    fn resonance(&self) -> f32 {
        self.resonance
    }

    fn set_resonance(&mut self, amount: f32) {
        self.resonance = clamp_unit(amount);
        self.update_feedback();
    }

    fn drive(&self) -> Option<f32> {
        Some(self.drive)
    }

    fn set_drive(&mut self, amount: f32) {
        self.drive = clamp_drive(amount);
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let x = f64::from(input);
        let drive = f64::from(self.drive);

        self.state[0] =
            (drive * (x - 4.0 * self.g_res * (self.state[4] - self.g_comp * x))).tanh();

        for i in 0..4 {
            let next = self.g
                * (STAGE_MIX * self.state[i] + DELAY_MIX * self.delay[i] - self.state[i + 1])
                + self.state[i + 1];
            self.state[i + 1] = next.clamp(-STATE_LIMIT, STATE_LIMIT);
            self.delay[i] = self.state[i];
        }

        self.state[4] as f32
    }

    fn reset(&mut self) {
        self.state = [0.0; 5];
        self.delay = [0.0; 4];
    }
}
