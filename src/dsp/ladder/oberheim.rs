//! Oberheim-variation ladder: zero-delay feedback with selectable response.
//!
//! Each stage is a trapezoidal (TPT) one-pole. Instead of delaying the
//! feedback by a sample, the loop is solved exactly every tick: each stage's
//! contribution to the output is split into a part that depends on its state
//! (`beta * z1`, known before the tick) and a part that depends on the input
//! (`gamma = G^4`, the cascade's instantaneous gain). That gives the input to
//! the first stage in closed form,
//!
//! ```text
//! u = (x * (1 + K) - K * sigma) * alpha0,    alpha0 = 1 / (1 + K * gamma)
//! ```
//!
//! The input is scaled by `1 + K` to win back the passband gain the feedback
//! takes away.
//!
//! Because every stage output is available, a weighted sum of them yields
//! other responses from the same ladder, as on the Oberheim Xpander.

use std::f64::consts::PI;

use super::{
    clamp_cutoff, clamp_drive, clamp_unit, LadderFilter, DEFAULT_CUTOFF_HZ, DEFAULT_RESONANCE,
};

const MAX_CUTOFF_RATIO: f32 = 0.45;

/// Output mix over `[u, stage1, stage2, stage3, stage4]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OberheimResponse {
    LowPass2,
    #[default]
    LowPass4,
    BandPass2,
    BandPass4,
    HighPass2,
    HighPass4,
}

impl OberheimResponse {
    fn coefficients(self) -> [f64; 5] {
        match self {
            OberheimResponse::LowPass2 => [0.0, 0.0, 1.0, 0.0, 0.0],
            OberheimResponse::LowPass4 => [0.0, 0.0, 0.0, 0.0, 1.0],
            OberheimResponse::BandPass2 => [0.0, 2.0, -2.0, 0.0, 0.0],
            OberheimResponse::BandPass4 => [0.0, 0.0, 4.0, -8.0, 4.0],
            OberheimResponse::HighPass2 => [1.0, -2.0, 1.0, 0.0, 0.0],
            OberheimResponse::HighPass4 => [1.0, -4.0, 6.0, -4.0, 1.0],
        }
    }
}

/// Trapezoidal one-pole lowpass.
#[derive(Debug, Clone, Copy)]
struct OnePole {
    alpha: f64,
    beta: f64,
    z1: f64,
}

impl OnePole {
    const fn new() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.0,
            z1: 0.0,
        }
    }

    #[inline]
    fn tick(&mut self, x: f64) -> f64 {
        let v = (x - self.z1) * self.alpha;
        let out = v + self.z1;
        self.z1 = v + out;
        out
    }

    /// State-dependent part of this stage's share of the loop output.
    #[inline]
    fn feedback_output(&self) -> f64 {
        self.beta * self.z1
    }
}

pub struct Oberheim {
    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,
    drive: f32,
    response: OberheimResponse,

    k: f64,
    gamma: f64,
    alpha0: f64,
    mix: [f64; 5],
    stages: [OnePole; 4],
}

impl Oberheim {
    pub fn response(&self) -> OberheimResponse {
        self.response
    }

    pub fn set_response(&mut self, response: OberheimResponse) {
        self.response = response;
        self.mix = response.coefficients();
    }

    fn max_cutoff(&self) -> f32 {
        self.sample_rate * MAX_CUTOFF_RATIO
    }

    /// `alpha0` couples resonance and cutoff; refresh after either changes.
    fn update_alpha0(&mut self) {
        self.alpha0 = 1.0 / (1.0 + self.k * self.gamma);
    }
}

impl LadderFilter for Oberheim {
    fn new(sample_rate: f32) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        let response = OberheimResponse::default();
        let mut filter = Self {
            sample_rate,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            resonance: DEFAULT_RESONANCE,
            drive: 1.0,
            response,
            k: 0.0,
            gamma: 0.0,
            alpha0: 1.0,
            mix: response.coefficients(),
            stages: [OnePole::new(); 4],
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

        // Prewarped bilinear integrator gain: g = tan(wd * T / 2)
        let g = (PI * f64::from(self.cutoff_hz) / f64::from(self.sample_rate)).tan();
        let big_g = g / (1.0 + g);

        for stage in self.stages.iter_mut() {
            stage.alpha = big_g;
        }
        self.stages[0].beta = big_g * big_g * big_g / (1.0 + g);
        self.stages[1].beta = big_g * big_g / (1.0 + g);
        self.stages[2].beta = big_g / (1.0 + g);
        self.stages[3].beta = 1.0 / (1.0 + g);

        self.gamma = big_g * big_g * big_g * big_g;
        self.update_alpha0();
    }

    fn resonance(&self) -> f32 {
        self.resonance
    }

    fn set_resonance(&mut self, amount: f32) {
        self.resonance = clamp_unit(amount);
        self.k = 4.0 * f64::from(self.resonance);
        self.update_alpha0();
    }

    fn drive(&self) -> Option<f32> {
        Some(self.drive)
    }

    fn set_drive(&mut self, amount: f32) {
        self.drive = clamp_drive(amount);
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let sigma: f64 = self.stages.iter().map(OnePole::feedback_output).sum();

        let x = f64::from(input) * (1.0 + self.k);
        let u = ((x - self.k * sigma) * self.alpha0 * f64::from(self.drive)).tanh();

        let s1 = self.stages[0].tick(u);
        let s2 = self.stages[1].tick(s1);
        let s3 = self.stages[2].tick(s2);
        let s4 = self.stages[3].tick(s3);

        let m = &self.mix;
        (m[0] * u + m[1] * s1 + m[2] * s2 + m[3] * s3 + m[4] * s4) as f32
    }

    fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.z1 = 0.0;
        }
    }
}
