//! Improved ladder (D'Angelo & Välimäki): companding trapezoidal integrators.
//!
//! Models each transistor pair as an integrator driven by the difference of
//! two `tanh` curves, the large-signal behaviour of a differential pair:
//!
//! ```text
//! dV0/dt = -g * (tanh((drive * x + res * V3) / 2VT) + tanh(V0 / 2VT))
//! dVi/dt =  g * (tanh(V(i-1) / 2VT) - tanh(Vi / 2VT))
//! ```
//!
//! integrated with the trapezoidal rule. `VT` is the thermal voltage; `g`
//! includes a first-order correction for the bilinear frequency warp.
//!
//! The first stage inverts, so the ladder output is negated to keep DC at
//! unity gain with positive sign.

use std::f64::consts::PI;

use super::{
    clamp_cutoff, clamp_drive, clamp_unit, makeup_gain, LadderFilter, DEFAULT_CUTOFF_HZ,
    DEFAULT_RESONANCE,
};

/// Thermal voltage.
const VT: f64 = 0.312;

/// Fraction of `fs / pi` usable as cutoff before the warp correction turns over.
const MAX_CUTOFF_RATIO: f32 = 0.99 / std::f32::consts::PI;

pub struct Improved {
    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,
    drive: f32,

    g: f64,
    res: f64,
    makeup: f64,
    half_period: f64,

    v: [f64; 4],
    dv: [f64; 4],
    tv: [f64; 4],
}

impl Improved {
    fn max_cutoff(&self) -> f32 {
        self.sample_rate * MAX_CUTOFF_RATIO
    }

    #[inline]
    fn integrate(&mut self, stage: usize, derivative: f64) {
        self.v[stage] += (derivative + self.dv[stage]) * self.half_period;
        self.dv[stage] = derivative;
        self.tv[stage] = (self.v[stage] / (2.0 * VT)).tanh();
    }
}

impl LadderFilter for Improved {
    fn new(sample_rate: f32) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        let mut filter = Self {
            sample_rate,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            resonance: DEFAULT_RESONANCE,
            drive: 1.0,
            g: 0.0,
            res: 0.0,
            makeup: 1.0,
            half_period: 0.0,
            v: [0.0; 4],
            dv: [0.0; 4],
            tv: [0.0; 4],
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

        let fs = f64::from(self.sample_rate);
        let fc = f64::from(self.cutoff_hz);
        let x = PI * fc / fs;
        self.g = 4.0 * PI * VT * fc * (1.0 - x) / (1.0 + x);
        self.half_period = 1.0 / (2.0 * fs);
        self.makeup = makeup_gain(self.cutoff_hz);
    }

    fn resonance(&self) -> f32 {
        self.resonance
    }

    fn set_resonance(&mut self, amount: f32) {
        self.resonance = clamp_unit(amount);
        self.res = 4.0 * f64::from(self.resonance);
    }

    fn drive(&self) -> Option<f32> {
        Some(self.drive)
    }

    fn set_drive(&mut self, amount: f32) {
        self.drive = clamp_drive(amount);
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let g = self.g;
        let x = f64::from(self.drive) * f64::from(input);

        let d0 = -g * (((x + self.res * self.v[3]) / (2.0 * VT)).tanh() + self.tv[0]);
        self.integrate(0, d0);

        for i in 1..4 {
            let d = g * (self.tv[i - 1] - self.tv[i]);
            self.integrate(i, d);
        }

        (-self.v[3] * self.makeup) as f32
    }

    fn reset(&mut self) {
        self.v = [0.0; 4];
        self.dv = [0.0; 4];
        self.tv = [0.0; 4];
    }
}
