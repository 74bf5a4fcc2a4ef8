//! Ladder Nonlinearities
//!
//! Every transistor in a ladder filter saturates. The digital models below
//! approximate that with a memoryless transfer function applied somewhere in
//! the loop: at the input, after every stage, or only at the output.
//!
//! # Why the shape matters
//!
//! Feedback around four poles is what makes the filter resonate. Near full
//! resonance the loop gain reaches the point where the filter would grow
//! without bound if it were linear. A bounded nonlinearity inside the loop
//! caps that growth, so instead of exploding the filter settles into a
//! steady sine at the cutoff frequency (self-oscillation).
//!
//! # Transfer functions used by the bank
//!
//! Clipper (Stilson):
//!   f(x) = 0.5 * (|x + 0.95| - |x - 0.95|)
//!   - Piecewise linear, hard knee at +/-0.95
//!   - Cheapest possible bound, two `abs` and a subtract
//!
//! Rational tanh (Microtracker):
//!   f(x) = x * (27 + x^2) / (27 + 9x^2),   x limited to +/-3
//!   - Matches tanh to within 0.025 over the limited range
//!   - Limiting the input first keeps the output bounded at +/-1
//!
//! Cubic clip (MusicDSP):
//!   f(y) = y - y^3 / 6,   y limited to +/-sqrt(2)
//!   - Band-limited (only adds the 3rd harmonic)
//!   - Rolls over past sqrt(2), so the input is limited there
//!
//! Scaled cubic (RK simulation):
//!   f(v) = s * (c - c^3 / 3),   c = clamp(v / s, -1, 1)
//!   - `s` sets the ceiling; output stays within +/-2s/3

use std::f64::consts::SQRT_2;

/// Denormal guard threshold.
pub const SNAP_THRESHOLD: f64 = 1.0e-8;

/// Knee of the Stilson clipper.
const CLIP_KNEE: f64 = 0.95;

/// Input range over which the rational tanh is evaluated.
const FAST_TANH_LIMIT: f64 = 3.0;

/// Piecewise-linear saturator used between the Stilson ladder stages.
#[inline]
pub fn moog_saturate(x: f64) -> f64 {
    let x1 = (x + CLIP_KNEE).abs();
    let x2 = (x - CLIP_KNEE).abs();
    0.5 * (x1 - x2)
}

/// Rational tanh approximation, bounded to [-1, 1].
///
/// At the limit (|x| = 3) the rational evaluates to exactly 1, so the clamp
/// does not introduce a discontinuity.
#[inline]
pub fn fast_tanh(x: f64) -> f64 {
    let x = x.clamp(-FAST_TANH_LIMIT, FAST_TANH_LIMIT);
    let x2 = x * x;
    x * (27.0 + x2) / (27.0 + 9.0 * x2)
}

/// Cubic soft clip applied to the last MusicDSP stage.
#[inline]
pub fn cubic_soft_clip(y: f64) -> f64 {
    let y = y.clamp(-SQRT_2, SQRT_2);
    y - (y * y * y) / 6.0
}

/// Scaled cubic limiter used inside the RK derivative evaluation.
///
/// `saturation_inv` is `1.0 / saturation`, passed in so callers can cache it.
#[inline]
pub fn soft_limit(value: f64, saturation: f64, saturation_inv: f64) -> f64 {
    let c = (value * saturation_inv).clamp(-1.0, 1.0);
    saturation * (c - (1.0 / 3.0) * c * c * c)
}

/// Flush values too small to matter to exactly zero.
///
/// Decaying feedback loops otherwise drift into subnormal range, where some
/// CPUs fall off a performance cliff.
#[inline]
pub fn snap_to_zero(x: f64) -> f64 {
    if x > -SNAP_THRESHOLD && x < SNAP_THRESHOLD {
        0.0
    } else {
        x
    }
}
