//! # IIR Coefficient Design
//!
//! Turns physical filter parameters (cutoff in Hz, sample rate in Hz,
//! passband gain) into the raw numbers the one-pole filters multiply by.
//!
//! ## Exponential Pole Placement
//!
//! Every design here starts from the same pole position:
//!
//! ```text
//! x = e^(-2π * Fc / Fs)
//! ```
//!
//! This is the impulse-invariant mapping of an analog RC pole at `Fc`
//! into the z-plane. `x` sits between 0 and 1: a low cutoff pushes it
//! toward 1 (long memory), a high cutoff toward 0 (short memory).
//!
//! From that pole we build two sections:
//!
//! ```text
//! lowpass:    y[n] = a0*x[n]               + b1*y[n-1]     a0 = G*(1-x), b1 = x
//! highboost:  y[n] = a0*x[n] + a1*x[n-1]   + b1*y[n-1]     a0 = 1-G*(1-x), a1 = -x, b1 = x
//! ```
//!
//! The lowpass passes DC at gain `G`. The highboost is the complement:
//! DC comes through at `1 - G`, high frequencies at full level.
//!
//! Both designers substitute [`DEFAULT_SAMPLE_RATE`] for a sample rate
//! outside the supported range, the same way [`sanitize_sample_rate`]
//! does for integer rates.
//!
//! Designing coefficients never touches a filter's registers. Callers
//! that need a clean start have to clear the filter themselves.

use std::f64::consts::PI;

/// Lowest sample rate the crossfeed designer accepts.
pub const MIN_SAMPLE_RATE: u32 = 2000;

/// Highest sample rate the crossfeed designer accepts.
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Substituted for any sample rate outside `[MIN_SAMPLE_RATE, MAX_SAMPLE_RATE]`.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Levels at or below this many dB are treated as silence by [`db_to_gain`].
pub const SILENCE_DB: f32 = -90.0;

/// Replace an unsupported sample rate with [`DEFAULT_SAMPLE_RATE`].
///
/// Out-of-range rates are not an error: the designer keeps working with
/// the default rate instead.
pub fn sanitize_sample_rate(sample_rate: u32) -> u32 {
    if (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
        sample_rate
    } else {
        DEFAULT_SAMPLE_RATE
    }
}

/// [`sanitize_sample_rate`] for the designers' floating-point rates. NaN
/// falls back to the default too.
fn design_rate(sample_rate: f64) -> f64 {
    let supported = f64::from(MIN_SAMPLE_RATE)..=f64::from(MAX_SAMPLE_RATE);
    if supported.contains(&sample_rate) {
        sample_rate
    } else {
        f64::from(DEFAULT_SAMPLE_RATE)
    }
}

/// The shared pole position `e^(-2π·Fc/Fs)`.
fn pole(cutoff_hz: f64, sample_rate: f64) -> f64 {
    (-2.0 * PI * cutoff_hz / design_rate(sample_rate)).exp()
}

/// Coefficients of a one-pole lowpass: `y[n] = a0·x[n] + b1·y[n−1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnePoleLowpassCoefs {
    pub a0: f64,
    pub b1: f64,
}

impl OnePoleLowpassCoefs {
    /// Design a lowpass with cutoff `cutoff_hz` and DC gain `gain`.
    pub fn design(cutoff_hz: f64, sample_rate: f64, gain: f64) -> Self {
        let x = pole(cutoff_hz, sample_rate);
        Self {
            a0: gain * (1.0 - x),
            b1: x,
        }
    }
}

/// Coefficients of a one-pole high-boost shelf:
/// `y[n] = a0·x[n] + a1·x[n−1] + b1·y[n−1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnePoleHighboostCoefs {
    pub a0: f64,
    pub a1: f64,
    pub b1: f64,
}

impl OnePoleHighboostCoefs {
    /// Design a shelf whose DC gain is `1 - gain` and whose Nyquist gain
    /// approaches 1.
    pub fn design(cutoff_hz: f64, sample_rate: f64, gain: f64) -> Self {
        let x = pole(cutoff_hz, sample_rate);
        Self {
            a0: 1.0 - gain * (1.0 - x),
            a1: -x,
            b1: x,
        }
    }
}

/// Convert decibels to linear gain: `10^(dB/20)`.
///
/// Anything at or below [`SILENCE_DB`] (including `-∞`) maps to exactly
/// `0.0`, so a fully closed level control contributes nothing at all.
pub fn db_to_gain(db: f32) -> f32 {
    if db > SILENCE_DB {
        10.0_f32.powf(db * 0.05)
    } else {
        0.0
    }
}

/// Flush values too small to matter to zero.
///
/// Feedback loops decaying toward silence otherwise wander into the
/// subnormal range, where many CPUs slow down dramatically.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 {
        0.0
    } else {
        x
    }
}
