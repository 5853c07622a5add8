//! # Biquad Filter
//!
//! A two-pole/two-zero IIR section. One structure covers every response
//! the effects need; only the five coefficients change:
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
//! ```
//!
//! Coefficients follow the RBJ Audio EQ Cookbook, with the bandwidth
//! given in octaves rather than as a Q:
//!
//! ```text
//! w     = 2π * fc / fs
//! alpha = sin(w) * sinh(ln(2)/2 * bw * w / sin(w))
//! ```
//!
//! Recomputing is cheap enough to do once per block when a parameter
//! moved. It is never done per sample.

use std::f32::consts::{LN_2, PI};

use super::coefficients::flush_denormal;

/// Lowest centre/cutoff frequency accepted by the designers.
const MIN_FREQ_HZ: f32 = 1.0;

/// Highest centre/cutoff frequency, as a fraction of the sample rate.
const MAX_FREQ_RATIO: f32 = 0.49;

/// A Direct Form I biquad section with its own history.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared cookbook intermediates: `(cos(w), alpha)`.
fn cookbook_terms(freq_hz: f32, bw_octaves: f32, sample_rate: f32) -> (f32, f32) {
    let freq = freq_hz.clamp(MIN_FREQ_HZ, sample_rate * MAX_FREQ_RATIO);
    let w = 2.0 * PI * freq / sample_rate;
    let (sn, cs) = w.sin_cos();
    let alpha = sn * (LN_2 / 2.0 * bw_octaves * w / sn).sinh();
    (cs, alpha)
}

impl Biquad {
    /// A passthrough section (`y[n] = x[n]`) with silent history.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Store coefficients after normalizing by `a0`.
    fn set_normalized(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Configure as a 12 dB/octave lowpass.
    pub fn set_lowpass(&mut self, cutoff_hz: f32, bw_octaves: f32, sample_rate: f32) {
        let (cs, alpha) = cookbook_terms(cutoff_hz, bw_octaves, sample_rate);
        let b1 = 1.0 - cs;
        self.set_normalized(b1 * 0.5, b1, b1 * 0.5, 1.0 + alpha, -2.0 * cs, 1.0 - alpha);
    }

    /// Configure as a 12 dB/octave highpass.
    pub fn set_highpass(&mut self, cutoff_hz: f32, bw_octaves: f32, sample_rate: f32) {
        let (cs, alpha) = cookbook_terms(cutoff_hz, bw_octaves, sample_rate);
        let b1 = -(1.0 + cs);
        self.set_normalized(-b1 * 0.5, b1, -b1 * 0.5, 1.0 + alpha, -2.0 * cs, 1.0 - alpha);
    }

    /// Configure as a peaking equalizer: `gain_db` of boost (or cut) in a
    /// band `bw_octaves` wide around `center_hz`, unity gain elsewhere.
    pub fn set_peaking_eq(
        &mut self,
        center_hz: f32,
        gain_db: f32,
        bw_octaves: f32,
        sample_rate: f32,
    ) {
        let (cs, alpha) = cookbook_terms(center_hz, bw_octaves, sample_rate);
        let a = 10.0_f32.powf(gain_db / 40.0);
        self.set_normalized(
            1.0 + alpha * a,
            -2.0 * cs,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cs,
            1.0 - alpha / a,
        );
    }

    /// Process one sample.
    #[inline]
    pub fn run(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        let output = flush_denormal(output);

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Zero the input/output history. Coefficients are kept.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// A band limiter built from a lowpass followed by a highpass.
#[derive(Debug, Clone, Default)]
pub struct Bandpass {
    lowpass: Biquad,
    highpass: Biquad,
}

impl Bandpass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass roughly `low_hz..high_hz`: the lowpass sits at `high_hz` and
    /// the highpass at `low_hz`.
    pub fn set_band(&mut self, low_hz: f32, high_hz: f32, bw_octaves: f32, sample_rate: f32) {
        self.lowpass.set_lowpass(high_hz, bw_octaves, sample_rate);
        self.highpass.set_highpass(low_hz, bw_octaves, sample_rate);
    }

    #[inline]
    pub fn run(&mut self, input: f32) -> f32 {
        self.highpass.run(self.lowpass.run(input))
    }

    pub fn clear(&mut self) {
        self.lowpass.clear();
        self.highpass.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
