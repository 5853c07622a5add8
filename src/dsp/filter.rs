//! # One-Pole Filters
//!
//! The two simplest IIR sections, driven by coefficients from
//! [`coefficients`](super::coefficients). The crossfeed splits every
//! channel through one of each: a lowpass for the part that bleeds into
//! the opposite ear, and a high-boost shelf for the part that stays.
//!
//! ## The Filter Equations
//!
//! ```text
//! lowpass:    y[n] = a0 * x[n]                 + b1 * y[n-1]
//! highboost:  y[n] = a0 * x[n] + a1 * x[n-1]   + b1 * y[n-1]
//! ```
//!
//! `y[n-1]` is the filter's memory. That single register is what makes
//! the filter "infinite impulse response": every output depends on every
//! input that came before it, with exponentially fading weight.
//!
//! The highboost section does not remember `x[n-1]` itself. The caller
//! passes it in, because the crossfeed keeps one raw previous sample per
//! channel and shares it between stages.
//!
//! Changing coefficients leaves the registers alone. Only [`clear`] resets
//! them.
//!
//! [`clear`]: OnePoleLowpass::clear

use super::coefficients::{OnePoleHighboostCoefs, OnePoleLowpassCoefs};

/// A one-pole (6 dB/octave) lowpass with adjustable DC gain.
#[derive(Debug, Clone)]
pub struct OnePoleLowpass {
    coefs: OnePoleLowpassCoefs,

    /// The previous output sample, the filter's only state variable.
    prev_output: f64,
}

impl OnePoleLowpass {
    /// Create a filter with the given coefficients and silent history.
    pub fn new(coefs: OnePoleLowpassCoefs) -> Self {
        Self {
            coefs,
            prev_output: 0.0,
        }
    }

    /// Swap in new coefficients. History is kept.
    pub fn set_coefs(&mut self, coefs: OnePoleLowpassCoefs) {
        self.coefs = coefs;
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coefs.a0 * input + self.coefs.b1 * self.prev_output;
        self.prev_output = output;
        output
    }

    /// The most recent output, `y[n-1]` for the next call.
    pub fn last_output(&self) -> f64 {
        self.prev_output
    }

    /// Reset the filter memory to silence.
    pub fn clear(&mut self) {
        self.prev_output = 0.0;
    }

    /// `true` when the memory is exactly zero.
    pub fn is_clear(&self) -> bool {
        self.prev_output == 0.0
    }
}

/// A one-pole high-boost shelf.
#[derive(Debug, Clone)]
pub struct OnePoleHighboost {
    coefs: OnePoleHighboostCoefs,
    prev_output: f64,
}

impl OnePoleHighboost {
    /// Create a filter with the given coefficients and silent history.
    pub fn new(coefs: OnePoleHighboostCoefs) -> Self {
        Self {
            coefs,
            prev_output: 0.0,
        }
    }

    /// Swap in new coefficients. History is kept.
    pub fn set_coefs(&mut self, coefs: OnePoleHighboostCoefs) {
        self.coefs = coefs;
    }

    /// Process one sample, given the raw input that preceded it.
    #[inline]
    pub fn process(&mut self, input: f64, prev_input: f64) -> f64 {
        let output =
            self.coefs.a0 * input + self.coefs.a1 * prev_input + self.coefs.b1 * self.prev_output;
        self.prev_output = output;
        output
    }

    pub fn last_output(&self) -> f64 {
        self.prev_output
    }

    pub fn clear(&mut self) {
        self.prev_output = 0.0;
    }

    pub fn is_clear(&self) -> bool {
        self.prev_output == 0.0
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
