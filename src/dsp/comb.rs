//! # Comb and Allpass Filters
//!
//! The two feedback structures the reverb is built from. Both wrap a
//! [`RingBuffer`] and feed their own previous output back into it.
//!
//! ## Comb
//!
//! ```text
//! w[n] = g * x[n] + tone(g * y[n-1])
//! y[n] = w[n - L]
//! ```
//!
//! An impulse comes back after `L` samples, and again and again, each
//! time scaled by `g` and darkened by the tone filter (a peaking cut around
//! 10 kHz standing in for air and wall absorption). Many combs with
//! unrelated lengths in parallel build up the dense tail of a room.
//!
//! ## Allpass
//!
//! ```text
//! w[n] = in_gain * x[n] + g * y[n-1]
//! y[n] = w[n - L]
//! ```
//!
//! Run in series after the combs to smear discrete echoes into diffuse
//! reflections.
//!
//! ## Decay-Derived Gains
//!
//! The user sets a decay time, not a gain. A loop has to lose 60 dB (a
//! factor of 0.001) within `decay` milliseconds, so each pass applies
//! `0.001^(pass_time / decay)`. The formulas in [`comb_feedback_gain`] and
//! [`allpass_gains`] carry the reverb preset's weighting on top of that.
//!
//! ## Active Length
//!
//! Buffers are allocated at the longest delay a preset may use. The
//! loop length `L` is a separate value no larger than the capacity, so
//! presets and stereo enhancement can change it without reallocating.

use super::biquad::Biquad;
use super::coefficients::flush_denormal;
use super::delay_line::RingBuffer;

/// Weight of a comb's frequency response in its feedback gain.
pub const FREQ_RESP_COMPENSATION: f32 = 0.75;

/// Smallest gain handed out, so gains stay positive when the formula underflows.
const MIN_GAIN: f64 = f32::MIN_POSITIVE as f64;

/// Largest gain handed out, so every loop is strictly decaying.
const MAX_GAIN: f64 = 1.0 - f32::EPSILON as f64;

/// `0.001^exponent`, clamped into the open interval (0, 1).
fn decay_gain(exponent: f64) -> f32 {
    let gain = 0.001_f64.powf(exponent);
    if gain.is_nan() {
        return MIN_GAIN as f32;
    }
    gain.clamp(MIN_GAIN, MAX_GAIN) as f32
}

/// Feedback gain for a comb of `length` samples.
///
/// ```text
/// g = 0.001 ^ (100000 * (length / fs) * (1 + 0.75 * freq_resp) / feedback / decay_ms)
/// ```
///
/// `feedback` is the preset's weighting for this comb (larger = longer
/// ring), `freq_resp` its high-frequency absorption in `[0, 1]`. Darker
/// combs already lose more per pass through their tone filter, and the
/// compensation term shortens them further so dark presets stay tight.
///
/// The result always lies strictly between 0 and 1.
pub fn comb_feedback_gain(
    length: usize,
    sample_rate: f32,
    freq_resp: f32,
    feedback: f32,
    decay_ms: f32,
) -> f32 {
    let pass_seconds = length as f64 / f64::from(sample_rate);
    let exponent = 100_000.0
        * pass_seconds
        * (1.0 + f64::from(FREQ_RESP_COMPENSATION) * f64::from(freq_resp))
        / f64::from(feedback)
        / f64::from(decay_ms);
    decay_gain(exponent)
}

/// `(fb_gain, in_gain)` for an allpass with preset weighting `feedback`.
///
/// ```text
/// fb_gain = 0.001 ^ (10000 / decay_ms / feedback)
/// in_gain = -10 / feedback
/// ```
pub fn allpass_gains(feedback: f32, decay_ms: f32) -> (f32, f32) {
    let exponent = 10_000.0 / f64::from(decay_ms) / f64::from(feedback);
    (decay_gain(exponent), -10.0 / feedback)
}

/// A feedback comb filter with a tone-shaping filter in its loop.
#[derive(Debug, Clone)]
pub struct CombFilter {
    buffer: RingBuffer,
    length: usize,
    fb_gain: f32,
    tone: Biquad,
    last_out: f32,
}

impl CombFilter {
    /// A comb delaying up to the capacity of `buffer`. The loop starts at
    /// full length with zero gain.
    pub fn new(buffer: RingBuffer) -> Self {
        Self {
            length: buffer.capacity(),
            buffer,
            fb_gain: 0.0,
            tone: Biquad::new(),
            last_out: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Set the loop length in samples, clamped to `[1, capacity]`.
    pub fn set_length(&mut self, length: usize) {
        self.length = length.clamp(1, self.buffer.capacity());
    }

    pub fn fb_gain(&self) -> f32 {
        self.fb_gain
    }

    pub fn set_fb_gain(&mut self, fb_gain: f32) {
        self.fb_gain = fb_gain;
    }

    /// Tune the absorption filter: a peaking cut of `gain_db` around
    /// `center_hz`.
    pub fn set_tone(&mut self, center_hz: f32, gain_db: f32, bw_octaves: f32, sample_rate: f32) {
        self.tone
            .set_peaking_eq(center_hz, gain_db, bw_octaves, sample_rate);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        // A near-zero gain would otherwise park subnormals in the buffer.
        let fed = flush_denormal(
            self.fb_gain * input + self.tone.run(self.fb_gain * self.last_out),
        );
        let output = self.buffer.read_delayed(self.length - 1);
        self.buffer.push(fed);
        self.last_out = output;
        output
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.tone.clear();
        self.last_out = 0.0;
    }
}

/// A feedback allpass-style diffuser.
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    buffer: RingBuffer,
    length: usize,
    in_gain: f32,
    fb_gain: f32,
    last_out: f32,
}

impl AllpassFilter {
    /// An allpass delaying up to the capacity of `buffer`.
    pub fn new(buffer: RingBuffer) -> Self {
        Self {
            length: buffer.capacity(),
            buffer,
            in_gain: 0.0,
            fb_gain: 0.0,
            last_out: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Set the loop length in samples, clamped to `[1, capacity]`.
    pub fn set_length(&mut self, length: usize) {
        self.length = length.clamp(1, self.buffer.capacity());
    }

    pub fn set_gains(&mut self, fb_gain: f32, in_gain: f32) {
        self.fb_gain = fb_gain;
        self.in_gain = in_gain;
    }

    pub fn fb_gain(&self) -> f32 {
        self.fb_gain
    }

    pub fn in_gain(&self) -> f32 {
        self.in_gain
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let fed = flush_denormal(self.in_gain * input + self.fb_gain * self.last_out);
        let output = self.buffer.read_delayed(self.length - 1);
        self.buffer.push(fed);
        self.last_out = output;
        output
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_out = 0.0;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
