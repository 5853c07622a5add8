//! # Chorus / Flanger
//!
//! ```text
//!  x ──┬──► [depth buffer] ──tap at mod(t)──► [delay buffer] ──► highpass ──► × wet ──(+)──► out
//!      │                                                                              ▲
//!      └──────────────────────────────────────────────────────────────────── × dry ───┘
//! ```
//!
//! A short buffer holds the last couple of milliseconds of input. The
//! modulator sweeps a read tap across it, and the interpolated read bends
//! the pitch up and down as the tap speeds up or slows down. A second,
//! fixed delay sets the overall offset: a few milliseconds for flanging,
//! tens of milliseconds for chorus. The contour highpass thins the wet
//! signal so low end stays solid.
//!
//! In sine mode both channels follow a cosine LFO, the right one phase
//! shifted by the differential-mode control. In fractal mode the left tap
//! follows a random midpoint-displacement curve and the right tap follows
//! the same curve up to 100 ms later.

use crate::dsp::biquad::Biquad;
use crate::dsp::coefficients::{db_to_gain, SILENCE_DB};
use crate::dsp::delay_line::RingBuffer;
use crate::dsp::modulation::{FractalModulator, SineModulator};
use crate::error::DspError;

/// Longest modulation sweep at 44.1 kHz and 100 % depth, in samples. Scales
/// with the sample rate.
const MAX_DEPTH_SAMPLES_44K: f32 = 100.0;

/// [`MAX_DEPTH_SAMPLES_44K`] as a duration.
const MAX_DEPTH_MS: f32 = MAX_DEPTH_SAMPLES_44K * 1000.0 / 44100.0;

/// Longest fixed delay, ms.
pub const MAX_DELAY_MS: f32 = 100.0;

/// Shortest fixed delay actually used, ms.
pub const MIN_DELAY_MS: f32 = 1.0;

/// Longest right-channel lag in fractal mode, as a fraction of a second.
const MAX_DIFFERENTIAL_SECONDS: f32 = 0.1;

/// Smallest differential-mode value used in fractal mode.
const MIN_DIFFERENTIAL: f32 = 0.01;

/// Bandwidth of the contour highpass, octaves.
const CONTOUR_BANDWIDTH: f32 = 1.0;

pub const MIN_CONTOUR_HZ: f32 = 20.0;
pub const MAX_CONTOUR_HZ: f32 = 20_000.0;
pub const MAX_LEVEL_DB: f32 = 20.0;

/// Control values for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusSettings {
    /// Use the fractal modulator instead of the sine LFO.
    pub fractal_mode: bool,
    /// LFO rate (sine) or roughness (fractal), 0..=1.
    pub common_mode: f32,
    /// Right-channel phase offset (sine) or lag (fractal), 0..=1.
    pub differential_mode: f32,
    /// Sweep width, 0..=100 %.
    pub depth_percent: f32,
    /// Fixed delay after the sweep, 0..=100 ms.
    pub delay_ms: f32,
    /// Corner of the wet-path highpass, Hz.
    pub contour_hz: f32,
    pub dry_db: f32,
    pub wet_db: f32,
}

impl Default for ChorusSettings {
    fn default() -> Self {
        Self {
            fractal_mode: false,
            common_mode: 0.5,
            differential_mode: 0.5,
            depth_percent: 75.0,
            delay_ms: 25.0,
            contour_hz: 100.0,
            dry_db: 0.0,
            wet_db: 0.0,
        }
    }
}

impl ChorusSettings {
    pub fn clamped(&self) -> Self {
        Self {
            fractal_mode: self.fractal_mode,
            common_mode: self.common_mode.clamp(0.0, 1.0),
            differential_mode: self.differential_mode.clamp(0.0, 1.0),
            depth_percent: self.depth_percent.clamp(0.0, 100.0),
            delay_ms: self.delay_ms.clamp(0.0, MAX_DELAY_MS),
            contour_hz: self.contour_hz.clamp(MIN_CONTOUR_HZ, MAX_CONTOUR_HZ),
            dry_db: self.dry_db.clamp(SILENCE_DB, MAX_LEVEL_DB),
            wet_db: self.wet_db.clamp(SILENCE_DB, MAX_LEVEL_DB),
        }
    }
}

/// A stereo chorus/flanger.
#[derive(Debug, Clone)]
pub struct Chorus {
    sample_rate: f32,

    depth: [RingBuffer; 2],
    delay: [RingBuffer; 2],
    /// Left-channel modulation history, read back for the right channel in
    /// fractal mode.
    differential: RingBuffer,
    contour: [Biquad; 2],

    sine: SineModulator,
    fractal: FractalModulator,
}

impl Chorus {
    /// Allocate a chorus for `sample_rate` with an entropy-seeded fractal
    /// modulator.
    pub fn new(sample_rate: f32) -> Result<Self, DspError> {
        Self::with_modulator(sample_rate, FractalModulator::new(sample_rate)?)
    }

    /// Like [`new`](Self::new), with reproducible fractal curves.
    pub fn with_seed(sample_rate: f32, seed: u64) -> Result<Self, DspError> {
        Self::with_modulator(sample_rate, FractalModulator::with_seed(sample_rate, seed)?)
    }

    fn with_modulator(sample_rate: f32, fractal: FractalModulator) -> Result<Self, DspError> {
        let sr = sample_rate;
        let differential_ms = MAX_DIFFERENTIAL_SECONDS * 1000.0;

        // The sweep reads one sample past its tap, and a tap may sit
        // exactly at the full length.
        Ok(Self {
            sample_rate,
            depth: [
                RingBuffer::for_duration_with_headroom(MAX_DEPTH_MS, sr, 2)?,
                RingBuffer::for_duration_with_headroom(MAX_DEPTH_MS, sr, 2)?,
            ],
            delay: [
                RingBuffer::for_duration_with_headroom(MAX_DELAY_MS, sr, 1)?,
                RingBuffer::for_duration_with_headroom(MAX_DELAY_MS, sr, 1)?,
            ],
            differential: RingBuffer::for_duration_with_headroom(differential_ms, sr, 1)?,
            contour: [Biquad::new(), Biquad::new()],
            sine: SineModulator::new(),
            fractal,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Process a stereo block in place.
    pub fn process(&mut self, settings: &ChorusSettings, left: &mut [f32], right: &mut [f32]) {
        let s = settings.clamped();
        let sr = self.sample_rate;

        let depth = MAX_DEPTH_SAMPLES_44K * sr / 44100.0 * s.depth_percent / 100.0;
        let delay_offset = ((s.delay_ms.max(MIN_DELAY_MS) * sr / 1000.0) as usize)
            .min(self.delay[0].capacity() - 1);
        let differential_offset = ((s.differential_mode.max(MIN_DIFFERENTIAL)
            * MAX_DIFFERENTIAL_SECONDS
            * sr) as usize)
            .min(self.differential.capacity() - 1);
        let dry = db_to_gain(s.dry_db);
        let wet = db_to_gain(s.wet_db);

        for filter in &mut self.contour {
            filter.set_highpass(s.contour_hz, CONTOUR_BANDWIDTH, sr);
        }
        if s.fractal_mode {
            self.fractal.prepare(s.common_mode);
        }

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let input = [*l, *r];
            self.depth[0].push(input[0]);
            self.depth[1].push(input[1]);

            let taps = if s.fractal_mode {
                let tap_l = depth * (0.5 + 0.5 * self.fractal.next());
                self.differential.push(tap_l);
                [tap_l, self.differential.read_delayed(differential_offset)]
            } else {
                let (tap_l, tap_r) =
                    self.sine.next(s.common_mode, s.differential_mode, depth, sr);
                [tap_l, tap_r]
            };

            let mut out = [0.0; 2];
            for ch in 0..2 {
                let swept = self.depth[ch].read_interpolated(taps[ch]);
                self.delay[ch].push(swept);
                let delayed = self.delay[ch].read_delayed(delay_offset);
                let filtered = self.contour[ch].run(delayed);
                out[ch] = dry * input[ch] + wet * filtered;
            }

            *l = out[0];
            *r = out[1];
        }
    }

    /// The longest a sample can stay audible in the wet path: the full
    /// sweep plus the full fixed delay.
    pub fn tail_samples(&self) -> u32 {
        (self.depth[0].capacity() + self.delay[0].capacity()) as u32
    }

    /// Silence all buffers and filters and restart both modulators.
    pub fn clear(&mut self) {
        for buffer in self.depth.iter_mut().chain(self.delay.iter_mut()) {
            buffer.clear();
        }
        self.differential.clear();
        for filter in &mut self.contour {
            filter.clear();
        }
        self.sine.reset();
        self.fractal.reset();
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
