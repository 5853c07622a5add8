//! # Modulation Sources
//!
//! The chorus/flanger sweeps its delay tap with one of two control signals:
//!
//! - **Sine**: a phase accumulator walking through a shared cosine table.
//!   Smooth, periodic, the classic chorus wobble.
//! - **Fractal**: a 1024-point midpoint-displacement curve streamed one
//!   breakpoint every 20 ms and linearly interpolated in between. Wanders
//!   like a tape machine with a bad motor. The "roughness" control sets how
//!   jagged the curve is.
//!
//! Both produce values in a fixed range and leave the mapping to delay
//! samples to the caller.

use std::f32::consts::PI;

use nih_plug::nih_debug_assert;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{zeroed_buffer, DspError};

/// Entries in one period of [`COS_TABLE`].
pub const COS_TABLE_SIZE: usize = 1024;

/// LFO rate in Hz at a common-mode intensity of 1 in sine mode.
pub const MAX_SINE_FREQ: f32 = 2.0;

/// Points per fractal regeneration. Must be a power of two.
pub const NOISE_LEN: usize = 1024;

/// Fractal breakpoints per second.
const BREAKPOINTS_PER_SECOND: f32 = 50.0;

/// Hurst exponent at zero roughness. The exponent used is this minus the
/// roughness, so roughness 1 gives the most jagged curve.
const HURST_OFFSET: f32 = 1.3;

/// One period of `cos`, sampled at [`COS_TABLE_SIZE`] points.
///
/// Built on first use and shared read-only by every instance.
pub static COS_TABLE: Lazy<[f32; COS_TABLE_SIZE]> = Lazy::new(|| {
    std::array::from_fn(|i| (i as f32 * 2.0 * PI / COS_TABLE_SIZE as f32).cos())
});

/// Wrap a table phase into `[0, COS_TABLE_SIZE)`.
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(COS_TABLE_SIZE as f32);
    // rem_euclid can round up to exactly the modulus for tiny negative inputs.
    if wrapped >= COS_TABLE_SIZE as f32 {
        0.0
    } else {
        wrapped
    }
}

/// Nearest-lower table lookup mapped to `[0, 1]`.
#[inline]
fn unipolar_cos(phase: f32) -> f32 {
    let index = (phase as usize).min(COS_TABLE_SIZE - 1);
    0.5 + 0.5 * COS_TABLE[index]
}

/// Stereo sine LFO driven by common-mode and differential-mode intensity.
#[derive(Debug, Clone, Default)]
pub struct SineModulator {
    /// Left-channel phase in table units, always in `[0, COS_TABLE_SIZE)`.
    phase: f32,
}

impl SineModulator {
    pub fn new() -> Self {
        Lazy::force(&COS_TABLE);
        Self::default()
    }

    /// Advance one sample and return the `(left, right)` modulation, each in
    /// `[0, depth]`.
    ///
    /// `common_mode` (0..=1) sets the rate, up to [`MAX_SINE_FREQ`] Hz.
    /// `differential_mode` (0..=1) offsets the right channel by up to half
    /// a period, so 1 puts the channels in antiphase.
    #[inline]
    pub fn next(
        &mut self,
        common_mode: f32,
        differential_mode: f32,
        depth: f32,
        sample_rate: f32,
    ) -> (f32, f32) {
        let increment = MAX_SINE_FREQ * common_mode / sample_rate * COS_TABLE_SIZE as f32;
        self.phase = wrap_phase(self.phase + increment);

        let offset = differential_mode * COS_TABLE_SIZE as f32 / 2.0;
        let right_phase = wrap_phase(self.phase + offset);

        (
            depth * unipolar_cos(self.phase),
            depth * unipolar_cos(right_phase),
        )
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Fill `buffer` with a midpoint-displacement fractal.
///
/// `buffer.len()` must be a power of two. The curve starts at `v[0] = 0`
/// and wraps around, so `v[0]` is also the right neighbour of the last
/// segment. At each level every midpoint becomes the mean of its two
/// neighbours plus `r · U(-1, 1)`, clamped to `[-1, 1]`; `r` starts at 1
/// and is divided by `2^h` after each level.
///
/// Higher `h` shrinks the fine-scale displacements faster, giving a
/// smoother curve.
pub fn fractal<R: Rng>(buffer: &mut [f32], h: f32, rng: &mut R) {
    let n = buffer.len();
    nih_debug_assert!(n.is_power_of_two(), "fractal length {} is not a power of two", n);
    if n == 0 {
        return;
    }

    let attenuation = 2.0_f32.powf(h);
    let mut r = 1.0_f32;
    let mut span = n;

    buffer[0] = 0.0;
    while span > 1 {
        let half = span / 2;
        for segment in 0..n / span {
            let start = segment * span;
            let end = (start + span) % n;
            let mean = (buffer[start] + buffer[end]) / 2.0;
            let displaced = mean + r * rng.random_range(-1.0_f32..=1.0);
            buffer[start + half] = displaced.clamp(-1.0, 1.0);
        }
        span = half;
        r /= attenuation;
    }
}

/// Streams a fractal curve, one breakpoint every `sample_rate / 50`
/// samples, with a linear ramp between breakpoints.
///
/// Output stays within `[-1, 1]` up to rounding.
#[derive(Debug, Clone)]
pub struct FractalModulator {
    points: Vec<f32>,
    /// Index of the next breakpoint to ramp towards.
    cursor: usize,

    /// Samples per breakpoint.
    stretch: u32,
    /// Samples spent on the current ramp.
    elapsed: u32,

    current: f32,
    target: f32,
    step: f32,

    /// Roughness the curve was last generated with. `None` forces a
    /// regeneration on the next [`prepare`](Self::prepare).
    roughness: Option<f32>,
    rng: StdRng,
}

impl FractalModulator {
    /// A modulator seeded from the thread-local generator.
    pub fn new(sample_rate: f32) -> Result<Self, DspError> {
        Self::with_rng(sample_rate, StdRng::from_rng(&mut rand::rng()))
    }

    /// A modulator whose curves are fully determined by `seed`.
    pub fn with_seed(sample_rate: f32, seed: u64) -> Result<Self, DspError> {
        Self::with_rng(sample_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(sample_rate: f32, rng: StdRng) -> Result<Self, DspError> {
        let stretch = ((sample_rate / BREAKPOINTS_PER_SECOND) as u32).max(1);
        Ok(Self {
            points: zeroed_buffer("fractal noise", NOISE_LEN)?,
            cursor: 0,
            stretch,
            elapsed: stretch,
            current: 0.0,
            target: 0.0,
            step: 0.0,
            roughness: None,
            rng,
        })
    }

    /// Samples spent ramping between two breakpoints.
    pub fn stretch(&self) -> u32 {
        self.stretch
    }

    /// Call once per block with the current roughness (0..=1). A changed
    /// value regenerates the curve and restarts the stream at its first
    /// point, ramping there from the last breakpoint reached.
    pub fn prepare(&mut self, roughness: f32) {
        if self.roughness == Some(roughness) {
            return;
        }

        self.roughness = Some(roughness);
        self.current = self.target;
        self.cursor = 0;
        self.regenerate();
        self.next_breakpoint();
    }

    /// Advance one sample.
    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.elapsed < self.stretch {
            self.current += self.step;
            self.elapsed += 1;
        } else {
            self.current = self.target;
            if self.cursor == 0 {
                self.regenerate();
            }
            self.next_breakpoint();
        }
        self.current
    }

    fn next_breakpoint(&mut self) {
        let previous = self.target;
        self.target = self.points[self.cursor];
        self.cursor = (self.cursor + 1) % self.points.len();
        self.step = (self.target - previous) / self.stretch as f32;
        self.elapsed = 0;
    }

    fn regenerate(&mut self) {
        let hurst = HURST_OFFSET - self.roughness.unwrap_or(0.0);
        fractal(&mut self.points, hurst, &mut self.rng);
    }

    /// Return to silence. The next [`prepare`](Self::prepare) regenerates.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.elapsed = self.stretch;
        self.current = 0.0;
        self.target = 0.0;
        self.step = 0.0;
        self.roughness = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cos_table_shape() {
        assert!((COS_TABLE[0] - 1.0).abs() < 1e-6);
        assert!(COS_TABLE[256].abs() < 1e-6);
        assert!((COS_TABLE[512] + 1.0).abs() < 1e-6);
        assert!(COS_TABLE[768].abs() < 1e-5);
    }

    /// Rate zero freezes the phase at the table start: left at full depth,
    /// right half a period away at zero.
    #[test]
    fn test_sine_differential_offset() {
        let mut lfo = SineModulator::new();
        let (left, right) = lfo.next(0.0, 1.0, 10.0, 44100.0);
        assert!((left - 10.0).abs() < 1e-5, "left = {left}");
        assert!(right.abs() < 1e-5, "right = {right}");

        let (left, right) = lfo.next(0.0, 0.0, 10.0, 44100.0);
        assert_eq!(left, right, "No offset means identical channels");
    }

    /// At 1024 Hz sample rate and full intensity the phase moves 2 table
    /// entries per sample, completing a period every 512 samples.
    #[test]
    fn test_sine_rate_and_wrap() {
        let mut lfo = SineModulator::new();
        lfo.next(1.0, 0.0, 1.0, 1024.0);
        assert!((lfo.phase() - 2.0).abs() < 1e-4);

        for _ in 1..512 {
            let (left, right) = lfo.next(1.0, 0.3, 1.0, 1024.0);
            assert!((0.0..=1.0).contains(&left));
            assert!((0.0..=1.0).contains(&right));
            assert!(lfo.phase() < COS_TABLE_SIZE as f32);
        }
        assert!(lfo.phase() < 1e-2, "phase should have wrapped, got {}", lfo.phase());
    }

    #[test]
    fn test_fractal_basic_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut v = vec![0.5_f32; NOISE_LEN];
        fractal(&mut v, 0.8, &mut rng);

        assert_eq!(v[0], 0.0);
        assert!(v.iter().all(|x| (-1.0..=1.0).contains(x)));
        assert!(v.iter().any(|&x| x != 0.0), "Curve should not be flat");
    }

    #[test]
    fn test_fractal_is_deterministic_for_a_seed() {
        let mut a = vec![0.0_f32; NOISE_LEN];
        let mut b = vec![0.0_f32; NOISE_LEN];
        fractal(&mut a, 0.6, &mut StdRng::seed_from_u64(1234));
        fractal(&mut b, 0.6, &mut StdRng::seed_from_u64(1234));
        assert_eq!(a, b);
    }

    /// Sum of squared first differences, a crude high-frequency measure.
    fn roughness(v: &[f32]) -> f32 {
        v.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum()
    }

    #[test]
    fn test_higher_hurst_is_smoother() {
        let mut smooth_total = 0.0;
        let mut rough_total = 0.0;
        for seed in 0..8 {
            let mut smooth = vec![0.0_f32; NOISE_LEN];
            let mut rough = vec![0.0_f32; NOISE_LEN];
            fractal(&mut smooth, 1.0, &mut StdRng::seed_from_u64(seed));
            fractal(&mut rough, 0.3, &mut StdRng::seed_from_u64(seed));
            smooth_total += roughness(&smooth);
            rough_total += roughness(&rough);
        }
        assert!(
            smooth_total < rough_total,
            "H=1.0 energy {smooth_total} should be below H=0.3 energy {rough_total}"
        );
    }

    #[test]
    fn test_modulator_streams_are_reproducible() {
        let mut a = FractalModulator::with_seed(48000.0, 99).unwrap();
        let mut b = FractalModulator::with_seed(48000.0, 99).unwrap();
        a.prepare(0.5);
        b.prepare(0.5);
        for _ in 0..5000 {
            assert_eq!(a.next(), b.next());
        }
    }

    /// Between breakpoints the output moves by a constant step.
    #[test]
    fn test_modulator_ramps_linearly() {
        let mut m = FractalModulator::with_seed(5000.0, 3).unwrap();
        assert_eq!(m.stretch(), 100);
        m.prepare(0.2);

        // The first ramp heads for v[0] = 0 from silence, so skip to the second.
        for _ in 0..=m.stretch() {
            m.next();
        }
        let first = m.next();
        let second = m.next();
        let step = second - first;
        let mut previous = second;
        for _ in 0..50 {
            let value = m.next();
            assert!((value - previous - step).abs() < 1e-5);
            previous = value;
        }
    }

    #[test]
    fn test_modulator_stays_in_range() {
        let mut m = FractalModulator::with_seed(44100.0, 11).unwrap();
        for block in 0..20 {
            m.prepare(block as f32 / 19.0);
            for _ in 0..5000 {
                let y = m.next();
                assert!(y.is_finite() && y.abs() <= 1.0 + 1e-3, "y = {y}");
            }
        }
    }

    /// Running off the end of the curve generates a fresh one and keeps
    /// ramping without a jump.
    #[test]
    fn test_modulator_regenerates_after_last_breakpoint() {
        let mut m = FractalModulator::with_seed(2000.0, 21).unwrap();
        assert_eq!(m.stretch(), 40);
        m.prepare(0.5);
        let first = m.points.clone();

        // Each breakpoint takes `stretch` ramp samples plus the one that
        // lands on it.
        let segment = m.stretch() as usize + 1;
        let max_step = 2.0 / m.stretch() as f32 + 1e-4;
        let mut out = Vec::with_capacity((NOISE_LEN + 4) * segment);
        let mut previous = 0.0_f32;
        for _ in 0..(NOISE_LEN + 4) * segment {
            let y = m.next();
            assert!(y.is_finite() && y.abs() <= 1.0 + 1e-3, "y = {y}");
            assert!((y - previous).abs() <= max_step, "jump {previous} -> {y}");
            previous = y;
            out.push(y);
        }

        assert_ne!(m.points[1..4], first[1..4]);
        for k in 1..4 {
            assert_eq!(out[k * segment + segment - 1], first[k]);
            assert_eq!(out[(NOISE_LEN + k) * segment + segment - 1], m.points[k]);
        }
    }

    /// Same roughness twice does not restart the stream.
    #[test]
    fn test_prepare_only_reacts_to_changes() {
        let mut a = FractalModulator::with_seed(44100.0, 5).unwrap();
        let mut b = FractalModulator::with_seed(44100.0, 5).unwrap();
        a.prepare(0.4);
        b.prepare(0.4);
        for _ in 0..300 {
            a.next();
            b.next();
        }
        a.prepare(0.4);
        for _ in 0..300 {
            assert_eq!(a.next(), b.next());
        }
    }
}
