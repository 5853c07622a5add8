//! # Headphone Crossfeed (bs2b)
//!
//! On speakers each ear hears both speakers: the far one slightly later
//! and with its highs shadowed by the head. On headphones that bleed is
//! missing and hard-panned material sits uncomfortably inside the skull.
//! The Bauer stereophonic-to-binaural (bs2b) filter puts a little of it
//! back.
//!
//! ## Signal Flow
//!
//! ```text
//!   L ──┬── highboost ──────────(+)── gain ── clip ──► L'
//!       └── lowpass ───┐       ╱
//!                       ╲     ╱
//!                        ╲   ╱
//!                         ╲ ╱
//!                          ╳
//!                         ╱ ╲
//!   R ──┬── lowpass ─────╯   ╲
//!       └── highboost ────────(+)── gain ── clip ──► R'
//! ```
//!
//! Each channel keeps its highs (the highboost shelf dips the lows the
//! other side is about to add) and sends its lows, filtered and attenuated,
//! to the opposite ear. The normalization `gain = 1 / (1 - G_hi + G_lo)`
//! keeps bass from piling up when both paths sum.
//!
//! ## Levels
//!
//! Six presets combine three crossfeed strengths with a "normal" or
//! "easy" flavour. Easy presets feed less signal across and suit
//! long listening sessions.
//!
//! ## State
//!
//! Each [`Crossfeed`] owns its filters. Two instances never share history,
//! so every stereo path in a host can run its own.

use nih_plug::prelude::*;

use super::sample_format::{i24_to_unit, unit_to_i24, CrossfeedSample};
use crate::dsp::coefficients::{
    sanitize_sample_rate, OnePoleHighboostCoefs, OnePoleLowpassCoefs, DEFAULT_SAMPLE_RATE,
};
use crate::dsp::filter::{OnePoleHighboost, OnePoleLowpass};

/// Bytes in one packed 24-bit stereo frame.
const I24_FRAME_BYTES: usize = 6;

/// The six crossfeed presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossfeedLevel {
    Low,
    Middle,
    High,
    LowEasy,
    MiddleEasy,
    /// Strong but gentle. A good default for most material.
    #[default]
    HighEasy,
}

/// Physical parameters behind one [`CrossfeedLevel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelParameters {
    /// Cutoff of the crossfed lowpass, Hz.
    pub fc_lo: f64,
    /// Cutoff of the direct highboost shelf, Hz.
    pub fc_hi: f64,
    /// DC gain of the crossfed path.
    pub g_lo: f64,
    /// Low-frequency cut of the direct path.
    pub g_hi: f64,
}

impl CrossfeedLevel {
    pub const ALL: [CrossfeedLevel; 6] = [
        CrossfeedLevel::Low,
        CrossfeedLevel::Middle,
        CrossfeedLevel::High,
        CrossfeedLevel::LowEasy,
        CrossfeedLevel::MiddleEasy,
        CrossfeedLevel::HighEasy,
    ];

    /// Look up a level by its 1-based index. Anything outside `1..=6`
    /// falls back to [`HighEasy`](Self::HighEasy).
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => Self::Low,
            2 => Self::Middle,
            3 => Self::High,
            4 => Self::LowEasy,
            5 => Self::MiddleEasy,
            _ => Self::HighEasy,
        }
    }

    /// Combine a 1..=3 strength control with the high-boost switch, which
    /// selects the matching easy level.
    pub fn from_controls(strength: i32, high_boost: bool) -> Self {
        Self::from_index(strength.clamp(1, 3) + if high_boost { 3 } else { 0 })
    }

    /// The 1-based index of this level.
    pub fn index(self) -> i32 {
        match self {
            Self::Low => 1,
            Self::Middle => 2,
            Self::High => 3,
            Self::LowEasy => 4,
            Self::MiddleEasy => 5,
            Self::HighEasy => 6,
        }
    }

    pub fn parameters(self) -> LevelParameters {
        let (fc_lo, fc_hi, g_lo, g_hi) = match self {
            Self::Low => (360.0, 501.0, 0.398107170553497, 0.205671765275719),
            Self::Middle => (500.0, 711.0, 0.459726988530872, 0.228208484414988),
            Self::High => (700.0, 1021.0, 0.530884444230988, 0.250105790667544),
            Self::LowEasy => (360.0, 494.0, 0.316227766016838, 0.168236228897329),
            Self::MiddleEasy => (500.0, 689.0, 0.354813389233575, 0.187169483835901),
            Self::HighEasy => (700.0, 975.0, 0.398107170553497, 0.205671765275719),
        };
        LevelParameters {
            fc_lo,
            fc_hi,
            g_lo,
            g_hi,
        }
    }
}

/// A stereo bs2b crossfeed filter.
#[derive(Debug, Clone)]
pub struct Crossfeed {
    level: CrossfeedLevel,
    sample_rate: u32,

    lowpass: [OnePoleLowpass; 2],
    highboost: [OnePoleHighboost; 2],

    /// The raw input of the previous frame, the highboost's `x[n-1]`.
    previous: [f64; 2],

    /// Output normalization, `1 / (1 - G_hi + G_lo)`.
    gain: f64,
}

impl Default for Crossfeed {
    fn default() -> Self {
        Self::new(CrossfeedLevel::default(), DEFAULT_SAMPLE_RATE)
    }
}

impl Crossfeed {
    /// Build a crossfeed for `level` at `sample_rate`.
    ///
    /// Sample rates outside 2 kHz to 192 kHz are replaced by 44.1 kHz.
    pub fn new(level: CrossfeedLevel, sample_rate: u32) -> Self {
        let params = level.parameters();
        let rate = sanitize_sample_rate(sample_rate);
        let fs = f64::from(rate);
        Self {
            level,
            sample_rate: rate,
            lowpass: [
                OnePoleLowpass::new(OnePoleLowpassCoefs::design(params.fc_lo, fs, params.g_lo)),
                OnePoleLowpass::new(OnePoleLowpassCoefs::design(params.fc_lo, fs, params.g_lo)),
            ],
            highboost: [
                OnePoleHighboost::new(OnePoleHighboostCoefs::design(
                    params.fc_hi,
                    fs,
                    params.g_hi,
                )),
                OnePoleHighboost::new(OnePoleHighboostCoefs::design(
                    params.fc_hi,
                    fs,
                    params.g_hi,
                )),
            ],
            previous: [0.0; 2],
            gain: 1.0 / (1.0 - params.g_hi + params.g_lo),
        }
    }

    pub fn level(&self) -> CrossfeedLevel {
        self.level
    }

    /// The sample rate in use, after out-of-range values were replaced.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Switch presets. Setting the current level again does nothing, not
    /// even clearing history; any other level re-derives the filters and
    /// starts from silence.
    pub fn set_level(&mut self, level: CrossfeedLevel) {
        if level == self.level {
            return;
        }
        self.level = level;
        self.redesign();
    }

    /// Change the sample rate, with the same short-circuit as
    /// [`set_level`](Self::set_level). The comparison uses the rate after
    /// sanitizing, so two unsupported rates in a row count as no change.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        let rate = sanitize_sample_rate(sample_rate);
        if rate != sample_rate {
            nih_warn!(
                "Crossfeed does not support {} Hz, running at {} Hz instead",
                sample_rate,
                rate
            );
        }
        if rate == self.sample_rate {
            return;
        }
        self.sample_rate = rate;
        self.redesign();
    }

    fn redesign(&mut self) {
        let params = self.level.parameters();
        let fs = f64::from(self.sample_rate);
        let lo = OnePoleLowpassCoefs::design(params.fc_lo, fs, params.g_lo);
        let hi = OnePoleHighboostCoefs::design(params.fc_hi, fs, params.g_hi);
        for filter in &mut self.lowpass {
            filter.set_coefs(lo);
        }
        for filter in &mut self.highboost {
            filter.set_coefs(hi);
        }
        self.gain = 1.0 / (1.0 - params.g_hi + params.g_lo);
        self.clear();
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.lowpass.iter_mut().for_each(OnePoleLowpass::clear);
        self.highboost.iter_mut().for_each(OnePoleHighboost::clear);
        self.previous = [0.0; 2];
    }

    /// `true` when every register is exactly zero.
    pub fn is_clear(&self) -> bool {
        self.lowpass.iter().all(OnePoleLowpass::is_clear)
            && self.highboost.iter().all(OnePoleHighboost::is_clear)
            && self.previous == [0.0; 2]
    }

    /// Crossfeed one stereo frame in place.
    #[inline]
    pub fn cross_feed(&mut self, frame: &mut [f64; 2]) {
        let lo = [
            self.lowpass[0].process(frame[0]),
            self.lowpass[1].process(frame[1]),
        ];
        let hi = [
            self.highboost[0].process(frame[0], self.previous[0]),
            self.highboost[1].process(frame[1], self.previous[1]),
        ];
        self.previous = *frame;

        frame[0] = ((hi[0] + lo[1]) * self.gain).clamp(-1.0, 1.0);
        frame[1] = ((hi[1] + lo[0]) * self.gain).clamp(-1.0, 1.0);
    }

    /// Process separate left and right buffers in place.
    pub fn process_planar(&mut self, left: &mut [f32], right: &mut [f32]) {
        nih_debug_assert_eq!(left.len(), right.len());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mut frame = [f64::from(*l), f64::from(*r)];
            self.cross_feed(&mut frame);
            *l = frame[0] as f32;
            *r = frame[1] as f32;
        }
    }

    /// Process interleaved `L R L R ...` samples in place. A trailing odd
    /// sample is left untouched.
    pub fn process_interleaved<S: CrossfeedSample>(&mut self, samples: &mut [S]) {
        for pair in samples.chunks_exact_mut(2) {
            let mut frame = [pair[0].to_unit(), pair[1].to_unit()];
            self.cross_feed(&mut frame);
            pair[0] = S::from_unit(frame[0]);
            pair[1] = S::from_unit(frame[1]);
        }
    }

    /// Process packed 24-bit little-endian interleaved stereo in place,
    /// six bytes per frame. A trailing partial frame is left untouched.
    pub fn process_packed_i24(&mut self, bytes: &mut [u8]) {
        nih_debug_assert_eq!(bytes.len() % I24_FRAME_BYTES, 0);
        for chunk in bytes.chunks_exact_mut(I24_FRAME_BYTES) {
            let mut frame = [
                i24_to_unit([chunk[0], chunk[1], chunk[2]]),
                i24_to_unit([chunk[3], chunk[4], chunk[5]]),
            ];
            self.cross_feed(&mut frame);
            chunk[..3].copy_from_slice(&unit_to_i24(frame[0]));
            chunk[3..].copy_from_slice(&unit_to_i24(frame[1]));
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::sample_format::pack_i24;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    #[test]
    fn test_level_indices() {
        for level in CrossfeedLevel::ALL {
            assert_eq!(CrossfeedLevel::from_index(level.index()), level);
        }
        assert_eq!(CrossfeedLevel::from_index(0), CrossfeedLevel::HighEasy);
        assert_eq!(CrossfeedLevel::from_index(42), CrossfeedLevel::HighEasy);
    }

    #[test]
    fn test_level_from_controls() {
        assert_eq!(CrossfeedLevel::from_controls(1, false), CrossfeedLevel::Low);
        assert_eq!(CrossfeedLevel::from_controls(3, false), CrossfeedLevel::High);
        assert_eq!(CrossfeedLevel::from_controls(2, true), CrossfeedLevel::MiddleEasy);
        assert_eq!(CrossfeedLevel::from_controls(3, true), CrossfeedLevel::HighEasy);
        assert_eq!(CrossfeedLevel::from_controls(9, false), CrossfeedLevel::High);
    }

    #[test]
    fn test_unsupported_rate_falls_back() {
        let cf = Crossfeed::new(CrossfeedLevel::Low, 1000);
        assert_eq!(cf.sample_rate(), 44100);
        let cf = Crossfeed::new(CrossfeedLevel::Low, 384_000);
        assert_eq!(cf.sample_rate(), 44100);
    }

    /// The first frame of an impulse on L is the direct highboost on L and
    /// the crossfed lowpass on R, both scaled by the normalization gain.
    #[test]
    fn test_first_impulse_frame() {
        let params = CrossfeedLevel::HighEasy.parameters();
        let lo = OnePoleLowpassCoefs::design(params.fc_lo, 44100.0, params.g_lo);
        let hi = OnePoleHighboostCoefs::design(params.fc_hi, 44100.0, params.g_hi);
        let gain = 1.0 / (1.0 - params.g_hi + params.g_lo);

        let mut cf = Crossfeed::new(CrossfeedLevel::HighEasy, 44100);
        let mut frame = [1.0, 0.0];
        cf.cross_feed(&mut frame);

        assert!((frame[0] - hi.a0 * gain).abs() < 1e-12, "L = {}", frame[0]);
        assert!((frame[1] - lo.a0 * gain).abs() < 1e-12, "R = {}", frame[1]);
    }

    #[test]
    fn test_output_is_clipped() {
        let mut cf = Crossfeed::new(CrossfeedLevel::High, 48000);
        for _ in 0..1000 {
            let mut frame = [4.0, 4.0];
            cf.cross_feed(&mut frame);
            assert!(frame[0] <= 1.0 && frame[1] <= 1.0);
        }
    }

    /// After an impulse, enough silence brings both outputs to within 1e-8.
    #[test]
    fn test_silence_settles() {
        for level in CrossfeedLevel::ALL {
            let mut cf = Crossfeed::new(level, 44100);
            let mut frame = [1.0, -0.5];
            cf.cross_feed(&mut frame);

            for _ in 0..5000 {
                frame = [0.0, 0.0];
                cf.cross_feed(&mut frame);
            }
            assert!(
                frame[0].abs() < 1e-8 && frame[1].abs() < 1e-8,
                "{level:?} did not settle: {frame:?}"
            );
        }
    }

    /// 0 dB tone on L only at 44.1 kHz: never clips and reaches R at once.
    #[test]
    fn test_tone_reaches_right_channel() {
        let mut cf = Crossfeed::new(CrossfeedLevel::HighEasy, 44100);
        let mut left: Vec<f32> = (0..1000)
            .map(|n| (2.0 * PI * 1000.0 * n as f64 / 44100.0).sin() as f32)
            .collect();
        let mut right = vec![0.0_f32; 1000];

        cf.process_planar(&mut left, &mut right);

        assert!(left.iter().chain(&right).all(|s| (-1.0..=1.0).contains(s)));
        assert!(
            right[..=2].iter().any(|&s| s != 0.0),
            "Crossfeed should reach R by sample 2: {:?}",
            &right[..3]
        );
    }

    /// Re-setting the same level keeps history; a new level clears it.
    #[test]
    fn test_set_level_short_circuits() {
        let mut cf = Crossfeed::new(CrossfeedLevel::Middle, 44100);
        cf.cross_feed(&mut [0.5, 0.5]);
        assert!(!cf.is_clear());

        cf.set_level(CrossfeedLevel::Middle);
        assert!(!cf.is_clear(), "Same level must not clear history");

        cf.set_level(CrossfeedLevel::Low);
        assert!(cf.is_clear(), "New level starts from silence");
        assert_eq!(cf.level(), CrossfeedLevel::Low);
    }

    /// Two unsupported rates in a row both mean 44.1 kHz, so the second
    /// call is a no-op.
    #[test]
    fn test_set_sample_rate_compares_sanitized_rates() {
        let mut cf = Crossfeed::new(CrossfeedLevel::High, 44100);
        cf.cross_feed(&mut [0.5, 0.0]);

        cf.set_sample_rate(500);
        assert!(!cf.is_clear());
        assert_eq!(cf.sample_rate(), 44100);

        cf.set_sample_rate(96000);
        assert!(cf.is_clear());
        assert_eq!(cf.sample_rate(), 96000);
    }

    #[test]
    fn test_instances_are_independent() {
        let mut a = Crossfeed::default();
        let b = Crossfeed::default();
        a.cross_feed(&mut [1.0, 1.0]);
        assert!(!a.is_clear());
        assert!(b.is_clear());
    }

    #[test]
    fn test_interleaved_matches_frames() {
        let input = [0.5_f64, -0.25, 0.1, 0.9, -0.7, 0.0];
        let mut interleaved = input;
        Crossfeed::default().process_interleaved(&mut interleaved);

        let mut reference = Crossfeed::default();
        for (n, pair) in input.chunks_exact(2).enumerate() {
            let mut frame = [pair[0], pair[1]];
            reference.cross_feed(&mut frame);
            assert_eq!(interleaved[2 * n], frame[0]);
            assert_eq!(interleaved[2 * n + 1], frame[1]);
        }
    }

    /// Silence stays at the format's zero code, including offset binary.
    #[test]
    fn test_integer_silence() {
        let mut u8_samples = [0x80_u8; 64];
        Crossfeed::default().process_interleaved(&mut u8_samples);
        assert!(u8_samples.iter().all(|&s| s == 0x80));

        let mut i16_samples = [0_i16; 64];
        Crossfeed::default().process_interleaved(&mut i16_samples);
        assert!(i16_samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_packed_i24_crossfeeds() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&pack_i24(4_000_000));
        bytes.extend_from_slice(&pack_i24(0));
        bytes.extend_from_slice(&[0; 6]);

        let mut cf = Crossfeed::default();
        cf.process_packed_i24(&mut bytes);

        let mut reference = Crossfeed::default();
        let mut frame = [4_000_000.0 / 8_388_607.0, 0.0];
        reference.cross_feed(&mut frame);
        assert_eq!(bytes[0..3], unit_to_i24(frame[0]));
        assert_eq!(bytes[3..6], unit_to_i24(frame[1]));
        assert_ne!(bytes[3..6], [0, 0, 0], "R should pick up crossfeed");
    }

    proptest! {
        /// For every supported rate and level an impulse on L gives a
        /// bounded response on both channels that dies away.
        #[test]
        fn impulse_response_is_bounded_and_decays(
            sample_rate in 2000u32..=192_000,
            level_index in 1i32..=6,
        ) {
            let mut cf = Crossfeed::new(CrossfeedLevel::from_index(level_index), sample_rate);

            let mut peak_late = 0.0_f64;
            for n in 0..20_000 {
                let mut frame = if n == 0 { [1.0, 0.0] } else { [0.0, 0.0] };
                cf.cross_feed(&mut frame);
                prop_assert!(frame.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
                if n >= 19_000 {
                    peak_late = peak_late.max(frame[0].abs()).max(frame[1].abs());
                }
            }
            prop_assert!(peak_late < 1e-6, "tail peak {} at {} Hz", peak_late, sample_rate);
        }
    }
}
