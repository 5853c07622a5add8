//! # Comb/Allpass Reverb
//!
//! A Schroeder-style reverberator:
//!
//! ```text
//!          ┌─► comb 1 ─┐
//!          ├─► comb 2 ─┤
//! x ───────┼─►  ...   ─┼──(+)──► allpass chain ──► bandpass ──► × wet ──(+)──► out
//!   │      └─► comb N ─┘   ▲                                             ▲
//!   ├──────────────────────┘                                             │
//!   └─────────────────────────────────────────────────────────── × dry ──┘
//! ```
//!
//! The combs run in parallel, each fed the dry input, and build up the
//! dense decaying tail. The allpasses run in series and each adds its
//! diffused copy to the running sum. The bandpass trims rumble and fizz
//! from the wet signal.
//!
//! Left and right have their own filters. With stereo enhancement on, one
//! channel of every pair runs a loop 0.2% shorter than its partner,
//! alternating sides from pair to pair, which decorrelates the tails.
//!
//! Loop gains depend on the decay time, the stereo flag and the preset.
//! They are recomputed at the start of a block when one of those changed,
//! never per sample.

use super::reverb_presets::{preset, AllpassSpec, CombSpec};
use crate::dsp::biquad::Bandpass;
use crate::dsp::coefficients::{db_to_gain, SILENCE_DB};
use crate::dsp::comb::{allpass_gains, comb_feedback_gain, AllpassFilter, CombFilter};
use crate::dsp::delay_line::RingBuffer;
use crate::error::DspError;

pub const MAX_COMBS: usize = 20;
pub const MAX_ALLPASSES: usize = 20;
pub const MAX_DECAY_MS: f32 = 10_000.0;
pub const MAX_COMB_DELAY_MS: f32 = 250.0;
pub const MAX_ALLPASS_DELAY_MS: f32 = 20.0;

/// Loudest dry or wet level accepted, dB.
pub const MAX_LEVEL_DB: f32 = 10.0;

/// Bandwidth of the output lowpass/highpass pair, octaves.
pub const BANDPASS_BANDWIDTH: f32 = 1.5;

/// Bandwidth of each comb's absorption filter, octaves.
pub const FREQ_RESP_BANDWIDTH: f32 = 3.0;

/// Centre of each comb's absorption filter, Hz.
pub const FREQ_RESP_CENTER_HZ: f32 = 10_000.0;

/// Absorption filter cut at `freq_resp = 1`, dB.
pub const FREQ_RESP_MAX_CUT_DB: f32 = -60.0;

/// Length ratio between the two channels of a pair in enhanced stereo.
pub const ENHANCED_STEREO_RATIO: f32 = 0.998;

/// Control values for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbSettings {
    /// Time for the tail to fall by 60 dB, ms.
    pub decay_ms: f32,
    pub dry_db: f32,
    pub wet_db: f32,
    pub combs_enabled: bool,
    pub allpasses_enabled: bool,
    pub bandpass_enabled: bool,
    pub stereo_enhanced: bool,
    /// Index into the preset table.
    pub mode: usize,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            decay_ms: 2800.0,
            dry_db: -4.0,
            wet_db: -12.0,
            combs_enabled: true,
            allpasses_enabled: true,
            bandpass_enabled: true,
            stereo_enhanced: true,
            mode: 0,
        }
    }
}

impl ReverbSettings {
    /// Pull every value into its supported range. Levels at or below
    /// -90 dB (including `-inf`) end up at -90 dB, which is silence.
    pub fn clamped(&self) -> Self {
        Self {
            decay_ms: self.decay_ms.clamp(0.0, MAX_DECAY_MS),
            dry_db: self.dry_db.clamp(SILENCE_DB, MAX_LEVEL_DB),
            wet_db: self.wet_db.clamp(SILENCE_DB, MAX_LEVEL_DB),
            mode: self.mode.min(super::reverb_presets::PRESETS.len() - 1),
            ..*self
        }
    }
}

#[derive(Debug, Clone)]
struct StereoPair<T> {
    left: T,
    right: T,
}

/// A comb pair together with the preset data it was loaded from.
#[derive(Debug, Clone)]
struct CombSlot {
    filters: StereoPair<CombFilter>,
    base_length: usize,
    feedback: f32,
    freq_resp: f32,
}

#[derive(Debug, Clone)]
struct AllpassSlot {
    filters: StereoPair<AllpassFilter>,
    base_length: usize,
    feedback: f32,
}

/// Per-pair loop lengths `(left, right)`. Enhanced stereo shortens the
/// right channel of even pairs and the left channel of odd pairs.
fn pair_lengths(index: usize, base: usize, enhanced: bool) -> (usize, usize) {
    if !enhanced {
        return (base, base);
    }
    let shortened = (ENHANCED_STEREO_RATIO * base as f32) as usize;
    if index % 2 == 0 {
        (base, shortened)
    } else {
        (shortened, base)
    }
}

/// Cache key for the gain recomputation.
type GainKey = (f32, bool, usize);

/// The complete stereo reverb.
#[derive(Debug, Clone)]
pub struct ReverbNetwork {
    sample_rate: f32,

    combs: Vec<CombSlot>,
    allpasses: Vec<AllpassSlot>,
    active_combs: usize,
    active_allpasses: usize,

    bandpass: StereoPair<Bandpass>,

    loaded_mode: usize,
    computed: Option<GainKey>,
    decay_ms: f32,
}

impl ReverbNetwork {
    /// Allocate every buffer the network can use at `sample_rate` and load
    /// the first preset.
    pub fn new(sample_rate: f32) -> Result<Self, DspError> {
        let combs = (0..MAX_COMBS)
            .map(|_| {
                Ok(CombSlot {
                    filters: StereoPair {
                        left: CombFilter::new(RingBuffer::for_duration(
                            MAX_COMB_DELAY_MS,
                            sample_rate,
                        )?),
                        right: CombFilter::new(RingBuffer::for_duration(
                            MAX_COMB_DELAY_MS,
                            sample_rate,
                        )?),
                    },
                    base_length: 1,
                    feedback: 1.0,
                    freq_resp: 0.0,
                })
            })
            .collect::<Result<Vec<_>, DspError>>()?;

        let allpasses = (0..MAX_ALLPASSES)
            .map(|_| {
                Ok(AllpassSlot {
                    filters: StereoPair {
                        left: AllpassFilter::new(RingBuffer::for_duration(
                            MAX_ALLPASS_DELAY_MS,
                            sample_rate,
                        )?),
                        right: AllpassFilter::new(RingBuffer::for_duration(
                            MAX_ALLPASS_DELAY_MS,
                            sample_rate,
                        )?),
                    },
                    base_length: 1,
                    feedback: 1.0,
                })
            })
            .collect::<Result<Vec<_>, DspError>>()?;

        let mut network = Self {
            sample_rate,
            combs,
            allpasses,
            active_combs: 0,
            active_allpasses: 0,
            bandpass: StereoPair {
                left: Bandpass::new(),
                right: Bandpass::new(),
            },
            loaded_mode: 0,
            computed: None,
            decay_ms: 0.0,
        };
        network.load_preset(0);
        Ok(network)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Comb pairs in use by the loaded preset.
    pub fn active_combs(&self) -> usize {
        self.active_combs
    }

    /// Allpass pairs in use by the loaded preset.
    pub fn active_allpasses(&self) -> usize {
        self.active_allpasses
    }

    /// Loop lengths `(left, right)` of comb pair `index`.
    pub fn comb_lengths(&self, index: usize) -> Option<(usize, usize)> {
        self.combs[..self.active_combs]
            .get(index)
            .map(|slot| (slot.filters.left.length(), slot.filters.right.length()))
    }

    /// Copy a preset into the filter slots and start those filters from
    /// silence.
    fn load_preset(&mut self, mode: usize) {
        let preset = preset(mode);
        let sr = self.sample_rate;

        for (slot, spec) in self.combs.iter_mut().zip(preset.combs) {
            let CombSpec {
                delay_s,
                feedback,
                freq_resp,
            } = *spec;
            let capacity = slot.filters.left.capacity();
            slot.base_length = ((delay_s * sr) as usize).clamp(1, capacity);
            slot.feedback = feedback;
            slot.freq_resp = freq_resp;

            for filter in [&mut slot.filters.left, &mut slot.filters.right] {
                filter.set_tone(
                    FREQ_RESP_CENTER_HZ,
                    freq_resp * FREQ_RESP_MAX_CUT_DB,
                    FREQ_RESP_BANDWIDTH,
                    sr,
                );
                filter.clear();
            }
        }

        for (slot, spec) in self.allpasses.iter_mut().zip(preset.allpasses) {
            let AllpassSpec { delay_s, feedback } = *spec;
            let capacity = slot.filters.left.capacity();
            slot.base_length = ((delay_s * sr) as usize).clamp(1, capacity);
            slot.feedback = feedback;
            slot.filters.left.clear();
            slot.filters.right.clear();
        }

        self.active_combs = preset.combs.len().min(MAX_COMBS);
        self.active_allpasses = preset.allpasses.len().min(MAX_ALLPASSES);

        for band in [&mut self.bandpass.left, &mut self.bandpass.right] {
            band.set_band(
                preset.bandpass_low,
                preset.bandpass_high,
                BANDPASS_BANDWIDTH,
                sr,
            );
            band.clear();
        }

        self.loaded_mode = mode;
    }

    /// Derive loop gains and lengths from the decay time and stereo flag.
    fn compute_gains(&mut self, decay_ms: f32, stereo_enhanced: bool) {
        let sr = self.sample_rate;

        for (i, slot) in self.combs[..self.active_combs].iter_mut().enumerate() {
            let gain = comb_feedback_gain(
                slot.base_length,
                sr,
                slot.freq_resp,
                slot.feedback,
                decay_ms,
            );
            let (left, right) = pair_lengths(i, slot.base_length, stereo_enhanced);
            slot.filters.left.set_fb_gain(gain);
            slot.filters.right.set_fb_gain(gain);
            slot.filters.left.set_length(left);
            slot.filters.right.set_length(right);
        }

        for (i, slot) in self.allpasses[..self.active_allpasses]
            .iter_mut()
            .enumerate()
        {
            let (fb_gain, in_gain) = allpass_gains(slot.feedback, decay_ms);
            let (left, right) = pair_lengths(i, slot.base_length, stereo_enhanced);
            slot.filters.left.set_gains(fb_gain, in_gain);
            slot.filters.right.set_gains(fb_gain, in_gain);
            slot.filters.left.set_length(left);
            slot.filters.right.set_length(right);
        }
    }

    /// Bring gains, lengths and the loaded preset in line with `settings`.
    /// Does nothing when decay, stereo flag and mode are unchanged.
    fn refresh(&mut self, settings: &ReverbSettings) {
        let key = (settings.decay_ms, settings.stereo_enhanced, settings.mode);
        if self.computed == Some(key) {
            return;
        }

        if settings.mode != self.loaded_mode {
            self.load_preset(settings.mode);
        }
        self.compute_gains(settings.decay_ms, settings.stereo_enhanced);
        self.decay_ms = settings.decay_ms;
        self.computed = Some(key);
    }

    /// Reverberate a stereo block in place.
    pub fn process(&mut self, settings: &ReverbSettings, left: &mut [f32], right: &mut [f32]) {
        let settings = settings.clamped();
        self.refresh(&settings);

        let dry = db_to_gain(settings.dry_db);
        let wet = db_to_gain(settings.wet_db);

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (in_l, in_r) = (*l, *r);
            let mut sum_l = in_l;
            let mut sum_r = in_r;

            if settings.combs_enabled {
                for slot in &mut self.combs[..self.active_combs] {
                    sum_l += slot.filters.left.process(in_l);
                    sum_r += slot.filters.right.process(in_r);
                }
            }

            // Accumulates on purpose (`sum += allpass(sum)`): each stage
            // adds its output to the running sum instead of replacing it.
            if settings.allpasses_enabled {
                for slot in &mut self.allpasses[..self.active_allpasses] {
                    sum_l += slot.filters.left.process(sum_l);
                    sum_r += slot.filters.right.process(sum_r);
                }
            }

            if settings.bandpass_enabled {
                sum_l = self.bandpass.left.run(sum_l);
                sum_r = self.bandpass.right.run(sum_r);
            }

            *l = in_l * dry + sum_l * wet;
            *r = in_r * dry + sum_r * wet;
        }
    }

    /// Silence every buffer and filter. Allocations and the loaded preset
    /// are kept.
    pub fn clear(&mut self) {
        for slot in &mut self.combs {
            slot.filters.left.clear();
            slot.filters.right.clear();
        }
        for slot in &mut self.allpasses {
            slot.filters.left.clear();
            slot.filters.right.clear();
        }
        self.bandpass.left.clear();
        self.bandpass.right.clear();
    }

    /// How long the tail keeps ringing after the input stops, in samples.
    pub fn tail_samples(&self) -> u32 {
        (self.decay_ms * self.sample_rate / 1000.0) as u32
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::reverb_presets::PRESETS;

    const SR: f32 = 44100.0;

    fn impulse(len: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; len];
        let mut right = vec![0.0; len];
        left[0] = 1.0;
        right[0] = 1.0;
        (left, right)
    }

    /// Deterministic test signal in `[-1, 1]`.
    fn noise(len: usize, seed: u32) -> Vec<f32> {
        let mut state = seed.wrapping_mul(747_796_405).wrapping_add(1);
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 23) as f32 - 1.0
            })
            .collect()
    }

    fn energy(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s * s).sum()
    }

    #[test]
    fn test_settings_clamp() {
        let wild = ReverbSettings {
            decay_ms: 50_000.0,
            dry_db: f32::NEG_INFINITY,
            wet_db: 40.0,
            mode: 999,
            ..ReverbSettings::default()
        }
        .clamped();
        assert_eq!(wild.decay_ms, MAX_DECAY_MS);
        assert_eq!(wild.dry_db, SILENCE_DB);
        assert_eq!(wild.wet_db, MAX_LEVEL_DB);
        assert_eq!(wild.mode, PRESETS.len() - 1);
    }

    #[test]
    fn test_enhanced_pair_lengths() {
        assert_eq!(pair_lengths(0, 1000, false), (1000, 1000));
        assert_eq!(pair_lengths(0, 1000, true), (1000, 998));
        assert_eq!(pair_lengths(1, 1000, true), (998, 1000));
    }

    /// A fully closed wet level leaves exactly the scaled dry signal, with
    /// every stage of the network running.
    #[test]
    fn test_wet_silence_is_exactly_dry() {
        let mut reverb = ReverbNetwork::new(SR).unwrap();
        let settings = ReverbSettings {
            dry_db: -6.0,
            wet_db: f32::NEG_INFINITY,
            ..ReverbSettings::default()
        };
        let dry = db_to_gain(-6.0);

        let input_l = noise(4096, 1);
        let input_r = noise(4096, 2);
        let mut left = input_l.clone();
        let mut right = input_r.clone();
        reverb.process(&settings, &mut left, &mut right);

        for n in 0..4096 {
            assert_eq!(left[n], input_l[n] * dry, "L differs at {n}");
            assert_eq!(right[n], input_r[n] * dry, "R differs at {n}");
        }
    }

    /// With every stage off the wet path is the input itself.
    #[test]
    fn test_bypassed_network_passes_input() {
        let mut reverb = ReverbNetwork::new(SR).unwrap();
        let settings = ReverbSettings {
            dry_db: f32::NEG_INFINITY,
            wet_db: 0.0,
            combs_enabled: false,
            allpasses_enabled: false,
            bandpass_enabled: false,
            ..ReverbSettings::default()
        };
        let input = noise(512, 3);
        let mut left = input.clone();
        let mut right = input.clone();
        reverb.process(&settings, &mut left, &mut right);
        assert_eq!(left, input);
        assert_eq!(right, input);
    }

    /// An impulse produces a tail that is still audible after the shortest
    /// comb delay and then fades.
    #[test]
    fn test_impulse_tail_decays() {
        let mut reverb = ReverbNetwork::new(SR).unwrap();
        let settings = ReverbSettings {
            decay_ms: 1000.0,
            dry_db: f32::NEG_INFINITY,
            wet_db: 0.0,
            ..ReverbSettings::default()
        };
        let (mut left, mut right) = impulse(SR as usize * 2);
        reverb.process(&settings, &mut left, &mut right);

        assert!(left.iter().chain(&right).all(|s| s.is_finite()));
        let early = energy(&left[2000..12000]);
        let late = energy(&left[78000..88000]);
        assert!(early > 1e-6, "Tail should be audible, got {early}");
        assert!(late < early * 0.01, "Tail should fade: early {early}, late {late}");
    }

    #[test]
    fn test_longer_decay_rings_longer() {
        let late_energy = |decay_ms: f32| {
            let mut reverb = ReverbNetwork::new(SR).unwrap();
            let settings = ReverbSettings {
                decay_ms,
                dry_db: f32::NEG_INFINITY,
                wet_db: 0.0,
                ..ReverbSettings::default()
            };
            let (mut left, mut right) = impulse(SR as usize);
            reverb.process(&settings, &mut left, &mut right);
            energy(&left[30000..44100])
        };
        assert!(late_energy(4000.0) > late_energy(500.0));
    }

    /// Identical channels in, identical channels out, unless enhanced
    /// stereo detunes the pairs.
    #[test]
    fn test_stereo_enhancement_decorrelates() {
        let run = |enhanced: bool| {
            let mut reverb = ReverbNetwork::new(SR).unwrap();
            let settings = ReverbSettings {
                stereo_enhanced: enhanced,
                ..ReverbSettings::default()
            };
            let (mut left, mut right) = impulse(8192);
            reverb.process(&settings, &mut left, &mut right);
            (left, right)
        };

        let (left, right) = run(false);
        assert_eq!(left, right);

        let (left, right) = run(true);
        assert!(left.iter().zip(&right).any(|(l, r)| l != r));
    }

    #[test]
    fn test_mode_change_loads_preset() {
        let mut reverb = ReverbNetwork::new(SR).unwrap();
        assert_eq!(reverb.active_combs(), PRESETS[0].combs.len());

        let settings = ReverbSettings {
            mode: 2,
            stereo_enhanced: false,
            ..ReverbSettings::default()
        };
        reverb.process(&settings, &mut [0.0; 16], &mut [0.0; 16]);

        assert_eq!(reverb.active_combs(), PRESETS[2].combs.len());
        assert_eq!(reverb.active_allpasses(), PRESETS[2].allpasses.len());
        let expected = (PRESETS[2].combs[0].delay_s * SR) as usize;
        assert_eq!(reverb.comb_lengths(0), Some((expected, expected)));
        assert_eq!(reverb.comb_lengths(PRESETS[2].combs.len()), None);
    }

    #[test]
    fn test_toggling_enhancement_restores_lengths() {
        let mut reverb = ReverbNetwork::new(SR).unwrap();
        let mut settings = ReverbSettings {
            stereo_enhanced: true,
            ..ReverbSettings::default()
        };
        reverb.process(&settings, &mut [0.0; 4], &mut [0.0; 4]);
        let (left, right) = reverb.comb_lengths(1).unwrap();
        assert!(left < right);

        settings.stereo_enhanced = false;
        reverb.process(&settings, &mut [0.0; 4], &mut [0.0; 4]);
        let (left, right) = reverb.comb_lengths(1).unwrap();
        assert_eq!(left, right);
    }

    /// The allpass chain adds to the running sum, so the direct signal
    /// reaches the output undelayed even with combs and bandpass off.
    #[test]
    fn test_allpasses_accumulate_onto_sum() {
        let mut reverb = ReverbNetwork::new(SR).unwrap();
        let settings = ReverbSettings {
            dry_db: SILENCE_DB,
            wet_db: 0.0,
            combs_enabled: false,
            allpasses_enabled: true,
            bandpass_enabled: false,
            ..ReverbSettings::default()
        };
        let (mut left, mut right) = impulse(4096);
        reverb.process(&settings, &mut left, &mut right);

        assert_eq!(left[0], 1.0);
        assert_eq!(right[0], 1.0);
        assert!(left[1..].iter().any(|&s| s != 0.0));
    }

    /// Loop gains follow the decay law for the loaded preset, identically
    /// on both channels.
    #[test]
    fn test_loop_gains_follow_decay() {
        let mut reverb = ReverbNetwork::new(SR).unwrap();
        let settings = ReverbSettings {
            decay_ms: 2200.0,
            mode: 3,
            stereo_enhanced: true,
            ..ReverbSettings::default()
        };
        reverb.process(&settings, &mut [0.0; 8], &mut [0.0; 8]);

        for slot in &reverb.combs[..reverb.active_combs] {
            let expected = comb_feedback_gain(
                slot.base_length,
                SR,
                slot.freq_resp,
                slot.feedback,
                settings.decay_ms,
            );
            assert_eq!(slot.filters.left.fb_gain(), expected);
            assert_eq!(slot.filters.right.fb_gain(), expected);
        }

        for slot in &reverb.allpasses[..reverb.active_allpasses] {
            let expected = allpass_gains(slot.feedback, settings.decay_ms);
            let left = &slot.filters.left;
            let right = &slot.filters.right;
            assert_eq!((left.fb_gain(), left.in_gain()), expected);
            assert_eq!((right.fb_gain(), right.in_gain()), expected);
        }

        // A longer decay keeps more of each pass.
        let before = reverb.combs[0].filters.left.fb_gain();
        let longer = ReverbSettings {
            decay_ms: 4400.0,
            ..settings
        };
        reverb.process(&longer, &mut [0.0; 8], &mut [0.0; 8]);
        assert!(reverb.combs[0].filters.left.fb_gain() > before);
    }

    #[test]
    fn test_clear_silences_tail() {
        let mut reverb = ReverbNetwork::new(SR).unwrap();
        let settings = ReverbSettings::default();
        let mut left = noise(4096, 4);
        let mut right = noise(4096, 5);
        reverb.process(&settings, &mut left, &mut right);

        reverb.clear();
        let mut left = vec![0.0; 4096];
        let mut right = vec![0.0; 4096];
        reverb.process(&settings, &mut left, &mut right);
        assert!(left.iter().chain(&right).all(|&s| s == 0.0));
    }

    #[test]
    fn test_tail_length_follows_decay() {
        let mut reverb = ReverbNetwork::new(48000.0).unwrap();
        let settings = ReverbSettings {
            decay_ms: 1500.0,
            ..ReverbSettings::default()
        };
        reverb.process(&settings, &mut [0.0; 1], &mut [0.0; 1]);
        assert_eq!(reverb.tail_samples(), 72000);
    }

    #[test]
    fn test_zero_sample_rate_is_an_error() {
        assert!(ReverbNetwork::new(0.0).is_err());
    }

    /// Every preset stays finite on noise at the extreme settings.
    #[test]
    fn test_all_presets_are_stable() {
        for mode in 0..PRESETS.len() {
            let mut reverb = ReverbNetwork::new(SR).unwrap();
            let settings = ReverbSettings {
                decay_ms: MAX_DECAY_MS,
                wet_db: MAX_LEVEL_DB,
                mode,
                ..ReverbSettings::default()
            };
            let mut left = noise(8192, mode as u32);
            let mut right = noise(8192, mode as u32 + 100);
            reverb.process(&settings, &mut left, &mut right);
            assert!(
                left.iter().chain(&right).all(|s| s.is_finite()),
                "{} went non-finite",
                PRESETS[mode].name
            );
        }
    }
}
