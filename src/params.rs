//! # Plugin Parameters
//!
//! Parameters are the knobs and switches the user sees in the DAW. Each
//! has a **unique string ID** (`#[id = "..."]`) the host uses to save and
//! recall sessions. Once published, never change these IDs or existing
//! sessions will lose their settings.
//!
//! ## Block-Rate Controls
//!
//! None of these parameters are smoothed. The effects read every value
//! once at the top of a block and hold it until the next one, which is
//! also when the DSP recomputes its coefficients.
//!
//! Each struct converts itself into the plain settings type its effect
//! takes, so the DSP never sees nih-plug types.

use std::sync::Arc;

use nih_plug::prelude::*;

use crate::dsp::coefficients::SILENCE_DB;
use crate::effects::chorus::{self, ChorusSettings};
use crate::effects::crossfeed::CrossfeedLevel;
use crate::effects::reverb::{self, ReverbSettings};
use crate::effects::reverb_presets::{preset, PRESETS};

/// Show levels at the silence floor as `-inf`.
fn level_to_string() -> Arc<dyn Fn(f32) -> String + Send + Sync> {
    Arc::new(|db| {
        if db <= SILENCE_DB {
            String::from("-inf")
        } else {
            format!("{db:.1}")
        }
    })
}

fn string_to_level() -> Arc<dyn Fn(&str) -> Option<f32> + Send + Sync> {
    Arc::new(|text| {
        let text = text.trim().trim_end_matches("dB").trim();
        if text.eq_ignore_ascii_case("-inf") {
            Some(SILENCE_DB)
        } else {
            text.parse().ok()
        }
    })
}

/// A dry or wet level in dB, from silence up to `max_db`.
fn level_param(name: &str, default_db: f32, max_db: f32) -> FloatParam {
    FloatParam::new(
        name,
        default_db,
        FloatRange::Linear {
            min: SILENCE_DB,
            max: max_db,
        },
    )
    .with_unit(" dB")
    .with_step_size(0.1)
    .with_value_to_string(level_to_string())
    .with_string_to_value(string_to_level())
}

fn on_off() -> Arc<dyn Fn(bool) -> String + Send + Sync> {
    Arc::new(|on| String::from(if on { "On" } else { "Off" }))
}

// ─────────────────────────────────────────────────────────────────────
// Crossfeed
// ─────────────────────────────────────────────────────────────────────

#[derive(Params)]
pub struct CrossfeedParams {
    /// **Crossfeed Level**: how much of each channel leaks into the other
    /// ear. 1 is subtle, 3 moves the virtual speakers closest together.
    #[id = "level"]
    pub level: IntParam,

    /// **High Boost**: selects the "easy" variant of the level, which
    /// feeds less across and keeps more of the direct highs.
    #[id = "boost"]
    pub high_boost: BoolParam,
}

impl Default for CrossfeedParams {
    fn default() -> Self {
        Self {
            level: IntParam::new("Crossfeed Level", 3, IntRange::Linear { min: 1, max: 3 })
                .with_value_to_string(Arc::new(|level| {
                    String::from(match level {
                        1 => "Low",
                        2 => "Middle",
                        _ => "High",
                    })
                })),
            high_boost: BoolParam::new("High Boost", true).with_value_to_string(on_off()),
        }
    }
}

impl CrossfeedParams {
    pub fn level(&self) -> CrossfeedLevel {
        CrossfeedLevel::from_controls(self.level.value(), self.high_boost.value())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Reverb
// ─────────────────────────────────────────────────────────────────────

#[derive(Params)]
pub struct ReverbParams {
    /// **Decay**: time for the tail to fall by 60 dB.
    ///
    /// Skewed so the first half of the knob covers roughly the first two
    /// seconds, where rooms actually live.
    #[id = "decay"]
    pub decay: FloatParam,

    #[id = "dry"]
    pub dry_level: FloatParam,

    #[id = "wet"]
    pub wet_level: FloatParam,

    /// Parallel comb bank: the body of the tail.
    #[id = "combs"]
    pub combs: BoolParam,

    /// Serial allpass chain: diffuses discrete echoes.
    #[id = "allps"]
    pub allpasses: BoolParam,

    /// Band limit on the wet signal.
    #[id = "bandp"]
    pub bandpass: BoolParam,

    /// Slightly detune left and right loops for a wider image.
    #[id = "enh"]
    pub stereo_enhanced: BoolParam,

    /// **Reverb Type**: the room model, from the built-in preset table.
    #[id = "mode"]
    pub mode: IntParam,
}

impl Default for ReverbParams {
    fn default() -> Self {
        let defaults = ReverbSettings::default();
        Self {
            decay: FloatParam::new(
                "Decay",
                defaults.decay_ms,
                FloatRange::Skewed {
                    min: 0.0,
                    max: reverb::MAX_DECAY_MS,
                    factor: FloatRange::skew_factor(-1.5),
                },
            )
            .with_unit(" ms")
            .with_step_size(1.0),

            dry_level: level_param("Dry Level", defaults.dry_db, reverb::MAX_LEVEL_DB),
            wet_level: level_param("Wet Level", defaults.wet_db, reverb::MAX_LEVEL_DB),

            combs: BoolParam::new("Comb Filters", defaults.combs_enabled)
                .with_value_to_string(on_off()),
            allpasses: BoolParam::new("Allpass Filters", defaults.allpasses_enabled)
                .with_value_to_string(on_off()),
            bandpass: BoolParam::new("Bandpass Filter", defaults.bandpass_enabled)
                .with_value_to_string(on_off()),
            stereo_enhanced: BoolParam::new("Enhanced Stereo", defaults.stereo_enhanced)
                .with_value_to_string(on_off()),

            mode: IntParam::new(
                "Reverb Type",
                defaults.mode as i32,
                IntRange::Linear {
                    min: 0,
                    max: PRESETS.len() as i32 - 1,
                },
            )
            .with_value_to_string(Arc::new(|mode| {
                String::from(preset(mode.max(0) as usize).name)
            })),
        }
    }
}

impl ReverbParams {
    pub fn settings(&self) -> ReverbSettings {
        ReverbSettings {
            decay_ms: self.decay.value(),
            dry_db: self.dry_level.value(),
            wet_db: self.wet_level.value(),
            combs_enabled: self.combs.value(),
            allpasses_enabled: self.allpasses.value(),
            bandpass_enabled: self.bandpass.value(),
            stereo_enhanced: self.stereo_enhanced.value(),
            mode: self.mode.value().max(0) as usize,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Chorus / Flanger
// ─────────────────────────────────────────────────────────────────────

#[derive(Params)]
pub struct ChorusParams {
    /// **Fractal**: swap the sine LFO for a wandering random curve.
    #[id = "frac"]
    pub fractal: BoolParam,

    /// **Frequency / Roughness**: LFO speed in sine mode, jaggedness of
    /// the curve in fractal mode.
    #[id = "cmi"]
    pub common_mode: FloatParam,

    /// **L/R Offset**: phase (sine) or lag (fractal) of the right channel
    /// against the left.
    #[id = "dmi"]
    pub differential_mode: FloatParam,

    #[id = "depth"]
    pub depth: FloatParam,

    #[id = "delay"]
    pub delay: FloatParam,

    /// **Contour**: highpass corner on the wet signal.
    #[id = "contr"]
    pub contour: FloatParam,

    #[id = "dry"]
    pub dry_level: FloatParam,

    #[id = "wet"]
    pub wet_level: FloatParam,
}

impl Default for ChorusParams {
    fn default() -> Self {
        let defaults = ChorusSettings::default();
        Self {
            fractal: BoolParam::new("Fractal", defaults.fractal_mode)
                .with_value_to_string(on_off()),

            common_mode: FloatParam::new(
                "Frequency",
                defaults.common_mode,
                FloatRange::Linear { min: 0.0, max: 1.0 },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(0))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            differential_mode: FloatParam::new(
                "L/R Offset",
                defaults.differential_mode,
                FloatRange::Linear { min: 0.0, max: 1.0 },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(0))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            depth: FloatParam::new(
                "Depth",
                defaults.depth_percent,
                FloatRange::Linear {
                    min: 0.0,
                    max: 100.0,
                },
            )
            .with_unit(" %")
            .with_step_size(0.1),

            delay: FloatParam::new(
                "Delay",
                defaults.delay_ms,
                FloatRange::Linear {
                    min: 0.0,
                    max: chorus::MAX_DELAY_MS,
                },
            )
            .with_unit(" ms")
            .with_step_size(0.1),

            contour: FloatParam::new(
                "Contour",
                defaults.contour_hz,
                FloatRange::Skewed {
                    min: chorus::MIN_CONTOUR_HZ,
                    max: chorus::MAX_CONTOUR_HZ,
                    // Frequency perception is roughly logarithmic.
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_unit(" Hz")
            .with_step_size(1.0),

            dry_level: level_param("Dry Level", defaults.dry_db, chorus::MAX_LEVEL_DB),
            wet_level: level_param("Wet Level", defaults.wet_db, chorus::MAX_LEVEL_DB),
        }
    }
}

impl ChorusParams {
    pub fn settings(&self) -> ChorusSettings {
        ChorusSettings {
            fractal_mode: self.fractal.value(),
            common_mode: self.common_mode.value(),
            differential_mode: self.differential_mode.value(),
            depth_percent: self.depth.value(),
            delay_ms: self.delay.value(),
            contour_hz: self.contour.value(),
            dry_db: self.dry_level.value(),
            wet_db: self.wet_level.value(),
        }
    }
}
