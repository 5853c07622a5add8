//! Chorus/flanger plugin.

use std::sync::Arc;

use nih_plug::prelude::*;

use super::{stereo, EMAIL, STEREO_LAYOUTS, VENDOR};
use crate::effects::chorus::Chorus;
use crate::params::ChorusParams;

pub struct LovelessChorus {
    params: Arc<ChorusParams>,
    chorus: Option<Chorus>,
}

impl Default for LovelessChorus {
    fn default() -> Self {
        Self {
            params: Arc::new(ChorusParams::default()),
            chorus: None,
        }
    }
}

impl Plugin for LovelessChorus {
    const NAME: &'static str = "Loveless Chorus";
    const VENDOR: &'static str = VENDOR;
    const URL: &'static str = "";
    const EMAIL: &'static str = EMAIL;
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = STEREO_LAYOUTS;
    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        self.chorus = None;
        match Chorus::new(buffer_config.sample_rate) {
            Ok(chorus) => {
                nih_log!("chorus initialized at {} Hz", buffer_config.sample_rate);
                self.chorus = Some(chorus);
                true
            }
            Err(err) => {
                nih_log!("chorus initialization failed: {err}");
                false
            }
        }
    }

    /// Also restarts both modulators, so playback always starts from the
    /// same point of the sweep.
    fn reset(&mut self) {
        if let Some(chorus) = &mut self.chorus {
            chorus.clear();
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let Some(chorus) = &mut self.chorus else {
            return ProcessStatus::Normal;
        };

        let settings = self.params.settings();
        if let Some((left, right)) = stereo(buffer) {
            chorus.process(&settings, left, right);
        }

        ProcessStatus::Tail(chorus.tail_samples())
    }
}

impl ClapPlugin for LovelessChorus {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-chorus-v1";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Chorus and flanger with sine or fractal modulation");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Chorus,
        ClapFeature::Flanger,
    ];
}

impl Vst3Plugin for LovelessChorus {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssChorus_v001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Modulation];
}
