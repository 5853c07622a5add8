//! Comb/allpass reverb plugin.
//!
//! The network is built in `initialize()` because its delay buffers are
//! sized from the sample rate: up to 20 comb pairs of 250 ms and 20
//! allpass pairs of 20 ms. At 96 kHz that is a little under 4 MB, which
//! must never be reserved on the audio thread.

use std::sync::Arc;

use nih_plug::prelude::*;

use super::{stereo, EMAIL, STEREO_LAYOUTS, VENDOR};
use crate::effects::reverb::ReverbNetwork;
use crate::params::ReverbParams;

pub struct LovelessReverb {
    params: Arc<ReverbParams>,
    /// `None` until the host has initialized us, or after allocation for
    /// the requested rate failed.
    reverb: Option<ReverbNetwork>,
}

impl Default for LovelessReverb {
    fn default() -> Self {
        Self {
            params: Arc::new(ReverbParams::default()),
            reverb: None,
        }
    }
}

impl Plugin for LovelessReverb {
    const NAME: &'static str = "Loveless Reverb";
    const VENDOR: &'static str = VENDOR;
    const URL: &'static str = "";
    const EMAIL: &'static str = EMAIL;
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = STEREO_LAYOUTS;
    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Decay and preset changes rebuild every loop gain, so parameters are
    // held for a whole block.
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
        // Drop the old network first so both never exist at once.
        self.reverb = None;
        match ReverbNetwork::new(buffer_config.sample_rate) {
            Ok(reverb) => {
                nih_log!("reverb initialized at {} Hz", buffer_config.sample_rate);
                self.reverb = Some(reverb);
                true
            }
            Err(err) => {
                nih_log!("reverb initialization failed: {err}");
                false
            }
        }
    }

    fn reset(&mut self) {
        if let Some(reverb) = &mut self.reverb {
            reverb.clear();
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let Some(reverb) = &mut self.reverb else {
            return ProcessStatus::Normal;
        };

        let settings = self.params.settings();
        if let Some((left, right)) = stereo(buffer) {
            reverb.process(&settings, left, right);
        }

        // Keep being called for the decay time after the input stops, or
        // the tail gets cut off when a region ends.
        ProcessStatus::Tail(reverb.tail_samples())
    }
}

impl ClapPlugin for LovelessReverb {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-reverb-v1";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Comb and allpass reverb with built-in room models");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Reverb,
    ];
}

impl Vst3Plugin for LovelessReverb {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssReverb_v001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Reverb];
}
