//! Headphone crossfeed plugin.

use std::sync::Arc;

use nih_plug::prelude::*;

use super::{stereo, EMAIL, STEREO_LAYOUTS, VENDOR};
use crate::dsp::coefficients::DEFAULT_SAMPLE_RATE;
use crate::effects::crossfeed::Crossfeed;
use crate::params::CrossfeedParams;

pub struct LovelessCrossfeed {
    params: Arc<CrossfeedParams>,
    /// Needs no allocation, so unlike the other effects it exists from the
    /// start and only has its rate updated in `initialize()`.
    crossfeed: Crossfeed,
}

impl Default for LovelessCrossfeed {
    fn default() -> Self {
        let params = Arc::new(CrossfeedParams::default());
        let crossfeed = Crossfeed::new(params.level(), DEFAULT_SAMPLE_RATE);
        Self { params, crossfeed }
    }
}

impl Plugin for LovelessCrossfeed {
    const NAME: &'static str = "Loveless Crossfeed";
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
        // Rates outside 2 kHz..192 kHz fall back to 44.1 kHz coefficients
        // with a warning from the effect itself.
        self.crossfeed
            .set_sample_rate(buffer_config.sample_rate.round() as u32);
        self.crossfeed.set_level(self.params.level());
        nih_log!(
            "crossfeed initialized at {} Hz, level {}",
            self.crossfeed.sample_rate(),
            self.crossfeed.level().index()
        );
        true
    }

    fn reset(&mut self) {
        self.crossfeed.clear();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // Same level as last block is a no-op, so this is cheap to call
        // unconditionally.
        self.crossfeed.set_level(self.params.level());

        if let Some((left, right)) = stereo(buffer) {
            self.crossfeed.process_planar(left, right);
        }

        ProcessStatus::Normal
    }
}

impl ClapPlugin for LovelessCrossfeed {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-crossfeed-v1";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("bs2b headphone crossfeed for more natural stereo on headphones");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Utility,
    ];
}

impl Vst3Plugin for LovelessCrossfeed {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssXfeed__v001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Spatial];
}
