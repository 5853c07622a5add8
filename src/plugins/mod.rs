//! # Host Bindings
//!
//! One nih-plug [`Plugin`] per effect. Each binding owns its parameters
//! and the effect state, and does three things:
//!
//! 1. **`initialize()`** builds the effect for the host's sample rate.
//!    This is the only place buffers are allocated; if that fails the
//!    host is told the configuration is unusable.
//! 2. **`reset()`** silences the effect without reallocating.
//! 3. **`process()`** reads the parameters once, hands the two channel
//!    slices to the effect, and reports how long the tail rings.
//!
//! All three effects are stereo in, stereo out. There is no mono layout:
//! crossfeed and stereo enhancement mean nothing on a single channel.

use std::num::NonZeroU32;

use nih_plug::prelude::*;

mod chorus;
mod crossfeed;
mod reverb;

pub use chorus::LovelessChorus;
pub use crossfeed::LovelessCrossfeed;
pub use reverb::LovelessReverb;

pub(crate) const VENDOR: &str = "Loveless Audio";
pub(crate) const EMAIL: &str = "steve.loveless@gmail.com";

pub(crate) const STEREO_LAYOUTS: &[AudioIOLayout] = &[AudioIOLayout {
    main_input_channels: NonZeroU32::new(2),
    main_output_channels: NonZeroU32::new(2),
    aux_input_ports: &[],
    aux_output_ports: &[],
    names: PortNames::const_default(),
}];

/// The left and right channels of a stereo buffer, or `None` when the host
/// handed over fewer than two.
pub(crate) fn stereo<'b>(buffer: &'b mut Buffer) -> Option<(&'b mut [f32], &'b mut [f32])> {
    match buffer.as_slice() {
        [left, right, ..] => Some((&mut **left, &mut **right)),
        _ => None,
    }
}
