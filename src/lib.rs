//! # Loveless Spatial: Crossfeed, Reverb and Chorus as AU/VST3/CLAP Plugins
//!
//! Three stereo effects built with [nih-plug](https://github.com/robbert-vdh/nih-plug)
//! that change where a sound seems to sit in space. One codebase builds
//! Audio Unit (AUv2), VST3 and CLAP versions of each.
//!
//! The DSP lives in [`dsp`] (filters, delay lines, modulators) and
//! [`effects`] (the three processors built from them). Neither knows
//! anything about plugin hosts, so both can be used and tested as a plain
//! library. The private `plugins` module wires them to nih-plug.
//!
//! ## Crossfeed (bs2b)
//!
//! On headphones each ear hears only its own channel, which pins hard
//! panned sounds inside the head. Crossfeed leaks a delayed, darkened copy
//! of each channel into the other ear, like listening to speakers does:
//!
//! ```text
//!  L ──┬──► [Highboost] ────────────────►(+)──► × gain ──► clip ──► L'
//!      │                                  ▲
//!      └──► [Lowpass] ──────────┐         │
//!                               ╳─────────┘
//!      ┌──► [Lowpass] ──────────┘         │
//!      │                                  ▼
//!  R ──┴──► [Highboost] ────────────────►(+)──► × gain ──► clip ──► R'
//! ```
//!
//! ## Reverb
//!
//! A bank of parallel feedback combs builds the body of the tail; a chain
//! of allpasses smears its echoes into a wash; a bandpass keeps the result
//! out of the mud and the fizz. Every stage can be switched off.
//!
//! ```text
//! Input ──┬──────────────────────────────────────────── × dry ───┐
//!         │                                                      │
//!         ├──► [Comb 1] ──┐                                      │
//!         ├──► [Comb 2] ──┤                                      │
//!         │      ...      ├──►(+)──► [Allpass 1..N] ──► [Bandpass] ──► × wet ──►(+)──► Output
//!         ├──► [Comb N] ──┘    ▲
//!         └────────────────────┘
//! ```
//!
//! ## Chorus / Flanger
//!
//! The input is read back from a short buffer at a moving position, then
//! delayed again by a fixed amount. A sine LFO moves the position smoothly;
//! fractal mode moves it along a random curve with adjustable roughness.
//!
//! ```text
//! Input ──┬────────────────────────────────────────────── × dry ───┐
//!         │                                                        │
//!         └──► [Sweep Buffer] ──► [Fixed Delay] ──► [Highpass] ──► × wet ──►(+)──► Output
//!                    ▲
//!              [Sine / Fractal]
//! ```

pub mod dsp;
pub mod effects;
pub mod error;
mod params;
mod plugins;

use nih_plug::prelude::*;

pub use error::DspError;
pub use plugins::{LovelessChorus, LovelessCrossfeed, LovelessReverb};

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// These macros generate the C-compatible entry points that the host
// DAW uses to discover and load the plugins. All three effects share one
// binary, so each macro lists every plugin.
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts.
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.

nih_export_clap!(LovelessCrossfeed, LovelessReverb, LovelessChorus);
nih_export_vst3!(LovelessCrossfeed, LovelessReverb, LovelessChorus);

// Wrap the CLAP plugins into AUv2 format for Logic Pro.
// This generates a `GetPluginFactoryAUV2` entry point that macOS uses
// to discover them as Audio Unit components.
clap_wrapper::export_auv2!();
