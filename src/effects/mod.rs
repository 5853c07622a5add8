//! The three effects, each a self-contained stereo processor that owns all
//! of its state.

pub mod chorus;
pub mod crossfeed;
pub mod reverb;
pub mod reverb_presets;
pub mod sample_format;
