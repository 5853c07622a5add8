//! Signal-processing building blocks shared by the effects.

pub mod biquad;
pub mod coefficients;
pub mod comb;
pub mod delay_line;
pub mod filter;
pub mod modulation;
