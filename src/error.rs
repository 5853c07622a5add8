//! # Construction Errors
//!
//! Every buffer in this crate is allocated exactly once, when an effect
//! instance is constructed for a given sample rate. If that allocation
//! can't happen the instance must not exist at all, so constructors return
//! `Result<Self, DspError>` instead of a half-built object.
//!
//! Out-of-range *parameters* are never errors. They are clamped to the
//! nearest valid value and processing continues.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur while building an effect instance.
#[derive(Debug, Error)]
pub enum DspError {
    /// A buffer would have zero capacity, e.g. because the sample rate is 0.
    #[error("{what} would have zero capacity")]
    EmptyBuffer {
        /// Which buffer was being sized.
        what: &'static str,
    },

    /// The allocator refused to reserve the requested buffer.
    #[error("failed to allocate {capacity} samples for {what}: {source}")]
    Allocation {
        /// Which buffer was being allocated.
        what: &'static str,
        /// Requested capacity in samples.
        capacity: usize,
        /// Underlying allocator error.
        #[source]
        source: TryReserveError,
    },
}

/// Allocate a zero-filled sample buffer, reporting failure instead of aborting.
pub(crate) fn zeroed_buffer<T: Copy + Default>(
    what: &'static str,
    len: usize,
) -> Result<Vec<T>, DspError> {
    if len == 0 {
        return Err(DspError::EmptyBuffer { what });
    }

    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|source| DspError::Allocation {
            what,
            capacity: len,
            source,
        })?;
    buffer.resize(len, T::default());
    Ok(buffer)
}
