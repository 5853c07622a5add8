//! # Ring Buffer (Delay Line)
//!
//! A ring buffer stores the most recent `capacity` samples and lets you
//! read any of them back. It is the building block of the comb and
//! allpass filters in the reverb and of every modulated tap in the
//! chorus/flanger.
//!
//! ## How It Works
//!
//! Picture a circular tape loop with a single write head. Each call to
//! [`push`](RingBuffer::push):
//!
//! 1. Captures the sample currently under the head. That sample was
//!    written exactly `capacity` pushes ago and is about to be lost.
//! 2. Records the new sample in its place.
//! 3. Moves the head forward one slot, wrapping to 0 at the end.
//!
//! Reads never move the head. [`read_delayed(0)`](RingBuffer::read_delayed)
//! is the most recent push, `read_delayed(1)` the one before it, and so on
//! up to `capacity - 1`, the oldest sample still stored.
//!
//! ## Fractional Reads
//!
//! Modulated delays rarely land on whole samples. A read at offset `n + f`
//! blends the two neighbouring samples:
//!
//! ```text
//! result = (1 - f) * read_delayed(n) + f * read_delayed(n + 1)
//! ```
//!
//! ## Sizing
//!
//! The capacity is fixed at construction from the longest delay an effect
//! can ask for and never changes. Changing a delay time only moves where
//! we read.

use std::num::NonZeroUsize;

use nih_plug::nih_debug_assert;

use crate::error::{zeroed_buffer, DspError};

/// A fixed-capacity circular sample store with a write cursor.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// The stored samples. All values start at 0.0 (silence).
    buffer: Vec<f32>,

    /// The slot the next push writes to. It always holds the oldest sample.
    write_pos: usize,
}

impl RingBuffer {
    /// Allocate a silent ring buffer holding `capacity` samples.
    pub fn with_capacity(capacity: NonZeroUsize) -> Result<Self, DspError> {
        Ok(Self {
            buffer: zeroed_buffer("ring buffer", capacity.get())?,
            write_pos: 0,
        })
    }

    /// Allocate a ring buffer long enough for `max_delay_ms` at `sample_rate`:
    /// `ceil(max_delay_ms * sample_rate / 1000)` samples.
    pub fn for_duration(max_delay_ms: f32, sample_rate: f32) -> Result<Self, DspError> {
        Self::for_duration_with_headroom(max_delay_ms, sample_rate, 0)
    }

    /// Like [`for_duration`](Self::for_duration), plus `headroom` extra
    /// slots for readers that look past the nominal delay. A duration that
    /// rounds to zero samples is still an error, whatever the headroom.
    pub fn for_duration_with_headroom(
        max_delay_ms: f32,
        sample_rate: f32,
        headroom: usize,
    ) -> Result<Self, DspError> {
        let samples = (f64::from(max_delay_ms) * f64::from(sample_rate) / 1000.0).ceil();
        let capacity = NonZeroUsize::new(samples.max(0.0) as usize)
            .and_then(|base| base.checked_add(headroom))
            .ok_or(DspError::EmptyBuffer {
                what: "ring buffer",
            })?;
        Self::with_capacity(capacity)
    }

    /// Number of samples the buffer holds.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Store `sample` and return the one it displaced, written `capacity`
    /// pushes ago.
    #[inline]
    pub fn push(&mut self, sample: f32) -> f32 {
        let evicted = std::mem::replace(&mut self.buffer[self.write_pos], sample);
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
        evicted
    }

    /// The sample pushed `offset + 1` pushes ago (`offset` 0 = most recent).
    ///
    /// `offset` must be below [`capacity`](Self::capacity). Callers derive
    /// offsets from delay times and clamp them first.
    #[inline]
    pub fn read_delayed(&self, offset: usize) -> f32 {
        let len = self.buffer.len();
        nih_debug_assert!(offset < len, "ring buffer offset {} >= capacity {}", offset, len);

        // Stepping back `offset + 1` slots from the write head, kept
        // non-negative by adding `len` before the subtraction.
        let index = (self.write_pos + len - 1 - offset % len) % len;
        self.buffer[index]
    }

    /// Linearly interpolate between offsets `offset` and `offset + 1`.
    #[inline]
    pub fn read_fractional(&self, offset: usize, frac: f32) -> f32 {
        let a = self.read_delayed(offset);
        let b = self.read_delayed(offset + 1);
        (1.0 - frac) * a + frac * b
    }

    /// Read at a fractional position, e.g. `12.3` samples back.
    ///
    /// The position is clamped to `[0, capacity - 1]`.
    #[inline]
    pub fn read_interpolated(&self, position: f32) -> f32 {
        let max = (self.buffer.len() - 1) as f32;
        let position = position.clamp(0.0, max);
        let offset = position as usize;
        let frac = position - offset as f32;

        if frac == 0.0 {
            self.read_delayed(offset)
        } else {
            self.read_fractional(offset, frac)
        }
    }

    /// Zero the contents and rewind the cursor. Capacity is kept.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ring(capacity: usize) -> RingBuffer {
        RingBuffer::with_capacity(NonZeroUsize::new(capacity).unwrap()).unwrap()
    }

    #[test]
    fn test_capacity_from_duration() {
        // 250 ms at 44.1 kHz = 11025 samples exactly.
        let rb = RingBuffer::for_duration(250.0, 44100.0).unwrap();
        assert_eq!(rb.capacity(), 11025);

        // 20 ms at 44.1 kHz = 882 samples exactly.
        let rb = RingBuffer::for_duration(20.0, 44100.0).unwrap();
        assert_eq!(rb.capacity(), 882);

        // Fractional results round up: 1 ms at 22.05 kHz = 22.05 -> 23.
        let rb = RingBuffer::for_duration(1.0, 22050.0).unwrap();
        assert_eq!(rb.capacity(), 23);
    }

    #[test]
    fn test_zero_duration_is_an_error() {
        let err = RingBuffer::for_duration(100.0, 0.0).unwrap_err();
        assert!(matches!(err, DspError::EmptyBuffer { .. }));

        // Headroom alone does not make an empty buffer usable.
        let err = RingBuffer::for_duration_with_headroom(100.0, 0.0, 2).unwrap_err();
        assert!(matches!(err, DspError::EmptyBuffer { .. }));
    }

    #[test]
    fn test_headroom_is_added_to_duration() {
        let rb = RingBuffer::for_duration_with_headroom(100.0, 44100.0, 1).unwrap();
        assert_eq!(rb.capacity(), 4411);
    }

    /// Push returns the sample written exactly `capacity` pushes ago.
    #[test]
    fn test_push_returns_evicted() {
        let mut rb = ring(3);
        assert_eq!(rb.push(1.0), 0.0);
        assert_eq!(rb.push(2.0), 0.0);
        assert_eq!(rb.push(3.0), 0.0);
        assert_eq!(rb.push(4.0), 1.0);
        assert_eq!(rb.push(5.0), 2.0);
    }

    /// Reading back in order: most recent first.
    #[test]
    fn test_fifo_sequence() {
        let mut rb = ring(10);
        for i in 1..=5 {
            rb.push(i as f32);
        }

        assert_eq!(rb.read_delayed(0), 5.0);
        assert_eq!(rb.read_delayed(1), 4.0);
        assert_eq!(rb.read_delayed(2), 3.0);
        assert_eq!(rb.read_delayed(3), 2.0);
        assert_eq!(rb.read_delayed(4), 1.0);
        assert_eq!(rb.read_delayed(5), 0.0);
    }

    /// Writes past the end wrap around and overwrite the oldest samples.
    #[test]
    fn test_wrapping() {
        let mut rb = ring(4);
        for i in 0..6 {
            rb.push(i as f32);
        }

        // Buffer now holds 2, 3, 4, 5 (oldest to newest).
        assert_eq!(rb.read_delayed(0), 5.0);
        assert_eq!(rb.read_delayed(3), 2.0);
    }

    #[test]
    fn test_fractional_read() {
        let mut rb = ring(8);
        rb.push(0.0);
        rb.push(1.0);

        // Offset 0 holds 1.0, offset 1 holds 0.0.
        assert!((rb.read_fractional(0, 0.5) - 0.5).abs() < 1e-6);
        assert!((rb.read_fractional(0, 0.25) - 0.75).abs() < 1e-6);
        assert!((rb.read_interpolated(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(rb.read_interpolated(0.0), 1.0);
    }

    /// Positions beyond the buffer clamp to the oldest sample.
    #[test]
    fn test_interpolated_read_clamps() {
        let mut rb = ring(4);
        for i in 1..=4 {
            rb.push(i as f32);
        }
        assert_eq!(rb.read_interpolated(100.0), 1.0);
        assert_eq!(rb.read_interpolated(-3.0), 4.0);
    }

    #[test]
    fn test_clear() {
        let mut rb = ring(10);
        rb.push(0.5);
        rb.clear();

        assert_eq!(rb.capacity(), 10);
        for offset in 0..10 {
            assert_eq!(rb.read_delayed(offset), 0.0);
        }
    }

    proptest! {
        /// Pushing `capacity` distinct values and reading offsets
        /// `0..capacity` gives them back in reverse push order.
        #[test]
        fn ring_buffer_round_trip(
            capacity in 1usize..512,
            warmup in 0usize..1024,
        ) {
            let mut rb = ring(capacity);
            for i in 0..warmup {
                rb.push(-(i as f32));
            }

            let values: Vec<f32> = (0..capacity).map(|i| i as f32 + 1.0).collect();
            for &v in &values {
                rb.push(v);
            }

            for offset in 0..capacity {
                prop_assert_eq!(rb.read_delayed(offset), values[capacity - 1 - offset]);
            }
        }
    }
}
