//! # Sample Formats
//!
//! The crossfeed works on `f64` samples in `[-1, 1]`. Audio rarely arrives
//! that way, so every storage format gets a pair of conversions into and
//! out of that range:
//!
//! | Format | Full scale      | Notes                                   |
//! |--------|-----------------|-----------------------------------------|
//! | `f64`  | 1.0             | passed through                          |
//! | `f32`  | 1.0             | widened / narrowed                      |
//! | `i32`  | 2147483647      |                                         |
//! | `i16`  | 32767           |                                         |
//! | `i8`   | 127             |                                         |
//! | `u8`   | 127             | offset binary, silence is `0x80`        |
//! | 24-bit | 8388607         | 3 little-endian bytes, see [`unpack_i24`] |
//!
//! Converting back truncates toward zero. The crossfeed clips to `[-1, 1]`
//! first, so the integer casts never overflow.

/// A sample representation the crossfeed can process in place.
pub trait CrossfeedSample: Copy {
    /// Normalize to an `f64`, nominally in `[-1, 1]`.
    fn to_unit(self) -> f64;

    /// Convert a value in `[-1, 1]` back to this representation.
    fn from_unit(value: f64) -> Self;
}

/// Full-scale value of a 24-bit sample.
pub const I24_FULL_SCALE: f64 = 8_388_607.0;

const I32_FULL_SCALE: f64 = 2_147_483_647.0;
const I16_FULL_SCALE: f64 = 32_767.0;
const I8_FULL_SCALE: f64 = 127.0;

/// Flips the sign bit between two's complement and offset binary.
const U8_OFFSET: u8 = 0x80;

impl CrossfeedSample for f64 {
    #[inline]
    fn to_unit(self) -> f64 {
        self
    }

    #[inline]
    fn from_unit(value: f64) -> Self {
        value
    }
}

impl CrossfeedSample for f32 {
    #[inline]
    fn to_unit(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_unit(value: f64) -> Self {
        value as f32
    }
}

impl CrossfeedSample for i32 {
    #[inline]
    fn to_unit(self) -> f64 {
        f64::from(self) / I32_FULL_SCALE
    }

    #[inline]
    fn from_unit(value: f64) -> Self {
        (value * I32_FULL_SCALE) as i32
    }
}

impl CrossfeedSample for i16 {
    #[inline]
    fn to_unit(self) -> f64 {
        f64::from(self) / I16_FULL_SCALE
    }

    #[inline]
    fn from_unit(value: f64) -> Self {
        (value * I16_FULL_SCALE) as i16
    }
}

impl CrossfeedSample for i8 {
    #[inline]
    fn to_unit(self) -> f64 {
        f64::from(self) / I8_FULL_SCALE
    }

    #[inline]
    fn from_unit(value: f64) -> Self {
        (value * I8_FULL_SCALE) as i8
    }
}

impl CrossfeedSample for u8 {
    #[inline]
    fn to_unit(self) -> f64 {
        f64::from((self ^ U8_OFFSET) as i8) / I8_FULL_SCALE
    }

    #[inline]
    fn from_unit(value: f64) -> Self {
        ((value * I8_FULL_SCALE) as i8 as u8) ^ U8_OFFSET
    }
}

/// Decode three little-endian bytes as a signed 24-bit integer.
///
/// Bit 23 is the sign bit; when it is set the upper byte of the result is
/// filled with ones.
#[inline]
pub fn unpack_i24(bytes: [u8; 3]) -> i32 {
    let raw = u32::from(bytes[0]) | (u32::from(bytes[1]) << 8) | (u32::from(bytes[2]) << 16);
    if raw & 0x0080_0000 != 0 {
        (raw | 0xFF00_0000) as i32
    } else {
        raw as i32
    }
}

/// Encode the low 24 bits of `value` as three little-endian bytes.
#[inline]
pub fn pack_i24(value: i32) -> [u8; 3] {
    [value as u8, (value >> 8) as u8, (value >> 16) as u8]
}

/// A packed 24-bit sample normalized to `[-1, 1]`.
#[inline]
pub fn i24_to_unit(bytes: [u8; 3]) -> f64 {
    f64::from(unpack_i24(bytes)) / I24_FULL_SCALE
}

/// A normalized sample packed as 24 bits.
#[inline]
pub fn unit_to_i24(value: f64) -> [u8; 3] {
    pack_i24((value * I24_FULL_SCALE) as i32)
}
