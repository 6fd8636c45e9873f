#![allow(clippy::unusual_byte_groupings)]
//! Field layout of EVT 2.0 raw words.
//!
//! The constants below are the single source of truth for bit offsets and
//! widths; the encoders write through them and the accessors read through
//! them, so a word produced by one is always readable by the other.

use crate::bits;
use crate::types::RawEvent;

/// Number of timestamp bits carried by every CD and trigger word.
pub const TS_LOW_BITS: u32 = 6;
/// Offset of the low timestamp field inside the payload.
pub const TS_LOW_OFFSET: u32 = 22;

// ============================================================================
// CD_OFF / CD_ON (type = 0x0 / 0x1)
// Bits: [31:28] type | [27:22] ts_low | [21:12] x | [11:0] y
// ============================================================================

/// Offset and width of the CD Y coordinate.
pub const CD_Y_OFFSET: u32 = 0;
pub const CD_Y_BITS: u32 = 12;
/// Offset and width of the CD X coordinate.
pub const CD_X_OFFSET: u32 = 12;
pub const CD_X_BITS: u32 = 10;
/// Width of the CD polarity, carried in the type field.
pub const CD_POLARITY_BITS: u32 = 1;

/// Extracts the Y coordinate from a CD word.
#[inline]
pub fn cd_get_y(raw: RawEvent) -> u16 {
    bits::extract(raw.payload(), CD_Y_OFFSET, CD_Y_BITS) as u16
}

/// Extracts the X coordinate from a CD word.
#[inline]
pub fn cd_get_x(raw: RawEvent) -> u16 {
    bits::extract(raw.payload(), CD_X_OFFSET, CD_X_BITS) as u16
}

/// Extracts the polarity from a CD word (the low bit of its type).
#[inline]
pub fn cd_get_polarity(raw: RawEvent) -> u8 {
    raw.kind() & 0x1
}

// ============================================================================
// EXT_TRIGGER (type = 0xA)
// Bits: [31:28] type | [27:22] ts_low | [21:13] unused | [12:8] id
//       | [7:1] unused | [0] value
// ============================================================================

/// Offset and width of the trigger value (edge polarity).
pub const TRIGGER_VALUE_OFFSET: u32 = 0;
pub const TRIGGER_VALUE_BITS: u32 = 1;
/// Offset and width of the trigger channel ID.
pub const TRIGGER_ID_OFFSET: u32 = 8;
pub const TRIGGER_ID_BITS: u32 = 5;

/// Extracts the trigger value from an EXT_TRIGGER word.
#[inline]
pub fn trigger_get_value(raw: RawEvent) -> u8 {
    bits::extract(raw.payload(), TRIGGER_VALUE_OFFSET, TRIGGER_VALUE_BITS) as u8
}

/// Extracts the trigger channel ID from an EXT_TRIGGER word.
#[inline]
pub fn trigger_get_id(raw: RawEvent) -> u8 {
    bits::extract(raw.payload(), TRIGGER_ID_OFFSET, TRIGGER_ID_BITS) as u8
}

// ============================================================================
// EVT_TIME_HIGH (type = 0x8)
// Bits: [31:28] type | [27:0] timestamp bits 33..6
// ============================================================================

/// Extracts the 28-bit time high value from an EVT_TIME_HIGH word.
#[inline]
pub fn time_high_get_value(raw: RawEvent) -> u32 {
    raw.payload()
}

/// Extracts the 6-bit low timestamp from a CD or EXT_TRIGGER word.
#[inline]
pub fn get_timestamp_low(raw: RawEvent) -> u8 {
    bits::extract(raw.payload(), TS_LOW_OFFSET, TS_LOW_BITS) as u8
}

/// Rebuilds a full timestamp from the last time high value and the low bits
/// of an event word.
#[inline]
pub fn expand_timestamp(time_high: u32, ts_low: u8) -> u64 {
    ((time_high as u64) << TS_LOW_BITS) | (ts_low as u64 & bits::mask64(TS_LOW_BITS))
}
