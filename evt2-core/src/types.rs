//! Core types for EVT 2.0 event data.
//!
//! This module defines the 32-bit raw word, the raw event type codes and the
//! semantic event structures that are fed to the encoders.

use crate::{bits, parser};

/// Width of the type field in bits.
pub const KIND_BITS: u32 = 4;
/// Width of the payload field in bits.
pub const PAYLOAD_BITS: u32 = 28;

/// EVT 2.0 raw event types.
///
/// The 4-bit type field in the MSBs of every 32-bit word selects how the
/// remaining 28 bits are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RawEventType {
    /// OFF CD event, decrease in illumination (0x0)
    CdOff = 0x0,
    /// ON CD event, increase in illumination (0x1)
    CdOn = 0x1,
    /// Upper bits of the timebase, bits 33..6 (0x8)
    TimeHigh = 0x8,
    /// External trigger edge (0xA)
    ExtTrigger = 0xA,
}

impl RawEventType {
    /// Attempts to parse an event type from a 4-bit value.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(Self::CdOff),
            0x1 => Some(Self::CdOn),
            0x8 => Some(Self::TimeHigh),
            0xA => Some(Self::ExtTrigger),
            _ => None,
        }
    }

    /// Returns the CD type code for a polarity. Only bit 0 is looked at.
    #[inline]
    pub fn cd_for_polarity(polarity: u8) -> Self {
        if polarity & 0x1 == 1 {
            Self::CdOn
        } else {
            Self::CdOff
        }
    }
}

/// A raw EVT 2.0 word.
///
/// Bits 0..=27 hold the payload, bits 28..=31 the event type. Writes to either
/// field keep only the low bits that fit; nothing is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RawEvent(u32);

impl RawEvent {
    /// Creates a word with both fields zeroed.
    #[inline]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Wraps an already packed 32-bit word.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the packed 32-bit word, `payload | (kind << 28)`.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns the 4-bit type field.
    #[inline]
    pub fn kind(self) -> u8 {
        bits::extract(self.0, PAYLOAD_BITS, KIND_BITS) as u8
    }

    /// Returns the 28-bit payload field.
    #[inline]
    pub fn payload(self) -> u32 {
        bits::extract(self.0, 0, PAYLOAD_BITS)
    }

    /// Sets the type field, truncated to 4 bits.
    #[inline]
    pub fn set_kind(&mut self, kind: u8) {
        self.0 = bits::insert(self.0, PAYLOAD_BITS, KIND_BITS, kind as u32);
    }

    /// Sets the payload field, truncated to 28 bits.
    #[inline]
    pub fn set_payload(&mut self, payload: u32) {
        self.0 = bits::insert(self.0, 0, PAYLOAD_BITS, payload);
    }

    /// Parses the type field into a known event type.
    #[inline]
    pub fn event_type(self) -> Option<RawEventType> {
        RawEventType::from_u8(self.kind())
    }

    /// Returns the word as it is laid out on disk.
    #[inline]
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Reads a word from its on-disk layout.
    #[inline]
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }
}

impl From<u32> for RawEvent {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<RawEvent> for u32 {
    fn from(event: RawEvent) -> Self {
        event.0
    }
}

/// A Change Detection (CD) event before encoding.
///
/// CD events represent brightness changes detected by the event camera sensor.
/// The timestamp is the full microsecond value; only its low 6 bits end up in
/// the CD word, the rest travels in time high words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct CdEvent {
    /// X coordinate of the pixel (0-1023)
    pub x: u16,
    /// Y coordinate of the pixel (0-4095)
    pub y: u16,
    /// Event polarity: 0 = OFF (decrease), 1 = ON (increase in brightness)
    pub polarity: u8,
    /// Timestamp in microseconds
    pub timestamp: u64,
}

impl CdEvent {
    /// Creates a new CD event.
    #[inline]
    pub fn new(x: u16, y: u16, polarity: u8, timestamp: u64) -> Self {
        Self {
            x,
            y,
            polarity,
            timestamp,
        }
    }
}

/// An external trigger event before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct TriggerEvent {
    /// Trigger value (edge polarity): 0 = falling edge, 1 = rising edge
    pub value: u8,
    /// Trigger channel ID (0-31)
    pub id: u8,
    /// Timestamp in microseconds
    pub timestamp: u64,
}

impl TriggerEvent {
    /// Creates a new trigger event.
    #[inline]
    pub fn new(value: u8, id: u8, timestamp: u64) -> Self {
        Self {
            value,
            id,
            timestamp,
        }
    }
}

/// Sensor geometry written to the raw file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorMetadata {
    /// Sensor width in pixels
    pub width: u32,
    /// Sensor height in pixels
    pub height: u32,
}

impl SensorMetadata {
    /// Returns true when every pixel coordinate fits the CD word fields
    /// (10-bit x, 12-bit y).
    pub fn fits_cd_fields(&self) -> bool {
        let max_width = 1u32 << parser::CD_X_BITS;
        let max_height = 1u32 << parser::CD_Y_BITS;
        self.width <= max_width && self.height <= max_height
    }
}

impl Default for SensorMetadata {
    fn default() -> Self {
        // VGA (Gen3) geometry
        Self {
            width: 640,
            height: 480,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_event_type_parsing() {
        assert_eq!(RawEventType::from_u8(0x0), Some(RawEventType::CdOff));
        assert_eq!(RawEventType::from_u8(0x1), Some(RawEventType::CdOn));
        assert_eq!(RawEventType::from_u8(0x8), Some(RawEventType::TimeHigh));
        assert_eq!(RawEventType::from_u8(0xA), Some(RawEventType::ExtTrigger));
        assert_eq!(RawEventType::from_u8(0x2), None);
        assert_eq!(RawEventType::from_u8(0xE), None);
    }

    #[test]
    fn test_sensor_geometry_fits_cd_fields() {
        assert!(SensorMetadata::default().fits_cd_fields());
        assert!(SensorMetadata { width: 1024, height: 4096 }.fits_cd_fields());
        assert!(!SensorMetadata { width: 1280, height: 720 }.fits_cd_fields());
        assert!(!SensorMetadata { width: 640, height: 4097 }.fits_cd_fields());
    }

    #[test]
    fn test_raw_event_starts_zeroed() {
        let raw = RawEvent::new();
        assert_eq!(raw.kind(), 0);
        assert_eq!(raw.payload(), 0);
        assert_eq!(raw, RawEvent::default());
    }

    #[test]
    fn test_raw_event_fields_do_not_overlap() {
        let mut raw = RawEvent::new();
        raw.set_payload(0x0FFF_FFFF);
        assert_eq!(raw.kind(), 0);

        raw.set_kind(0xF);
        assert_eq!(raw.payload(), 0x0FFF_FFFF);
        assert_eq!(raw.bits(), 0xFFFF_FFFF);

        raw.set_payload(0);
        assert_eq!(raw.bits(), 0xF000_0000);
    }

    #[test]
    fn test_raw_event_truncates_wide_values() {
        let mut raw = RawEvent::new();
        raw.set_kind(0x1A);
        raw.set_payload(0xF123_4567);
        assert_eq!(raw.kind(), 0xA);
        assert_eq!(raw.payload(), 0x0123_4567);
        assert_eq!(raw.event_type(), Some(RawEventType::ExtTrigger));
    }

    #[test]
    fn test_raw_event_byte_layout() {
        let raw = RawEvent::from_bits(0x8000_0001);
        assert_eq!(raw.to_le_bytes(), [0x01, 0x00, 0x00, 0x80]);
        assert_eq!(RawEvent::from_le_bytes(raw.to_le_bytes()), raw);
    }

    #[test]
    fn test_cd_type_for_polarity() {
        assert_eq!(RawEventType::cd_for_polarity(0), RawEventType::CdOff);
        assert_eq!(RawEventType::cd_for_polarity(1), RawEventType::CdOn);
        assert_eq!(RawEventType::cd_for_polarity(3), RawEventType::CdOn);
    }
}
