//! EVT 2.0 event encoders.
//!
//! Each encoder packs one event into a single 32-bit [`RawEvent`]. Inputs are
//! masked to their field widths rather than validated: an `x` of 1024 is
//! stored as 0. Range checks, if wanted, belong to whoever produces the
//! events.
//!
//! CD and trigger words only carry the low 6 bits of the timestamp. The
//! remaining bits are carried by time high words from [`TimeHighEncoder`],
//! which must be emitted often enough for a reader to expand every event
//! timestamp with [`crate::parser::expand_timestamp`].

use crate::bits;
use crate::parser::{
    CD_POLARITY_BITS, CD_X_BITS, CD_X_OFFSET, CD_Y_BITS, CD_Y_OFFSET, TRIGGER_ID_BITS,
    TRIGGER_ID_OFFSET, TRIGGER_VALUE_BITS, TRIGGER_VALUE_OFFSET, TS_LOW_BITS, TS_LOW_OFFSET,
};
use crate::types::{RawEvent, RawEventType};

/// Encoder for CD events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CdEventEncoder {
    x: u16,
    y: u16,
    polarity: u8,
    ts_low: u8,
}

impl CdEventEncoder {
    /// Creates an encoder holding an all-zero OFF event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the event to encode, truncating each field to its wire width.
    ///
    /// Only the low 6 bits of `timestamp` are kept.
    #[inline]
    pub fn set_event(&mut self, x: u32, y: u32, polarity: u32, timestamp: u64) {
        self.x = (x & bits::mask(CD_X_BITS)) as u16;
        self.y = (y & bits::mask(CD_Y_BITS)) as u16;
        self.polarity = (polarity & bits::mask(CD_POLARITY_BITS)) as u8;
        self.ts_low = (timestamp & bits::mask64(TS_LOW_BITS)) as u8;
    }

    /// Writes the stored event into `raw`.
    ///
    /// Encoding does not change the encoder, so repeated calls produce the
    /// same word.
    #[inline]
    pub fn encode(&self, raw: &mut RawEvent) {
        let mut payload = bits::insert(0, CD_Y_OFFSET, CD_Y_BITS, self.y as u32);
        payload = bits::insert(payload, CD_X_OFFSET, CD_X_BITS, self.x as u32);
        payload = bits::insert(payload, TS_LOW_OFFSET, TS_LOW_BITS, self.ts_low as u32);
        raw.set_payload(payload);
        raw.set_kind(RawEventType::cd_for_polarity(self.polarity) as u8);
    }

    /// Returns the stored event as a fresh word.
    #[inline]
    pub fn to_raw(&self) -> RawEvent {
        let mut raw = RawEvent::new();
        self.encode(&mut raw);
        raw
    }
}

/// Encoder for external trigger events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerEventEncoder {
    value: u8,
    id: u8,
    ts_low: u8,
}

impl TriggerEventEncoder {
    /// Creates an encoder holding an all-zero trigger event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the trigger to encode, truncating each field to its wire width.
    #[inline]
    pub fn set_event(&mut self, value: u32, id: u32, timestamp: u64) {
        self.value = (value & bits::mask(TRIGGER_VALUE_BITS)) as u8;
        self.id = (id & bits::mask(TRIGGER_ID_BITS)) as u8;
        self.ts_low = (timestamp & bits::mask64(TS_LOW_BITS)) as u8;
    }

    /// Writes the stored trigger into `raw`. Unused payload bits are zero.
    #[inline]
    pub fn encode(&self, raw: &mut RawEvent) {
        let mut payload = bits::insert(
            0,
            TRIGGER_VALUE_OFFSET,
            TRIGGER_VALUE_BITS,
            self.value as u32,
        );
        payload = bits::insert(payload, TRIGGER_ID_OFFSET, TRIGGER_ID_BITS, self.id as u32);
        payload = bits::insert(payload, TS_LOW_OFFSET, TS_LOW_BITS, self.ts_low as u32);
        raw.set_payload(payload);
        raw.set_kind(RawEventType::ExtTrigger as u8);
    }

    /// Returns the stored trigger as a fresh word.
    #[inline]
    pub fn to_raw(&self) -> RawEvent {
        let mut raw = RawEvent::new();
        self.encode(&mut raw);
        raw
    }
}

/// Number of timestamp bits covered by one time high value.
pub const TH_STEP: u64 = 1 << TS_LOW_BITS;
/// How many time high words are emitted per [`TH_STEP`].
pub const REDUNDANCY_FACTOR: u64 = 4;
/// Amount the clock advances on every emitted time high word.
pub const TH_NEXT_STEP: u64 = TH_STEP / REDUNDANCY_FACTOR;

/// Encoder for time high words.
///
/// Holds the timestamp of the next time high word to emit. The clock is kept
/// a multiple of [`TH_NEXT_STEP`] and advances by that amount on every
/// [`encode`](Self::encode), so four consecutive words carry the same value
/// before it increments.
///
/// One instance belongs to one stream. It is not synchronised; share it
/// across threads only behind a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeHighEncoder {
    th: u64,
}

impl TimeHighEncoder {
    /// Creates an encoder whose first word covers `base` (in microseconds).
    pub fn new(base: u64) -> Self {
        Self {
            th: Self::quantize(base),
        }
    }

    /// Returns the timestamp the next time high word will be built from.
    #[inline]
    pub fn peek(&self) -> u64 {
        self.th
    }

    /// Restarts the clock at `base`, discarding previous progress.
    pub fn reset(&mut self, base: u64) {
        self.th = Self::quantize(base);
    }

    /// Writes a time high word for the current clock and advances the clock
    /// by [`TH_NEXT_STEP`].
    #[inline]
    pub fn encode(&mut self, raw: &mut RawEvent) {
        raw.set_payload((self.th >> TS_LOW_BITS) as u32);
        raw.set_kind(RawEventType::TimeHigh as u8);
        self.th = self.th.wrapping_add(TH_NEXT_STEP);
    }

    /// Emits the next time high word as a fresh word.
    #[inline]
    pub fn next_raw(&mut self) -> RawEvent {
        let mut raw = RawEvent::new();
        self.encode(&mut raw);
        raw
    }

    #[inline]
    fn quantize(base: u64) -> u64 {
        base & !(TH_NEXT_STEP - 1)
    }
}

impl Default for TimeHighEncoder {
    fn default() -> Self {
        Self::new(0)
    }
}
