//! Stream encoding of time-ordered events.
//!
//! [`StreamEncoder`] drives the three word encoders so that the produced word
//! sequence can be decoded unambiguously: every CD or trigger word is preceded
//! by a time high word whose value equals bits 6 and up of the event
//! timestamp.

use crate::encoder::{
    CdEventEncoder, TimeHighEncoder, TriggerEventEncoder, REDUNDANCY_FACTOR, TH_STEP,
};
use crate::types::{CdEvent, RawEvent, TriggerEvent};
use log::{debug, warn};

/// Counters collected while encoding a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// CD events encoded
    pub cd_events: u64,
    /// Trigger events encoded
    pub trigger_events: u64,
    /// Time high words emitted
    pub time_high_words: u64,
    /// Times the clock was restarted (first event, gaps, backward jumps)
    pub resyncs: u64,
}

impl StreamStats {
    /// Total number of words emitted.
    pub fn total_words(&self) -> u64 {
        self.cd_events + self.trigger_events + self.time_high_words
    }
}

/// Encodes a stream of events into EVT 2.0 words.
///
/// Events are expected in non-decreasing timestamp order. Before each event
/// the time high clock is advanced until it has passed the event timestamp,
/// emitting a time high word per step. Idle gaps of 64us or more and
/// timestamps that go backwards restart the clock at the event instead.
#[derive(Debug, Default)]
pub struct StreamEncoder {
    time_encoder: TimeHighEncoder,
    cd_encoder: CdEventEncoder,
    trigger_encoder: TriggerEventEncoder,
    // Timestamp (low 6 bits cleared) of the last time high word emitted
    last_base: Option<u64>,
    words: Vec<RawEvent>,
    stats: StreamStats,
}

impl StreamEncoder {
    /// Creates an empty stream encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stream encoder with room for `capacity` words.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Encodes a CD event, preceded by any time high words it needs.
    pub fn push_cd(&mut self, event: &CdEvent) {
        self.sync_time(event.timestamp);
        self.cd_encoder.set_event(
            event.x.into(),
            event.y.into(),
            event.polarity.into(),
            event.timestamp,
        );
        self.words.push(self.cd_encoder.to_raw());
        self.stats.cd_events += 1;
    }

    /// Encodes a trigger event, preceded by any time high words it needs.
    pub fn push_trigger(&mut self, event: &TriggerEvent) {
        self.sync_time(event.timestamp);
        self.trigger_encoder
            .set_event(event.value.into(), event.id.into(), event.timestamp);
        self.words.push(self.trigger_encoder.to_raw());
        self.stats.trigger_events += 1;
    }

    /// Encodes all CD events.
    pub fn push_cd_events(&mut self, events: &[CdEvent]) {
        self.words.reserve(events.len() + events.len() / 16);
        for event in events {
            self.push_cd(event);
        }
    }

    /// Encodes two time-sorted event lists, merged by timestamp.
    ///
    /// On equal timestamps the trigger is written first.
    pub fn encode_merged(&mut self, cd_events: &[CdEvent], trigger_events: &[TriggerEvent]) {
        self.words
            .reserve(cd_events.len() + trigger_events.len() + cd_events.len() / 16);

        let mut cd = cd_events.iter().peekable();
        let mut triggers = trigger_events.iter().peekable();

        loop {
            match (cd.peek(), triggers.peek()) {
                (Some(c), Some(t)) if t.timestamp <= c.timestamp => {
                    self.push_trigger(t);
                    triggers.next();
                }
                (Some(c), _) => {
                    self.push_cd(c);
                    cd.next();
                }
                (None, Some(t)) => {
                    self.push_trigger(t);
                    triggers.next();
                }
                (None, None) => break,
            }
        }
    }

    /// Words produced so far and not yet taken.
    pub fn words(&self) -> &[RawEvent] {
        &self.words
    }

    /// Takes the words produced so far. The clock state is kept, so the
    /// next pushed event continues the same stream.
    pub fn take_words(&mut self) -> Vec<RawEvent> {
        std::mem::take(&mut self.words)
    }

    /// Returns the counters collected so far.
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Returns the time high encoder driving this stream.
    pub fn time_encoder(&self) -> &TimeHighEncoder {
        &self.time_encoder
    }

    /// Drops pending words and clock state to start a new stream.
    pub fn reset(&mut self) {
        self.time_encoder.reset(0);
        self.last_base = None;
        self.words.clear();
        self.stats = StreamStats::default();
    }

    fn sync_time(&mut self, timestamp: u64) {
        let resync = match self.last_base {
            None => true,
            Some(base) if timestamp < base => {
                warn!(
                    "event timestamp {}us is before current time base {}us, restarting clock",
                    timestamp, base
                );
                true
            }
            Some(_) => timestamp >= self.time_encoder.peek().saturating_add(TH_STEP),
        };

        if resync {
            debug!("time high clock restarted at {}us", timestamp);
            self.time_encoder.reset(timestamp);
            self.stats.resyncs += 1;
            self.emit_time_high();
        }

        // Outside a restart at most one step per redundant word is needed.
        // The clock may also have wrapped past u64::MAX, leaving it below the
        // last base.
        for _ in 0..REDUNDANCY_FACTOR {
            let next = self.time_encoder.peek();
            let wrapped = self.last_base.map_or(false, |base| next < base);
            if timestamp < next || wrapped {
                break;
            }
            self.emit_time_high();
        }
    }

    #[inline]
    fn emit_time_high(&mut self) {
        self.last_base = Some(self.time_encoder.peek() & !(TH_STEP - 1));
        self.words.push(self.time_encoder.next_raw());
        self.stats.time_high_words += 1;
    }
}

/// Encodes time-sorted CD events into a standalone word stream.
pub fn encode_cd_events(events: &[CdEvent]) -> Vec<RawEvent> {
    let mut encoder = StreamEncoder::new();
    encoder.push_cd_events(events);
    encoder.take_words()
}
