//! Integration tests for the EVT2 encoders and raw writer.
//!
//! Run with: cargo test --test integration_tests

use byteorder::{LittleEndian, ReadBytesExt};
use evt2_core::encoder::TH_NEXT_STEP;
use evt2_core::{
    input, parser, writer, CdEvent, CdEventEncoder, FieldOrder, RawEvent, RawEventType,
    RawHeader, StreamEncoder, TimeHighEncoder, TriggerEvent, TriggerEventEncoder,
};
use proptest::prelude::*;
use std::io::{BufRead, BufReader, Cursor};

/// Decoded view of a word stream, used to check that encoded streams expand
/// back to the original events.
#[derive(Debug, Default)]
struct Expanded {
    cd: Vec<CdEvent>,
    triggers: Vec<TriggerEvent>,
}

fn expand(words: &[RawEvent]) -> Expanded {
    let mut out = Expanded::default();
    let mut time_high = None;

    for &raw in words {
        match raw.event_type() {
            Some(RawEventType::TimeHigh) => time_high = Some(parser::time_high_get_value(raw)),
            Some(RawEventType::CdOff) | Some(RawEventType::CdOn) => {
                let th = time_high.expect("CD word before first time high");
                out.cd.push(CdEvent::new(
                    parser::cd_get_x(raw),
                    parser::cd_get_y(raw),
                    parser::cd_get_polarity(raw),
                    parser::expand_timestamp(th, parser::get_timestamp_low(raw)),
                ));
            }
            Some(RawEventType::ExtTrigger) => {
                let th = time_high.expect("trigger word before first time high");
                out.triggers.push(TriggerEvent::new(
                    parser::trigger_get_value(raw),
                    parser::trigger_get_id(raw),
                    parser::expand_timestamp(th, parser::get_timestamp_low(raw)),
                ));
            }
            None => panic!("unknown word {:#010x}", raw.bits()),
        }
    }

    out
}

/// CD event with x out of range: x is truncated, the rest is kept.
#[test]
fn test_cd_out_of_range_x_is_truncated() {
    let mut encoder = CdEventEncoder::new();
    encoder.set_event(1024, 1024, 1, 32);

    let mut raw = RawEvent::new();
    encoder.encode(&mut raw);

    assert_eq!(raw.payload(), 0x0800_0400);
    assert_eq!(raw.kind(), RawEventType::CdOn as u8);
    assert_eq!(raw.bits(), 0x1800_0400);
}

/// Trigger on line 5 with low timestamp 5.
#[test]
fn test_trigger_scenario() {
    let mut encoder = TriggerEventEncoder::new();
    encoder.set_event(0, 5, 5);

    let mut raw = RawEvent::new();
    encoder.encode(&mut raw);

    assert_eq!(raw.payload(), 0x0140_0500);
    assert_eq!(raw.kind(), RawEventType::ExtTrigger as u8);
    assert_eq!(raw.bits(), 0xA140_0500);
}

/// Time high values only change every fourth word.
#[test]
fn test_time_high_scenario() {
    let mut encoder = TimeHighEncoder::new(16);
    assert_eq!(encoder.peek(), 16);

    encoder.reset(64);
    assert_eq!(encoder.peek(), 64);

    let mut raw = RawEvent::new();
    let mut payloads = Vec::new();
    for _ in 0..5 {
        encoder.encode(&mut raw);
        assert_eq!(raw.kind(), RawEventType::TimeHigh as u8);
        payloads.push(raw.payload());
    }

    assert_eq!(payloads, vec![1, 1, 1, 1, 2]);
    assert_eq!(encoder.peek(), 144);
}

/// Every word kind lands in the expected type nibble.
#[test]
fn test_wire_type_codes() {
    let mut cd = CdEventEncoder::new();
    cd.set_event(0, 0, 0, 0);
    assert_eq!(cd.to_raw().bits() >> 28, 0x0);
    cd.set_event(0, 0, 1, 0);
    assert_eq!(cd.to_raw().bits() >> 28, 0x1);

    let mut trigger = TriggerEventEncoder::new();
    trigger.set_event(1, 0, 0);
    assert_eq!(trigger.to_raw().bits() >> 28, 0xA);

    let mut time = TimeHighEncoder::new(0);
    assert_eq!(time.next_raw().bits() >> 28, 0x8);
}

#[test]
fn test_reset_matches_fresh_encoder() {
    let mut reused = TimeHighEncoder::new(123_456);
    for _ in 0..7 {
        reused.next_raw();
    }
    reused.reset(987_654);

    let mut fresh = TimeHighEncoder::new(987_654);
    for _ in 0..16 {
        assert_eq!(reused.next_raw(), fresh.next_raw());
    }
}

/// A file written by the raw writer has the text header followed by
/// little-endian words that expand back to the input events.
#[test]
fn test_write_raw_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recording.raw");

    let cd: Vec<CdEvent> = (0..1000u64)
        .map(|i| CdEvent::new((i % 640) as u16, (i % 480) as u16, (i % 2) as u8, 500 + i * 7))
        .collect();
    let triggers = vec![TriggerEvent::new(1, 0, 600), TriggerEvent::new(0, 0, 4000)];

    let mut header = RawHeader::new(640, 480);
    header.date = Some("2025-03-04 05:06:07".to_string());
    let stats = writer::write_raw_file(&path, &header, &cd, &triggers).unwrap();
    assert_eq!(stats.cd_events, 1000);
    assert_eq!(stats.trigger_events, 2);

    let mut reader = BufReader::new(std::fs::File::open(&path).unwrap());
    let mut header_lines = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let done = line.starts_with("% end");
        header_lines.push(line.trim_end().to_string());
        if done {
            break;
        }
    }
    assert_eq!(header_lines, header.lines());
    let parsed = RawHeader::parse(header_lines.iter().map(String::as_str));
    assert_eq!(parsed.metadata, header.metadata);

    let mut words = Vec::new();
    while let Ok(word) = reader.read_u32::<LittleEndian>() {
        words.push(RawEvent::from_bits(word));
    }
    assert_eq!(words.len() as u64, stats.total_words());

    let expanded = expand(&words);
    assert_eq!(expanded.cd, cd);
    assert_eq!(expanded.triggers, triggers);
}

/// CSV input feeds straight into the stream encoder.
#[test]
fn test_csv_to_words() {
    let csv = "%geometry:320,240\n10,20,1,100\n11,21,0,164\n12,22,1,1000\n";
    let input = input::read_cd_events(Cursor::new(csv), FieldOrder::XYPT).unwrap();
    assert_eq!(input.metadata.unwrap().width, 320);

    let mut encoder = StreamEncoder::new();
    encoder.push_cd_events(&input.events);
    assert_eq!(expand(encoder.words()).cd, input.events);
}

fn sorted_cd_events() -> impl Strategy<Value = Vec<CdEvent>> {
    prop::collection::vec((0u16..1024, 0u16..4096, 0u8..2, 0u64..200), 1..200).prop_map(
        |steps| {
            let mut t = 1_000_000u64;
            steps
                .into_iter()
                .map(|(x, y, p, dt)| {
                    t += dt;
                    CdEvent::new(x, y, p, t)
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn prop_cd_payload_layout(x in 0u32..1024, y in 0u32..4096, p in 0u32..2, ts in 0u64..64) {
        let mut encoder = CdEventEncoder::new();
        encoder.set_event(x, y, p, ts);
        let first = encoder.to_raw();

        prop_assert_eq!(first.payload(), y | x << 12 | (ts as u32) << 22);
        prop_assert_eq!(first.event_type(), Some(RawEventType::cd_for_polarity(p as u8)));
        prop_assert_eq!(encoder.to_raw(), first);
    }

    #[test]
    fn prop_trigger_payload_layout(p in 0u32..2, id in 0u32..32, ts in 0u64..64) {
        let mut encoder = TriggerEventEncoder::new();
        encoder.set_event(p, id, ts);
        let first = encoder.to_raw();

        prop_assert_eq!(first.payload(), p | id << 8 | (ts as u32) << 22);
        prop_assert_eq!(first.kind(), RawEventType::ExtTrigger as u8);
        prop_assert_eq!(encoder.to_raw(), first);
    }

    #[test]
    fn prop_time_high_changes_every_fourth_word(seed in 0u64..(1 << 40)) {
        let mut encoder = TimeHighEncoder::new(seed);
        prop_assert_eq!(encoder.peek(), seed & !0xF);
        prop_assert_eq!(encoder.peek() % TH_NEXT_STEP, 0);

        let payloads: Vec<u32> = (0..12).map(|_| encoder.next_raw().payload()).collect();
        let changes = payloads.windows(2).filter(|w| w[0] != w[1]).count();
        prop_assert!((2..=3).contains(&changes));
        prop_assert_eq!(encoder.peek(), (seed & !0xF) + 12 * TH_NEXT_STEP);
    }

    #[test]
    fn prop_stream_expands_to_original(events in sorted_cd_events()) {
        let mut encoder = StreamEncoder::new();
        encoder.push_cd_events(&events);
        prop_assert_eq!(expand(encoder.words()).cd, events);
    }
}
