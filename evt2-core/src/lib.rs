//! EVT 2.0 encoder library for Prophesee-compatible event cameras.
//!
//! This crate packs Change Detection (CD) events, external trigger events and
//! time high markers into the 32-bit words of the EVT 2.0 raw format.
//!
//! # Example
//!
//! ```
//! use evt2_core::{CdEventEncoder, RawEvent, RawEventType, TimeHighEncoder};
//!
//! let mut time = TimeHighEncoder::new(1_000_000);
//! let mut cd = CdEventEncoder::new();
//! let mut raw = RawEvent::new();
//!
//! time.encode(&mut raw);
//! assert_eq!(raw.event_type(), Some(RawEventType::TimeHigh));
//!
//! cd.set_event(320, 240, 1, 1_000_005);
//! cd.encode(&mut raw);
//! assert_eq!(raw.event_type(), Some(RawEventType::CdOn));
//! ```
//!
//! # Features
//!
//! - Bit-exact CD, trigger and time high word encoders
//! - Stream encoding that interleaves time high words automatically
//! - Raw file header generation and a buffered little-endian writer
//! - CSV event input with customizable field ordering

pub mod bits;
pub mod encoder;
pub mod header;
pub mod input;
pub mod parser;
pub mod stream;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use encoder::{CdEventEncoder, TimeHighEncoder, TriggerEventEncoder};
pub use header::RawHeader;
pub use input::{FieldOrder, InputError};
pub use stream::{StreamEncoder, StreamStats};
pub use types::{CdEvent, RawEvent, RawEventType, SensorMetadata, TriggerEvent};
pub use writer::{RawWriter, WriteError};
