//! Writer for EVT 2.0 raw files.
//!
//! Produces the `%` text header followed by 4-byte little-endian words.

use crate::header::RawHeader;
use crate::stream::{StreamEncoder, StreamStats};
use crate::types::{CdEvent, RawEvent, TriggerEvent};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while writing raw files.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Header already written")]
    HeaderAlreadyWritten,

    #[error("Header must be written before events")]
    MissingHeader,
}

/// Buffered EVT 2.0 raw writer.
///
/// Events are encoded with an owned [`StreamEncoder`], so successive calls to
/// [`write_events`](Self::write_events) continue one time base. Data is
/// flushed on [`flush`](Self::flush) and [`into_inner`](Self::into_inner)
/// only.
pub struct RawWriter<W: Write> {
    writer: BufWriter<W>,
    encoder: StreamEncoder,
    header_written: bool,
    bytes_written: u64,
}

impl<W: Write> RawWriter<W> {
    /// Creates a new raw writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            encoder: StreamEncoder::new(),
            header_written: false,
            bytes_written: 0,
        }
    }

    /// Writes the text header. Must be called once, before any event.
    pub fn write_header(&mut self, header: &RawHeader) -> Result<(), WriteError> {
        if self.header_written {
            return Err(WriteError::HeaderAlreadyWritten);
        }
        for line in header.lines() {
            self.writer.write_all(line.as_bytes())?;
            self.writer.write_all(b"\n")?;
            self.bytes_written += line.len() as u64 + 1;
        }
        self.header_written = true;
        Ok(())
    }

    /// Writes already encoded words verbatim.
    pub fn write_words(&mut self, words: &[RawEvent]) -> Result<(), WriteError> {
        if !self.header_written {
            return Err(WriteError::MissingHeader);
        }
        for word in words {
            self.writer.write_u32::<LittleEndian>(word.bits())?;
        }
        self.bytes_written += words.len() as u64 * 4;
        Ok(())
    }

    /// Encodes and writes two time-sorted event lists, merged by timestamp.
    pub fn write_events(
        &mut self,
        cd_events: &[CdEvent],
        trigger_events: &[TriggerEvent],
    ) -> Result<(), WriteError> {
        if !self.header_written {
            return Err(WriteError::MissingHeader);
        }
        self.encoder.encode_merged(cd_events, trigger_events);
        let words = self.encoder.take_words();
        self.write_words(&words)
    }

    /// Returns the number of CD and trigger events written.
    pub fn event_count(&self) -> u64 {
        let stats = self.encoder.stats();
        stats.cd_events + stats.trigger_events
    }

    /// Returns the encoder counters.
    pub fn stats(&self) -> StreamStats {
        self.encoder.stats()
    }

    /// Returns the number of bytes handed to the writer, header included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, WriteError> {
        self.writer
            .into_inner()
            .map_err(|e| WriteError::Io(e.into_error()))
    }
}

/// Writes a complete raw file and returns the encoder counters.
pub fn write_raw_file<P: AsRef<Path>>(
    path: P,
    header: &RawHeader,
    cd_events: &[CdEvent],
    trigger_events: &[TriggerEvent],
) -> Result<StreamStats, WriteError> {
    let file = File::create(path)?;
    let mut writer = RawWriter::new(file);
    writer.write_header(header)?;
    writer.write_events(cd_events, trigger_events)?;
    writer.flush()?;
    Ok(writer.stats())
}
