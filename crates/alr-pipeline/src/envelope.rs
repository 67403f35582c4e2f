//! Envelope decoding: one frame of JSON into JSON Lines records.

use crate::fields::FieldExtractor;
use alr_core::{Envelope, NormalizedRecord, RelayError, Result};
use std::io::Write;
use std::ops::AddAssign;
use tracing::debug;

/// Counters for one or more decoded envelopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub events: usize,
    pub records: usize,
    pub skipped_control: usize,
}

impl AddAssign for DecodeStats {
    fn add_assign(&mut self, other: Self) {
        self.events += other.events;
        self.records += other.records;
        self.skipped_control += other.skipped_control;
    }
}

pub struct EnvelopeDecoder {
    extractor: FieldExtractor,
}

impl EnvelopeDecoder {
    pub fn new(extractor: FieldExtractor) -> Self {
        Self { extractor }
    }

    pub fn parse(&self, frame: usize, text: &[u8]) -> Result<Envelope> {
        serde_json::from_slice(text).map_err(|source| RelayError::Decode { frame, source })
    }

    /// Decode one frame and append a record per log event to `sink`.
    ///
    /// Stops at the first malformed event. Records written before it stay
    /// in the sink.
    pub fn decode<W: Write + ?Sized>(
        &self,
        frame: usize,
        text: &[u8],
        sink: &mut W,
    ) -> Result<DecodeStats> {
        let envelope = self.parse(frame, text)?;
        let mut stats = DecodeStats::default();

        if envelope.is_control() {
            debug!(frame, log_group = %envelope.log_group, "skipping control message");
            stats.skipped_control = 1;
            return Ok(stats);
        }

        for (event, log_event) in envelope.log_events.iter().enumerate() {
            stats.events += 1;
            let record = self
                .extractor
                .extract(&log_event.message)
                .map_err(|source| RelayError::MalformedRecord { frame, event, source })?;
            write_record(&record, sink)?;
            stats.records += 1;
        }

        debug!(
            frame,
            log_group = %envelope.log_group,
            log_stream = %envelope.log_stream,
            records = stats.records,
            "decoded envelope"
        );
        Ok(stats)
    }
}

impl Default for EnvelopeDecoder {
    fn default() -> Self {
        Self::new(FieldExtractor::default())
    }
}

/// Write one record as a newline-terminated JSON object.
pub fn write_record<W: Write + ?Sized>(record: &NormalizedRecord, sink: &mut W) -> Result<()> {
    serde_json::to_writer(&mut *sink, record).map_err(std::io::Error::from)?;
    sink.write_all(b"\n")?;
    Ok(())
}
