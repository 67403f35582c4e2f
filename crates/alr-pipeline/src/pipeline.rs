//! Transform pipeline: frames → envelopes → records, into one JSON Lines sink.

use crate::envelope::{DecodeStats, EnvelopeDecoder};
use crate::fields::FieldExtractor;
use crate::frames::{for_each_frame, frame_source};
use alr_core::{Compression, Result};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Counters for one transformed source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub frames: usize,
    pub decode: DecodeStats,
}

impl TransformStats {
    pub fn records(&self) -> usize {
        self.decode.records
    }
}

/// Result of transforming a local source file.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub sink_path: PathBuf,
    pub stats: TransformStats,
}

/// The main transform pipeline.
pub struct TransformPipeline {
    pub compression: Compression,
    decoder: EnvelopeDecoder,
}

impl TransformPipeline {
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            decoder: EnvelopeDecoder::default(),
        }
    }

    pub fn gzip() -> Self {
        Self::new(Compression::Gzip)
    }

    pub fn plain() -> Self {
        Self::new(Compression::None)
    }

    pub fn with_extractor(mut self, extractor: FieldExtractor) -> Self {
        self.decoder = EnvelopeDecoder::new(extractor);
        self
    }

    /// Decode every frame of `reader` into `sink`, in frame order.
    ///
    /// A failing frame or record stops the run; whatever was already
    /// written to `sink` is left in place.
    pub fn transform<R, W>(&self, reader: R, sink: &mut W) -> Result<TransformStats>
    where
        R: BufRead + Seek,
        W: Write + ?Sized,
    {
        let mut frames = frame_source(self.compression, reader);
        let mut decode = DecodeStats::default();
        let frames = for_each_frame(&mut frames, |index, payload| {
            decode += self.decoder.decode(index, payload, &mut *sink)?;
            Ok(())
        })?;
        Ok(TransformStats { frames, decode })
    }

    /// Where the records for `source` are written: `<source>.json`.
    pub fn sink_path(source: &Path) -> PathBuf {
        let mut name = OsString::from(source.as_os_str());
        name.push(".json");
        PathBuf::from(name)
    }

    /// Transform a local file into its `.json` sink next to it.
    pub fn transform_file(&self, source: &Path) -> Result<TransformOutcome> {
        let input = BufReader::new(File::open(source)?);
        let sink_path = Self::sink_path(source);
        let mut sink = BufWriter::new(File::create(&sink_path)?);

        let result = self.transform(input, &mut sink);
        let flushed = sink.flush();
        let stats = result?;
        flushed?;

        info!(
            source = %source.display(),
            sink = %sink_path.display(),
            frames = stats.frames,
            records = stats.records(),
            "transformed source"
        );
        Ok(TransformOutcome { sink_path, stats })
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::gzip()
    }
}
