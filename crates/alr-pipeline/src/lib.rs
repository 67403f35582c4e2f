//! Audit log transformation pipeline.
//!
//! Stages:
//! 1. Frames: split the source into independently compressed frames
//! 2. Envelope: parse each frame as one JSON delivery envelope
//! 3. Fields: turn every delimited log message into a normalized record
//!
//! Records from all frames are appended, in order, to a single JSON Lines sink.

pub mod envelope;
pub mod fields;
pub mod frames;
pub mod pipeline;

pub use envelope::{DecodeStats, EnvelopeDecoder};
pub use fields::FieldExtractor;
pub use frames::{decompress_to, frame_source, FrameSource, GzipFrames, PlainFrames};
pub use pipeline::{TransformOutcome, TransformPipeline, TransformStats};

#[cfg(test)]
mod tests;
