//! Frame sources: split a byte source into independently decoded payloads.
//!
//! A gzip source may hold several members back to back. Each member is
//! decoded on its own and handed downstream before the reader is moved
//! onto the next one.

use alr_core::{Compression, RelayError, Result};
use flate2::bufread::GzDecoder;
use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};
use tracing::{debug, warn};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const GZIP_DEFLATE: u8 = 8;
const GZIP_HEADER_LEN: usize = 10;
const GZIP_RESERVED_FLAGS: u8 = 0xe0;

/// Produces the next decoded frame, or `None` once the input is exhausted.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>>;
}

impl<F: FrameSource + ?Sized> FrameSource for Box<F> {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        (**self).next_frame()
    }
}

/// Concatenated gzip members.
///
/// The reader must be seekable: finding the next member peeks at its
/// header and rewinds before decoding.
pub struct GzipFrames<R> {
    reader: R,
    frame: usize,
    done: bool,
}

impl<R: BufRead + Seek> GzipFrames<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, frame: 0, done: false }
    }

    /// Frames decoded so far.
    pub fn frames_read(&self) -> usize {
        self.frame
    }

    /// Whether the reader sits on the start of another gzip member.
    ///
    /// A non-empty source must open with a member header. After the first
    /// member, anything that is not a complete header ends the source.
    fn resync(&mut self) -> Result<bool> {
        let start = self.reader.stream_position()?;
        let mut header = Vec::with_capacity(GZIP_HEADER_LEN);
        (&mut self.reader)
            .take(GZIP_HEADER_LEN as u64)
            .read_to_end(&mut header)?;
        self.reader.seek(SeekFrom::Start(start))?;

        if header.is_empty() {
            return Ok(false);
        }
        if is_member_header(&header) {
            return Ok(true);
        }
        if self.frame == 0 {
            return Err(RelayError::Decompression {
                frame: 0,
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    "source does not start with a gzip header",
                ),
            });
        }
        let end = self.reader.seek(SeekFrom::End(0))?;
        warn!(
            offset = start,
            trailing_bytes = end - start,
            "ignoring trailing bytes that do not start a gzip frame"
        );
        Ok(false)
    }
}

fn is_member_header(header: &[u8]) -> bool {
    header.len() == GZIP_HEADER_LEN
        && header[..2] == GZIP_MAGIC
        && header[2] == GZIP_DEFLATE
        && header[3] & GZIP_RESERVED_FLAGS == 0
}

impl<R: BufRead + Seek> FrameSource for GzipFrames<R> {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }
        match self.resync() {
            Ok(true) => {}
            Ok(false) => {
                self.done = true;
                return Ok(None);
            }
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        }

        let frame = self.frame;
        let mut payload = Vec::new();
        // bufread::GzDecoder stops at the end of the member and leaves the
        // reader right behind its trailer.
        let mut decoder = GzDecoder::new(&mut self.reader);
        if let Err(source) = decoder.read_to_end(&mut payload) {
            self.done = true;
            return Err(RelayError::Decompression { frame, source });
        }

        self.frame += 1;
        debug!(frame, bytes = payload.len(), "decompressed frame");
        Ok(Some(payload))
    }
}

/// An uncompressed source is a single frame.
pub struct PlainFrames<R> {
    reader: R,
    done: bool,
}

impl<R: Read> PlainFrames<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, done: false }
    }
}

impl<R: Read> FrameSource for PlainFrames<R> {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let mut payload = Vec::new();
        self.reader.read_to_end(&mut payload)?;
        if payload.is_empty() {
            return Ok(None);
        }
        Ok(Some(payload))
    }
}

/// Frame source for the given compression.
pub fn frame_source<'a, R>(compression: Compression, reader: R) -> Box<dyn FrameSource + 'a>
where
    R: BufRead + Seek + 'a,
{
    match compression {
        Compression::Gzip => Box::new(GzipFrames::new(reader)),
        Compression::None => Box::new(PlainFrames::new(reader)),
    }
}

/// Feed every frame, in order, to `f`. Returns the number of frames.
pub fn for_each_frame<S, F>(source: &mut S, mut f: F) -> Result<usize>
where
    S: FrameSource + ?Sized,
    F: FnMut(usize, &[u8]) -> Result<()>,
{
    let mut count = 0;
    while let Some(payload) = source.next_frame()? {
        f(count, &payload)?;
        count += 1;
    }
    Ok(count)
}

/// Write the concatenation of all frames to `sink`. Returns the number of frames.
pub fn decompress_to<S, W>(source: &mut S, sink: &mut W) -> Result<usize>
where
    S: FrameSource + ?Sized,
    W: Write + ?Sized,
{
    for_each_frame(source, |_, payload| {
        sink.write_all(payload)?;
        Ok(())
    })
}
