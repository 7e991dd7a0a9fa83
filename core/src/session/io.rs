//! Normalized I/O, frame transport seams and the ordered frame writer.

use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::framing::{FrameError, RenderedFrame};
use crate::types::ArchiveError;

/// Canonical input abstraction
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Canonical output abstraction
pub enum OutputSink {
    Writer(Box<dyn Write + Send>),
    File(PathBuf),
    /// Capture into a shared buffer returned with the decode report.
    Memory,
}

/// Normalize input source into a boxed reader
pub fn open_input(src: InputSource) -> Result<Box<dyn Read + Send>, ArchiveError> {
    let reader: Box<dyn Read + Send> = match src {
        InputSource::Reader(r) => r,
        InputSource::File(p) => Box::new(BufReader::new(File::open(p)?)),
        InputSource::Memory(b) => Box::new(Cursor::new(b)),
    };
    Ok(reader)
}

/// Normalize output sink into a boxed writer, plus the capture buffer for `OutputSink::Memory`.
pub fn open_output(
    sink: OutputSink,
) -> Result<(Box<dyn Write + Send>, Option<Arc<Mutex<Vec<u8>>>>), ArchiveError> {
    match sink {
        OutputSink::Writer(w) => Ok((w, None)),
        OutputSink::File(p) => Ok((Box::new(BufWriter::new(File::create(p)?)), None)),
        OutputSink::Memory => {
            let buf = Arc::new(Mutex::new(Vec::new()));
            let writer = SharedBufferWriter { buf: buf.clone() };
            Ok((Box::new(writer), Some(buf)))
        }
    }
}

pub struct SharedBufferWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Write for SharedBufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .buf
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "shared output buffer poisoned"))?;
        guard.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read up to `len` bytes, stopping early only at EOF. Empty result means EOF.
pub fn read_exact_or_eof<R: Read>(r: &mut R, len: usize) -> Result<Bytes, ArchiveError> {
    let mut buf = vec![0u8; len];
    let mut off = 0;

    while off < len {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    buf.truncate(off);
    Ok(Bytes::from(buf))
}

// ================= Frame transport =================

/// Consumer of rendered frames, in the order they are written.
pub trait FrameSink {
    fn write_frame(&mut self, frame: RenderedFrame) -> Result<(), ArchiveError>;

    /// Called once after the last frame.
    fn finish(&mut self) -> Result<(), ArchiveError> {
        Ok(())
    }
}

/// Producer of rendered frames, in stream order. `None` ends the stream.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Option<RenderedFrame>, ArchiveError>;
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn write_frame(&mut self, frame: RenderedFrame) -> Result<(), ArchiveError> {
        (**self).write_frame(frame)
    }

    fn finish(&mut self) -> Result<(), ArchiveError> {
        (**self).finish()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn read_frame(&mut self) -> Result<Option<RenderedFrame>, ArchiveError> {
        (**self).read_frame()
    }
}

impl FrameSink for Vec<RenderedFrame> {
    fn write_frame(&mut self, frame: RenderedFrame) -> Result<(), ArchiveError> {
        self.push(frame);
        Ok(())
    }
}

/// In-memory transport usable in both directions.
#[derive(Debug, Default, Clone)]
pub struct MemoryFrames {
    frames: VecDeque<RenderedFrame>,
}

impl MemoryFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn into_vec(self) -> Vec<RenderedFrame> {
        self.frames.into()
    }
}

impl From<Vec<RenderedFrame>> for MemoryFrames {
    fn from(frames: Vec<RenderedFrame>) -> Self {
        Self { frames: frames.into() }
    }
}

impl FrameSink for MemoryFrames {
    fn write_frame(&mut self, frame: RenderedFrame) -> Result<(), ArchiveError> {
        self.frames.push_back(frame);
        Ok(())
    }
}

impl FrameSource for MemoryFrames {
    fn read_frame(&mut self) -> Result<Option<RenderedFrame>, ArchiveError> {
        Ok(self.frames.pop_front())
    }
}

/// Writes frames back to back as packed RGB24 (`rawvideo`, `rgb24`).
pub struct RawFrameWriter<W: Write> {
    inner: W,
    frames: u64,
}

impl<W: Write> RawFrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, frames: 0 }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> FrameSink for RawFrameWriter<W> {
    fn write_frame(&mut self, frame: RenderedFrame) -> Result<(), ArchiveError> {
        self.inner.write_all(frame.as_bytes())?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ArchiveError> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Reads back-to-back packed RGB24 frames of a known side length.
pub struct RawFrameReader<R: Read> {
    inner: R,
    frame_size: u32,
}

impl<R: Read> RawFrameReader<R> {
    pub fn new(inner: R, frame_size: u32) -> Self {
        Self { inner, frame_size }
    }
}

impl<R: Read> FrameSource for RawFrameReader<R> {
    fn read_frame(&mut self) -> Result<Option<RenderedFrame>, ArchiveError> {
        let expected = RenderedFrame::byte_len(self.frame_size);
        let buf = read_exact_or_eof(&mut self.inner, expected)?;
        if buf.is_empty() {
            return Ok(None);
        }
        if buf.len() != expected {
            return Err(FrameError::LengthMismatch { expected, actual: buf.len() }.into());
        }
        Ok(Some(RenderedFrame::from_raw(self.frame_size, Vec::from(buf))?))
    }
}

// ================= Ordered writer =================

/// Re-serializes frames completed out of order by the worker pool.
///
/// Frames are buffered until every lower index has been written, so the sink
/// always sees indices 0, 1, 2, ... with no gaps. The buffer grows with how
/// far completed frames run ahead of the next index; see `pending`.
pub struct OrderedFrameWriter<'a, S: FrameSink + ?Sized> {
    out: &'a mut S,
    next: u64,
    pending: BTreeMap<u64, RenderedFrame>,
}

impl<'a, S: FrameSink + ?Sized> OrderedFrameWriter<'a, S> {
    pub fn new(out: &'a mut S) -> Self {
        Self { out, next: 0, pending: BTreeMap::new() }
    }

    pub fn push(&mut self, index: u64, frame: RenderedFrame) -> Result<(), ArchiveError> {
        if index < self.next || self.pending.contains_key(&index) {
            return Err(ArchiveError::Validation(format!("duplicate frame index {index}")));
        }
        trace!(index, next = self.next, pending = self.pending.len(), "queue frame");
        self.pending.insert(index, frame);
        self.flush_ready()
    }

    /// Frames buffered behind a missing lower index.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Frames already handed to the sink.
    pub fn written(&self) -> u64 {
        self.next
    }

    /// Verify all `expected` frames were written and nothing is left behind.
    pub fn finish(&mut self, expected: u64) -> Result<(), ArchiveError> {
        self.flush_ready()?;
        if let Some((&index, _)) = self.pending.iter().next() {
            return Err(ArchiveError::Validation(format!(
                "missing frame {} (next buffered frame is {index})",
                self.next
            )));
        }
        if self.next != expected {
            return Err(ArchiveError::Validation(format!(
                "expected {expected} frames, wrote {}",
                self.next
            )));
        }
        debug!(frames = self.next, "ordered writer finished");
        Ok(())
    }

    fn flush_ready(&mut self) -> Result<(), ArchiveError> {
        while let Some(frame) = self.pending.remove(&self.next) {
            self.out.write_frame(frame)?;
            self.next += 1;
        }
        Ok(())
    }
}

// ================= Sniff capture =================

/// Pass-through writer that keeps the first `limit` bytes for content sniffing.
pub struct HeadCapture<W: Write> {
    inner: W,
    head: Vec<u8>,
    limit: usize,
}

impl<W: Write> HeadCapture<W> {
    pub fn new(inner: W, limit: usize) -> Self {
        Self { inner, head: Vec::with_capacity(limit), limit }
    }

    pub fn head(&self) -> &[u8] {
        &self.head
    }

    pub fn into_parts(self) -> (W, Vec<u8>) {
        (self.inner, self.head)
    }
}

impl<W: Write> Write for HeadCapture<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(data)?;
        let room = self.limit - self.head.len();
        self.head.extend_from_slice(&data[..n.min(room)]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
