//! mp4archive-core
//!
//! Stores arbitrary bytes as a sequence of square RGB frames meant for a
//! lossless video container, and recovers them again.
//! No video codec is invoked here; frames go through `FrameSink`/`FrameSource`.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod config;
pub mod types;

// Codec layers
pub mod framing;
pub mod headers;
pub mod sniff;
pub mod telemetry;

// Session layer
pub mod session;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::config::{ConfigError, Configuration};
    pub use crate::framing::{DataGrid, FrameError, Pixel, RenderedFrame};
    pub use crate::headers::{Detection, HeaderError, Metadata};
    pub use crate::session::{
        decode, decode_stream, encode, encode_stream, DecodeParams, DecodeReport, DecodedArchive,
        EncodeParams, ExtensionSource, FrameSink, FrameSource, InputSource, MemoryFrames,
        OutputSink, ParallelismProfile, RawFrameReader, RawFrameWriter,
    };
    pub use crate::sniff::{ContentSniffer, SignatureSniffer};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::ArchiveError;
}
