//! Archive sessions: whole-stream encode and decode over the frame codecs.
//!
//! Encoding runs a bounded worker pool whose results pass through an ordered
//! writer, so sinks always see frames in stream order. Decoding is sequential.

pub mod parallelism;
pub mod pipeline;
pub mod io;
pub mod core;

pub mod frame_worker;

pub use io::{
    FrameSink,
    FrameSource,
    InputSource,
    MemoryFrames,
    OutputSink,
    RawFrameReader,
    RawFrameWriter,
};

pub use self::core::{
    decode,
    decode_stream,
    encode,
    encode_stream,
    DecodeParams,
    DecodedArchive,
    EncodeParams,
};

pub use parallelism::ParallelismProfile;
pub use pipeline::{DecodeReport, ExtensionSource};
