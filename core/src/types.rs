use std::io;

use thiserror::Error;

use crate::{
    config::ConfigError,
    framing::FrameError,
    headers::HeaderError,
    session::frame_worker::WorkerError,
};

/// Unified session error covering I/O, configuration, framing, metadata and the worker pool.
/// - `From<T>` impls let `?` cross layer boundaries.
/// - Messages are stable for logs.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// Channel or thread failure inside the worker pool.
    #[error("pipeline error: {0}")]
    Pipeline(&'static str),

    #[error("validation error: {0}")]
    Validation(String),
}

impl ArchiveError {
    /// True when the first frame lacked the metadata magic; heuristic mode may still work.
    pub fn is_format_mismatch(&self) -> bool {
        matches!(self, ArchiveError::Header(HeaderError::FormatMismatch { .. }))
    }
}
