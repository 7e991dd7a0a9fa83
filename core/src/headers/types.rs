//! headers/types.rs
//! Metadata block layout and typed views.
//!
//! The metadata block is a fixed 3x3 grid rendered in front of the payload:
//!
//! ```text
//! (0,0) magic 0x454C45   (0,1) divisions in R   (0,2) extension, 3 chars
//! (1,0) .. (2,2)         filename, 18 chars, one per channel
//! ```
//!
//! Characters are stored as raw Latin-1 code points. Zero marks "no character",
//! so embedded NULs cannot be represented.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::constants::{EXTENSION_MAX_LEN, FILENAME_MAX_LEN, MAX_DIVISIONS, METADATA_MAGIC};
use crate::framing::FrameError;

/// Grid cell (row, col) of each metadata field.
pub const MAGIC_CELL: (u32, u32) = (0, 0);
pub const DIVISIONS_CELL: (u32, u32) = (0, 1);
pub const EXTENSION_CELL: (u32, u32) = (0, 2);
/// First filename cell; the filename fills the remaining cells row-major.
pub const FILENAME_START_ROW: u32 = 1;

/// Format parameters carried by the leading header frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub divisions: u32,
    pub filename: String,
    pub extension: String,
}

impl Metadata {
    /// Build metadata as given; a leading '.' on the extension is dropped.
    pub fn new(divisions: u32, filename: impl Into<String>, extension: impl AsRef<str>) -> Self {
        let extension = extension.as_ref();
        Self {
            divisions,
            filename: filename.into(),
            extension: extension.strip_prefix('.').unwrap_or(extension).to_owned(),
        }
    }

    /// Check every stored character can be encoded. Length limits are not
    /// checked here: over-long names are truncated on encode, and characters
    /// past the limit are never looked at.
    pub fn validate(&self) -> Result<(), HeaderError> {
        if self.divisions == 0 || self.divisions > MAX_DIVISIONS {
            return Err(HeaderError::InvalidDivisions { have: self.divisions });
        }
        for ch in self.filename.chars().take(FILENAME_MAX_LEN) {
            latin1_code(ch, "filename")?;
        }
        for ch in self.extension.chars().take(EXTENSION_MAX_LEN) {
            latin1_code(ch, "extension")?;
        }
        Ok(())
    }

    /// `filename.extension`, or just the filename when the extension is empty.
    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.filename.clone()
        } else {
            format!("{}.{}", self.filename, self.extension)
        }
    }
}

/// Map a character to its one-byte channel value.
pub(crate) fn latin1_code(ch: char, field: &'static str) -> Result<u8, HeaderError> {
    match u32::from(ch) {
        0 => Err(HeaderError::UnencodableChar { field, ch }),
        c @ 1..=255 => Ok(c as u8),
        _ => Err(HeaderError::UnencodableChar { field, ch }),
    }
}

/// A run in column 0 whose length does not divide the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousRun {
    pub start_row: u32,
    pub run_length: u32,
}

/// Outcome of heuristic division detection on a first frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub divisions: u32,
    /// Set when the 3x3 disambiguation found a genuine metadata frame.
    pub metadata: Option<Metadata>,
    /// Runs discarded as noise before a stable run was found.
    pub ambiguous_runs: Vec<AmbiguousRun>,
}

impl Detection {
    #[inline]
    pub fn is_metadata(&self) -> bool {
        self.metadata.is_some()
    }
}

fn magic_hex() -> String {
    format!("0x{:06x}", METADATA_MAGIC)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Cell (0,0) does not hold the magic constant.
    #[error("format mismatch: expected magic {}, got 0x{}", magic_hex(), hex::encode(.have))]
    FormatMismatch { have: [u8; 3] },

    #[error("invalid division count in metadata: {have}")]
    InvalidDivisions { have: u32 },

    #[error("{field} character {ch:?} is not a non-zero Latin-1 code point")]
    UnencodableChar { field: &'static str, ch: char },

    /// No run in the first column divides the frame size.
    #[error("no stable run found in {frame_size}px column ({ambiguous} ambiguous runs discarded)")]
    HeuristicExhausted { frame_size: u32, ambiguous: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
