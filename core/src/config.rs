//! Validated frame geometry.
//!
//! A `Configuration` can only exist if its frame size divides evenly by its
//! division count, so codec calls never re-check geometry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BYTES_PER_PIXEL, DEFAULT_DIVISIONS, DEFAULT_FRAME_SIZE, MAX_DIVISIONS, METADATA_DIVISIONS,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("frame size must be positive")]
    ZeroFrameSize,

    #[error("division count must be positive")]
    ZeroDivisions,

    #[error("division count {have} exceeds maximum {max}")]
    TooManyDivisions { have: u32, max: u32 },

    #[error("frame size {frame_size} is not divisible by {divisions} divisions")]
    NotDivisible { frame_size: u32, divisions: u32 },
}

/// Immutable frame geometry passed into every codec call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawConfiguration")]
pub struct Configuration {
    frame_size: u32,
    divisions: u32,
}

#[derive(Deserialize)]
struct RawConfiguration {
    frame_size: u32,
    divisions: u32,
}

impl TryFrom<RawConfiguration> for Configuration {
    type Error = ConfigError;

    fn try_from(raw: RawConfiguration) -> Result<Self, Self::Error> {
        Configuration::new(raw.frame_size, raw.divisions)
    }
}

impl Configuration {
    pub fn new(frame_size: u32, divisions: u32) -> Result<Self, ConfigError> {
        if frame_size == 0 {
            return Err(ConfigError::ZeroFrameSize);
        }
        if divisions == 0 {
            return Err(ConfigError::ZeroDivisions);
        }
        if divisions > MAX_DIVISIONS {
            return Err(ConfigError::TooManyDivisions { have: divisions, max: MAX_DIVISIONS });
        }
        if frame_size % divisions != 0 {
            return Err(ConfigError::NotDivisible { frame_size, divisions });
        }
        Ok(Self { frame_size, divisions })
    }

    /// Geometry of the metadata frame for a given raster size.
    pub fn metadata(frame_size: u32) -> Result<Self, ConfigError> {
        Self::new(frame_size, METADATA_DIVISIONS)
    }

    /// Same raster size, different division count.
    pub fn with_divisions(&self, divisions: u32) -> Result<Self, ConfigError> {
        Self::new(self.frame_size, divisions)
    }

    #[inline]
    pub fn frame_size(&self) -> u32 {
        self.frame_size
    }

    #[inline]
    pub fn divisions(&self) -> u32 {
        self.divisions
    }

    /// Side length in pixels of one replicated block.
    #[inline]
    pub fn block_size(&self) -> u32 {
        self.frame_size / self.divisions
    }

    #[inline]
    pub fn cells_per_grid(&self) -> usize {
        (self.divisions as usize) * (self.divisions as usize)
    }

    /// Payload bytes one data grid can carry.
    #[inline]
    pub fn grid_capacity(&self) -> usize {
        self.cells_per_grid() * BYTES_PER_PIXEL
    }

    /// Bytes in one rendered RGB24 raster.
    #[inline]
    pub fn frame_len(&self) -> usize {
        (self.frame_size as usize) * (self.frame_size as usize) * BYTES_PER_PIXEL
    }

    /// Whether a metadata frame can be rendered at this raster size.
    pub fn supports_metadata(&self) -> bool {
        self.frame_size % METADATA_DIVISIONS == 0
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self { frame_size: DEFAULT_FRAME_SIZE, divisions: DEFAULT_DIVISIONS }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let d = Configuration::default();
        assert_eq!(Configuration::new(d.frame_size(), d.divisions()), Ok(d));
        assert!(d.supports_metadata());
    }

    #[test]
    fn derived_sizes() {
        let c = Configuration::new(12, 4).unwrap();
        assert_eq!(c.block_size(), 3);
        assert_eq!(c.cells_per_grid(), 16);
        assert_eq!(c.grid_capacity(), 48);
        assert_eq!(c.frame_len(), 12 * 12 * 3);
    }
}
