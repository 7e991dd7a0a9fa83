//! Format constants and defaults shared by the codec layers.

/// Magic marker stored in metadata cell (0,0): "ELE" as a big-endian 24-bit value.
pub const METADATA_MAGIC: u32 = 0x45_4C_45;

/// The metadata block is always a 3x3 grid, whatever the payload divisions are.
pub const METADATA_DIVISIONS: u32 = 3;

/// Division count is stored in a single 8-bit channel.
pub const MAX_DIVISIONS: u32 = 255;

/// Payload bytes carried by one pixel (R, G, B; no alpha).
pub const BYTES_PER_PIXEL: usize = 3;

/// Filename capacity: cells (1,0)..(2,2), one character per channel.
pub const FILENAME_MAX_LEN: usize = 18;

/// Extension capacity: cell (0,2), one character per channel.
pub const EXTENSION_MAX_LEN: usize = 3;

/// Defaults when the caller does not supply a configuration.
pub const DEFAULT_FRAME_SIZE: u32 = 1080;
pub const DEFAULT_DIVISIONS: u32 = 120;

/// File extension used for raw RGB24 frame streams.
pub const RAW_FRAME_EXTENSION: &str = "rgb";

/// Number of decoded bytes handed to the content sniffer.
pub const SNIFF_HEAD_LEN: usize = 512;

/// Upper bound on render workers.
pub const MAX_WORKERS: usize = 256;

/// Hard cap on rendered frames held in flight (channels + reorder buffer).
pub const MAX_INFLIGHT_FRAMES: usize = 64;

/// Fraction of available memory the in-flight frames may occupy.
pub const INFLIGHT_MEM_FRACTION: f64 = 0.25;
