//! headers/mod.rs
//! Metadata codec: the leading 3x3 header frame and heuristic recovery.
//!
//! - The header frame is rendered at a fixed 3 divisions so it can be found
//!   without knowing the payload geometry.
//! - When the header is disabled, `heuristic_detect` infers divisions from the
//!   color runs of the first frame.

pub mod types;
pub mod encode;
pub mod decode;
pub mod detect;

pub use types::*;
pub use encode::*;
pub use decode::*;
pub use detect::*;
