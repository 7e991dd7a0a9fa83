//! Frame codec: bytes <-> pixel grids <-> rendered rasters.
//!
//! Responsibilities:
//! - Define pixels, grids and owned rasters
//! - Pack a byte stream into row-major grids (zero-padded at the end)
//! - Block-replicate grids into rasters and sample them back
//!
//! Non-responsibilities:
//! - Metadata frames
//! - IO
//! - Parallelism

pub mod types;
pub mod encode;
pub mod decode;

pub use types::{DataGrid, FrameError, Pixel, RenderedFrame};
pub use encode::{grid_count, pack, pack_grid, render, Pack};
pub use decode::{sample, unpack, unpack_into};
