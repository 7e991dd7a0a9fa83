//! Bytes -> grids -> rasters.
//!
//! Layout:
//!
//! ```text
//! byte stream : b0 b1 b2 | b3 b4 b5 | ...
//! grid cells  : (0,0)    | (0,1)    | ... row-major, zero-padded at the end
//! raster      : each cell replicated into a (frame_size/divisions)^2 block
//! ```

use std::slice::Chunks;

use crate::config::Configuration;
use crate::constants::BYTES_PER_PIXEL;
use crate::framing::types::{DataGrid, FrameError, Pixel, RenderedFrame};

/// Pack one chunk of at most `grid_capacity` bytes into a grid.
///
/// Cells past the end of the chunk are zero. A trailing partial pixel is
/// zero-padded in its missing channels.
pub fn pack_grid(chunk: &[u8], config: &Configuration) -> Result<DataGrid, FrameError> {
    let capacity = config.grid_capacity();
    if chunk.len() > capacity {
        return Err(FrameError::ChunkTooLarge { len: chunk.len(), capacity });
    }
    Ok(fill_grid(chunk, config))
}

fn fill_grid(chunk: &[u8], config: &Configuration) -> DataGrid {
    debug_assert!(chunk.len() <= config.grid_capacity());
    let mut grid = DataGrid::new(config.divisions());
    for (cell, rgb) in grid.cells_mut().iter_mut().zip(chunk.chunks(BYTES_PER_PIXEL)) {
        *cell = Pixel::from_bytes(rgb);
    }
    grid
}

/// Lazy, single-pass sequence of grids over a byte slice.
#[derive(Debug)]
pub struct Pack<'a> {
    chunks: Chunks<'a, u8>,
    config: Configuration,
}

impl Iterator for Pack<'_> {
    type Item = DataGrid;

    fn next(&mut self) -> Option<Self::Item> {
        // Chunks are cut at grid_capacity.
        self.chunks.next().map(|chunk| fill_grid(chunk, &self.config))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Pack<'_> {}

/// Split `bytes` into grids of `divisions^2` pixels. Empty input yields no grids.
pub fn pack<'a>(bytes: &'a [u8], config: &Configuration) -> Pack<'a> {
    Pack { chunks: bytes.chunks(config.grid_capacity()), config: *config }
}

/// Number of grids `pack` yields for `len` input bytes.
pub fn grid_count(len: usize, config: &Configuration) -> usize {
    len.div_ceil(config.grid_capacity())
}

/// Block-replicate a grid to a `frame_size` square raster.
pub fn render(grid: &DataGrid, config: &Configuration) -> Result<RenderedFrame, FrameError> {
    if grid.divisions() != config.divisions() {
        return Err(FrameError::GridMismatch {
            expected: config.divisions(),
            actual: grid.divisions(),
        });
    }

    let block = config.block_size() as usize;
    let stride = config.frame_size() as usize * BYTES_PER_PIXEL;
    let mut data = Vec::with_capacity(config.frame_len());
    let mut line = Vec::with_capacity(stride);

    for row in grid.rows() {
        // Build one raster line for this grid row, then repeat it `block` times.
        line.clear();
        for px in row {
            let rgb = px.to_bytes();
            for _ in 0..block {
                line.extend_from_slice(&rgb);
            }
        }
        for _ in 0..block {
            data.extend_from_slice(&line);
        }
    }

    RenderedFrame::from_raw(config.frame_size(), data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_pixel_is_zero_padded() {
        let c = Configuration::new(2, 2).unwrap();
        let g = pack_grid(&[9, 8, 7, 6], &c).unwrap();
        assert_eq!(g.get(0, 0), Some(Pixel::new(9, 8, 7)));
        assert_eq!(g.get(0, 1), Some(Pixel::new(6, 0, 0)));
        assert_eq!(g.get(1, 1), Some(Pixel::BLACK));
    }

    #[test]
    fn pack_yields_every_grid_up_to_the_last_partial_one() {
        let c = Configuration::new(4, 2).unwrap();
        let bytes: Vec<u8> = (1..=25).collect();
        let grids: Vec<DataGrid> = pack(&bytes, &c).collect();
        assert_eq!(grids.len(), grid_count(bytes.len(), &c));
        assert_eq!(grids[1], pack_grid(&bytes[12..24], &c).unwrap());
        assert_eq!(grids[2].get(0, 0), Some(Pixel::new(25, 0, 0)));
        assert_eq!(grids[2].get(0, 1), Some(Pixel::BLACK));
    }

    #[test]
    fn grid_count_rounds_up() {
        let c = Configuration::new(4, 2).unwrap();
        assert_eq!(grid_count(0, &c), 0);
        assert_eq!(grid_count(12, &c), 1);
        assert_eq!(grid_count(13, &c), 2);
    }
}
