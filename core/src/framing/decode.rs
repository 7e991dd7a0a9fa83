use crate::config::Configuration;
use crate::constants::BYTES_PER_PIXEL;
use crate::framing::types::{DataGrid, FrameError, Pixel, RenderedFrame};

/// Recover a grid by taking the top-left pixel of every block.
///
/// Exact inverse of `render` only when blocks are homogeneous, which a
/// lossless transport guarantees.
pub fn sample(frame: &RenderedFrame, config: &Configuration) -> Result<DataGrid, FrameError> {
    if frame.size() != config.frame_size() {
        return Err(FrameError::SizeMismatch {
            expected: config.frame_size(),
            actual: frame.size(),
        });
    }

    let block = config.block_size() as usize;
    let divisions = config.divisions() as usize;
    let mut cells = Vec::with_capacity(config.cells_per_grid());

    for gy in 0..divisions {
        let line = frame.row((gy * block) as u32).ok_or(FrameError::SizeMismatch {
            expected: config.frame_size(),
            actual: frame.size(),
        })?;
        for gx in 0..divisions {
            let i = gx * block * BYTES_PER_PIXEL;
            cells.push(Pixel::from_bytes(&line[i..i + BYTES_PER_PIXEL]));
        }
    }

    DataGrid::from_cells(config.divisions(), cells)
}

/// Append one grid's payload (padding included) to `out`.
pub fn unpack_into(grid: &DataGrid, config: &Configuration, out: &mut Vec<u8>) -> Result<(), FrameError> {
    if grid.divisions() != config.divisions() {
        return Err(FrameError::GridMismatch {
            expected: config.divisions(),
            actual: grid.divisions(),
        });
    }
    grid.write_bytes(out);
    Ok(())
}

/// Concatenate the payload of every grid in emission order.
///
/// Yields `divisions^2 * 3` bytes per grid: the true stream length is not
/// stored, so trailing padding from `pack` comes back as zero bytes.
pub fn unpack<I>(grids: I, config: &Configuration) -> Result<Vec<u8>, FrameError>
where
    I: IntoIterator<Item = DataGrid>,
{
    let grids = grids.into_iter();
    let mut out = Vec::with_capacity(grids.size_hint().0 * config.grid_capacity());
    for grid in grids {
        unpack_into(&grid, config, &mut out)?;
    }
    Ok(out)
}
