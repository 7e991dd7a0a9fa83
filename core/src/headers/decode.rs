//! src/headers/decode.rs
//!
//! Metadata block decoding.
//!
//! - Samples the frame at stride `frame_size / 3`.
//! - The magic cell is checked first; nothing else is trusted before it.
//! - Text fields stop at the first zero channel.

use crate::config::Configuration;
use crate::constants::{EXTENSION_MAX_LEN, FILENAME_MAX_LEN, METADATA_DIVISIONS, METADATA_MAGIC};
use crate::framing::{sample, DataGrid, FrameError, Pixel, RenderedFrame};
use crate::headers::types::{
    HeaderError, Metadata, DIVISIONS_CELL, EXTENSION_CELL, FILENAME_START_ROW, MAGIC_CELL,
};

fn cell(grid: &DataGrid, (row, col): (u32, u32)) -> Pixel {
    grid.get(row, col).unwrap_or_default()
}

/// Read Latin-1 characters from channel bytes until the first zero.
fn decode_chars(channels: impl IntoIterator<Item = u8>, max: usize) -> String {
    channels
        .into_iter()
        .take(max)
        .take_while(|&b| b != 0)
        .map(char::from)
        .collect()
}

/// Parse an already-sampled 3x3 block.
pub fn parse_metadata_block(grid: &DataGrid) -> Result<Metadata, HeaderError> {
    if grid.divisions() != METADATA_DIVISIONS {
        return Err(FrameError::GridMismatch {
            expected: METADATA_DIVISIONS,
            actual: grid.divisions(),
        }
        .into());
    }

    let magic = cell(grid, MAGIC_CELL);
    if magic.to_u24() != METADATA_MAGIC {
        return Err(HeaderError::FormatMismatch { have: magic.to_bytes() });
    }

    let divisions = u32::from(cell(grid, DIVISIONS_CELL).r);
    if divisions == 0 {
        return Err(HeaderError::InvalidDivisions { have: divisions });
    }

    let extension = decode_chars(cell(grid, EXTENSION_CELL).channels(), EXTENSION_MAX_LEN);

    let start = (FILENAME_START_ROW * METADATA_DIVISIONS) as usize;
    let filename = decode_chars(
        grid.cells()[start..].iter().flat_map(|px| px.channels()),
        FILENAME_MAX_LEN,
    );

    Ok(Metadata { divisions, filename, extension })
}

/// Decode the metadata frame.
///
/// # Errors
/// - `HeaderError::FormatMismatch` if cell (0,0) is not the magic constant.
/// - `HeaderError::InvalidDivisions` if the stored division count is zero.
/// - `HeaderError::Config` if the frame side is not divisible by 3.
pub fn decode_metadata(frame: &RenderedFrame) -> Result<Metadata, HeaderError> {
    let geometry = Configuration::metadata(frame.size())?;
    let grid = sample(frame, &geometry)?;
    parse_metadata_block(&grid)
}
