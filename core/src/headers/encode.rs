//! src/headers/encode.rs
//!
//! Metadata block encoding.
//!
//! - Builds the fixed 3x3 block from `Metadata`.
//! - Renders it at the metadata geometry (3 divisions) so a decoder can
//!   locate it without knowing the payload division count.

use tracing::warn;

use crate::config::Configuration;
use crate::constants::{EXTENSION_MAX_LEN, FILENAME_MAX_LEN, METADATA_DIVISIONS, METADATA_MAGIC};
use crate::framing::{render, DataGrid, Pixel, RenderedFrame};
use crate::headers::types::{
    latin1_code, HeaderError, Metadata, DIVISIONS_CELL, EXTENSION_CELL, FILENAME_START_ROW,
    MAGIC_CELL,
};

/// Encode up to `max` characters into channel bytes, zero-padded to a multiple of 3.
fn encode_chars(text: &str, max: usize, field: &'static str) -> Result<Vec<u8>, HeaderError> {
    let count = text.chars().count();
    if count > max {
        warn!(field, count, max, "truncating metadata field");
    }
    let mut out = text
        .chars()
        .take(max)
        .map(|ch| latin1_code(ch, field))
        .collect::<Result<Vec<u8>, _>>()?;
    out.resize(max.div_ceil(3) * 3, 0);
    Ok(out)
}

/// Build the 3x3 metadata block.
pub fn build_metadata_block(metadata: &Metadata) -> Result<DataGrid, HeaderError> {
    metadata.validate()?;

    let mut grid = DataGrid::new(METADATA_DIVISIONS);

    let (r, c) = MAGIC_CELL;
    grid.set(r, c, Pixel::from_u24(METADATA_MAGIC))?;

    // Validated above: divisions fits the R channel.
    let (r, c) = DIVISIONS_CELL;
    grid.set(r, c, Pixel::new(metadata.divisions as u8, 0, 0))?;

    let (r, c) = EXTENSION_CELL;
    let ext = encode_chars(&metadata.extension, EXTENSION_MAX_LEN, "extension")?;
    grid.set(r, c, Pixel::from_bytes(&ext))?;

    let name = encode_chars(&metadata.filename, FILENAME_MAX_LEN, "filename")?;
    let cells = (FILENAME_START_ROW..METADATA_DIVISIONS)
        .flat_map(|row| (0..METADATA_DIVISIONS).map(move |col| (row, col)));
    for ((row, col), rgb) in cells.zip(name.chunks(3)) {
        grid.set(row, col, Pixel::from_bytes(rgb))?;
    }

    Ok(grid)
}

/// Build and render the metadata frame at `frame_size`.
///
/// # Errors
/// - `HeaderError::Config` if `frame_size` is not divisible by 3.
/// - `HeaderError::UnencodableChar` for characters outside 1..=255.
/// - `HeaderError::InvalidDivisions` if `divisions` is 0 or above 255.
pub fn encode_metadata(metadata: &Metadata, frame_size: u32) -> Result<RenderedFrame, HeaderError> {
    let geometry = Configuration::metadata(frame_size)?;
    let grid = build_metadata_block(metadata)?;
    Ok(render(&grid, &geometry)?)
}
