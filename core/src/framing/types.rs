use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

use crate::constants::BYTES_PER_PIXEL;

/// One RGB cell. Carries exactly three payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel { r: 0, g: 0, b: 0 };

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a pixel from up to three bytes; missing channels are zero.
    #[inline]
    pub fn from_bytes(chunk: &[u8]) -> Self {
        let mut rgb = [0u8; BYTES_PER_PIXEL];
        let n = chunk.len().min(BYTES_PER_PIXEL);
        rgb[..n].copy_from_slice(&chunk[..n]);
        Self::from(rgb)
    }

    #[inline]
    pub const fn to_bytes(self) -> [u8; BYTES_PER_PIXEL] {
        [self.r, self.g, self.b]
    }

    /// Pixel holding a big-endian 24-bit value (R is the most significant byte).
    pub fn from_u24(value: u32) -> Self {
        let mut rgb = [0u8; BYTES_PER_PIXEL];
        BigEndian::write_u24(&mut rgb, value & 0x00FF_FFFF);
        Self::from(rgb)
    }

    pub fn to_u24(self) -> u32 {
        BigEndian::read_u24(&self.to_bytes())
    }

    /// Channels in R, G, B order.
    #[inline]
    pub const fn channels(self) -> [u8; BYTES_PER_PIXEL] {
        self.to_bytes()
    }
}

impl From<[u8; BYTES_PER_PIXEL]> for Pixel {
    fn from(rgb: [u8; BYTES_PER_PIXEL]) -> Self {
        Self { r: rgb[0], g: rgb[1], b: rgb[2] }
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Square matrix of pixels, row-major, `divisions` cells per side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataGrid {
    divisions: u32,
    cells: Vec<Pixel>,
}

impl DataGrid {
    /// All-black grid.
    pub fn new(divisions: u32) -> Self {
        let n = (divisions as usize) * (divisions as usize);
        Self { divisions, cells: vec![Pixel::BLACK; n] }
    }

    pub fn from_cells(divisions: u32, cells: Vec<Pixel>) -> Result<Self, FrameError> {
        let expected = (divisions as usize) * (divisions as usize);
        if cells.len() != expected {
            return Err(FrameError::LengthMismatch { expected, actual: cells.len() });
        }
        Ok(Self { divisions, cells })
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Pixel] {
        &mut self.cells
    }

    /// Build from nested rows; every row must be `rows.len()` long.
    pub fn from_rows(rows: &[Vec<Pixel>]) -> Result<Self, FrameError> {
        let divisions = rows.len();
        let mut cells = Vec::with_capacity(divisions * divisions);
        for row in rows {
            if row.len() != divisions {
                return Err(FrameError::LengthMismatch { expected: divisions, actual: row.len() });
            }
            cells.extend_from_slice(row);
        }
        Self::from_cells(divisions as u32, cells)
    }

    #[inline]
    pub fn divisions(&self) -> u32 {
        self.divisions
    }

    #[inline]
    pub fn cells(&self) -> &[Pixel] {
        &self.cells
    }

    #[inline]
    fn offset(&self, row: u32, col: u32) -> Option<usize> {
        if row < self.divisions && col < self.divisions {
            Some(row as usize * self.divisions as usize + col as usize)
        } else {
            None
        }
    }

    pub fn get(&self, row: u32, col: u32) -> Option<Pixel> {
        self.offset(row, col).map(|i| self.cells[i])
    }

    pub fn set(&mut self, row: u32, col: u32, px: Pixel) -> Result<(), FrameError> {
        let i = self.offset(row, col).ok_or(FrameError::OutOfBounds {
            row,
            col,
            divisions: self.divisions,
        })?;
        self.cells[i] = px;
        Ok(())
    }

    /// Rows as slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> {
        self.cells.chunks(self.divisions.max(1) as usize)
    }

    /// Payload bytes of this grid in pixel order, padding included.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.cells.len() * BYTES_PER_PIXEL);
        self.write_bytes(&mut out);
        out
    }

    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        for px in &self.cells {
            out.extend_from_slice(&px.to_bytes());
        }
    }
}

/// Owned square RGB24 raster: `size * size` pixels, 3 bytes each, no row padding.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    size: u32,
    data: Vec<u8>,
}

impl RenderedFrame {
    /// All-black raster.
    pub fn new(size: u32) -> Self {
        Self { size, data: vec![0u8; Self::byte_len(size)] }
    }

    /// Wrap a raw RGB24 buffer; its length must be exactly `size * size * 3`.
    pub fn from_raw(size: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        let expected = Self::byte_len(size);
        if data.len() != expected {
            return Err(FrameError::LengthMismatch { expected, actual: data.len() });
        }
        Ok(Self { size, data })
    }

    #[inline]
    pub fn byte_len(size: u32) -> usize {
        (size as usize) * (size as usize) * BYTES_PER_PIXEL
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.size as usize + x as usize) * BYTES_PER_PIXEL
    }

    /// Pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let i = self.offset(x, y);
        Some(Pixel::from_bytes(&self.data[i..i + BYTES_PER_PIXEL]))
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, px: Pixel) -> Result<(), FrameError> {
        if x >= self.size || y >= self.size {
            return Err(FrameError::OutOfBounds { row: y, col: x, divisions: self.size });
        }
        let i = self.offset(x, y);
        self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&px.to_bytes());
        Ok(())
    }

    /// One raster row as packed RGB bytes.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.size {
            return None;
        }
        let stride = self.size as usize * BYTES_PER_PIXEL;
        let start = y as usize * stride;
        Some(&self.data[start..start + stride])
    }

    /// True when every `size/divisions` block holds a single color.
    ///
    /// Returns false when `divisions` does not tile the raster.
    pub fn is_block_homogeneous(&self, divisions: u32) -> bool {
        if divisions == 0 || self.size % divisions != 0 {
            return false;
        }
        let block = (self.size / divisions) as usize;
        let stride = self.size as usize * BYTES_PER_PIXEL;
        for (y, row) in self.data.chunks_exact(stride).enumerate() {
            if y % block != 0 {
                // Rows inside a block must repeat the block's top row.
                let top = (y - y % block) * stride;
                if row != &self.data[top..top + stride] {
                    return false;
                }
                continue;
            }
            for run in row.chunks_exact(block * BYTES_PER_PIXEL) {
                let first = &run[..BYTES_PER_PIXEL];
                if run.chunks_exact(BYTES_PER_PIXEL).any(|px| px != first) {
                    return false;
                }
            }
        }
        true
    }
}

impl fmt::Debug for RenderedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedFrame")
            .field("size", &self.size)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("frame size mismatch: expected {expected}px, got {actual}px")]
    SizeMismatch { expected: u32, actual: u32 },

    #[error("grid mismatch: expected {expected} divisions, got {actual}")]
    GridMismatch { expected: u32, actual: u32 },

    #[error("chunk of {len} bytes exceeds grid capacity {capacity}")]
    ChunkTooLarge { len: usize, capacity: usize },

    #[error("cell ({row},{col}) outside {divisions}x{divisions} grid")]
    OutOfBounds { row: u32, col: u32, divisions: u32 },
}
