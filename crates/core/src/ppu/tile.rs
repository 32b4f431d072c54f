//! Decoded tile tables.
//!
//! The asset loader turns graphics ROMs into one byte per pixel (a pen index
//! local to the tile's color group). Tiles of one sheet share a size; 8x8
//! characters, 16x16 background cells and 16x16 / 32x32 sprites each live in
//! their own sheet.

use crate::logging::{log, LogCategory, LogLevel};

/// A table of equally sized decoded tiles.
#[derive(Debug, Clone, Default)]
pub struct TileSheet {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl TileSheet {
    /// Wrap decoded pixel data. Trailing bytes that do not fill a whole tile
    /// are dropped.
    pub fn new(width: u16, height: u16, mut pixels: Vec<u8>) -> Self {
        let tile_len = width as usize * height as usize;
        if tile_len == 0 {
            pixels.clear();
        } else {
            pixels.truncate(pixels.len() / tile_len * tile_len);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A sheet of `count` tiles all filled with `pen`.
    pub fn solid(width: u16, height: u16, count: usize, pen: u8) -> Self {
        Self::new(width, height, vec![pen; width as usize * height as usize * count])
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    fn tile_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn len(&self) -> usize {
        match self.tile_len() {
            0 => 0,
            n => self.pixels.len() / n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixels of tile `index`; indices past the end wrap modulo the sheet
    /// size. Returns `None` only for an empty sheet.
    pub fn tile(&self, index: usize) -> Option<&[u8]> {
        let count = self.len();
        if count == 0 {
            return None;
        }
        if index >= count {
            log(LogCategory::Video, LogLevel::Trace, || {
                format!("tile {} wrapped to {} ({} in sheet)", index, index % count, count)
            });
        }
        let start = (index % count) * self.tile_len();
        Some(&self.pixels[start..start + self.tile_len()])
    }

    /// Mutable access used by loaders and tests to paint individual tiles.
    pub fn tile_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let count = self.len();
        if count == 0 {
            return None;
        }
        let len = self.tile_len();
        let start = (index % count) * len;
        Some(&mut self.pixels[start..start + len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_counts_whole_tiles() {
        let sheet = TileSheet::new(8, 8, vec![0; 64 * 3 + 10]);
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.tile(0).map(<[u8]>::len), Some(64));
    }

    #[test]
    fn test_tile_index_wraps() {
        let mut sheet = TileSheet::solid(2, 2, 4, 0);
        sheet.tile_mut(1).unwrap().fill(7);
        assert_eq!(sheet.tile(5), Some(&[7u8, 7, 7, 7][..]));
        assert_eq!(sheet.tile(4), Some(&[0u8, 0, 0, 0][..]));
    }

    #[test]
    fn test_empty_sheet() {
        let sheet = TileSheet::default();
        assert!(sheet.is_empty());
        assert!(sheet.tile(3).is_none());
    }
}
