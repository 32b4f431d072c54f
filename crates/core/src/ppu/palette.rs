//! Indexed palette storage.
//!
//! Pens produced by the compositors are indices into a palette table holding
//! ARGB8888 colors. Arcade boards usually derive the table from color PROMs;
//! [`RamPalette::from_rgb444`] covers the common 4-bit-per-gun layout.

/// Maps pen indices to ARGB colors.
pub trait IndexedPalette {
    /// ARGB color (0xAARRGGBB) for a pen.
    fn get_color(&self, index: usize) -> u32;

    fn set_color(&mut self, index: usize, color: u32);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A simple RAM-based palette.
#[derive(Debug, Clone)]
pub struct RamPalette {
    colors: Vec<u32>,
}

impl RamPalette {
    /// Create a palette of `size` opaque black entries.
    pub fn new(size: usize) -> Self {
        Self {
            colors: vec![0xFF000000; size],
        }
    }

    pub fn from_colors(colors: Vec<u32>) -> Self {
        Self { colors }
    }

    /// Build from three parallel PROMs holding the low nibble of each gun.
    pub fn from_rgb444(red: &[u8], green: &[u8], blue: &[u8]) -> Self {
        let len = red.len().min(green.len()).min(blue.len());
        let expand = |v: u8| ((v & 0x0F) as u32) * 0x11;
        let colors = (0..len)
            .map(|i| {
                0xFF000000 | (expand(red[i]) << 16) | (expand(green[i]) << 8) | expand(blue[i])
            })
            .collect();
        Self { colors }
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }
}

impl IndexedPalette for RamPalette {
    /// Out-of-range pens resolve to opaque black.
    fn get_color(&self, index: usize) -> u32 {
        self.colors.get(index).copied().unwrap_or(0xFF000000)
    }

    fn set_color(&mut self, index: usize, color: u32) {
        if let Some(slot) = self.colors.get_mut(index) {
            *slot = color;
        }
    }

    fn len(&self) -> usize {
        self.colors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_palette_creation() {
        let palette = RamPalette::new(16);
        assert_eq!(palette.len(), 16);
        assert!(!palette.is_empty());
        assert!((0..16).all(|i| palette.get_color(i) == 0xFF000000));
    }

    #[test]
    fn test_ram_palette_out_of_bounds() {
        let mut palette = RamPalette::new(4);
        assert_eq!(palette.get_color(10), 0xFF000000);
        palette.set_color(10, 0xFFFF0000);
        assert_eq!(palette.len(), 4);
    }

    #[test]
    fn test_rgb444_expansion() {
        let palette = RamPalette::from_rgb444(&[0x0F, 0x00], &[0x08, 0x00], &[0x01, 0xFF]);
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get_color(0), 0xFFFF8811);
        // Only the low nibble of each PROM byte is wired.
        assert_eq!(palette.get_color(1), 0xFF0000FF);
    }
}
