//! Indexed pen surfaces and the two blit primitives used by the compositors.

use crate::ppu::IndexedPalette;
use crate::types::Frame;

/// Which source pens a blit skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transparency {
    /// Every pen is drawn.
    Opaque,
    /// One pen is transparent.
    Pen(u8),
    /// Two pens are transparent (e.g. a shadow pen next to the clear pen).
    Pens(u8, u8),
}

impl Transparency {
    #[inline]
    fn skips(self, pen: u8) -> bool {
        match self {
            Transparency::Opaque => false,
            Transparency::Pen(p) => pen == p,
            Transparency::Pens(a, b) => pen == a || pen == b,
        }
    }
}

/// A width x height grid of 16-bit palette indices.
#[derive(Debug, Clone)]
pub struct IndexedSurface {
    width: usize,
    height: usize,
    pens: Vec<u16>,
}

impl IndexedSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pens: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn fill(&mut self, pen: u16) {
        self.pens.fill(pen);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u16> {
        if x < self.width && y < self.height {
            Some(self.pens[y * self.width + x])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, pen: u16) {
        if x < self.width && y < self.height {
            self.pens[y * self.width + x] = pen;
        }
    }

    pub fn row(&self, y: usize) -> &[u16] {
        &self.pens[y * self.width..(y + 1) * self.width]
    }

    /// Resolve every pen through `palette` into an ARGB frame of the same size.
    pub fn resolve_into<P: IndexedPalette + ?Sized>(&self, palette: &P, frame: &mut Frame) {
        if frame.width as usize != self.width || frame.height as usize != self.height {
            *frame = Frame::new(self.width as u32, self.height as u32);
        }
        for (out, &pen) in frame.pixels.iter_mut().zip(&self.pens) {
            *out = palette.get_color(pen as usize);
        }
    }
}

/// Draw a `tile_w`-wide tile bitmap at (`dst_x`, `dst_y`), clipping against
/// the surface edges. Each drawn pixel becomes `pen_base + source pen`.
///
/// Returns the number of pixels written.
pub fn blit(
    dst: &mut IndexedSurface,
    tile: &[u8],
    tile_w: usize,
    dst_x: i32,
    dst_y: i32,
    pen_base: u16,
    transparency: Transparency,
) -> usize {
    if tile_w == 0 {
        return 0;
    }
    let tile_h = tile.len() / tile_w;
    let mut written = 0;

    for ty in 0..tile_h {
        let y = dst_y + ty as i32;
        if y < 0 || y as usize >= dst.height {
            continue;
        }
        let src_row = &tile[ty * tile_w..(ty + 1) * tile_w];
        let row_start = y as usize * dst.width;
        for (tx, &pen) in src_row.iter().enumerate() {
            let x = dst_x + tx as i32;
            if x < 0 || x as usize >= dst.width || transparency.skips(pen) {
                continue;
            }
            dst.pens[row_start + x as usize] = pen_base.wrapping_add(pen as u16);
            written += 1;
        }
    }
    written
}

/// Copy `src` onto all of `dst`, treating `src` as a torus: destination pixel
/// (x, y) takes source pixel ((x + scroll_x) mod w, (y + scroll_y) mod h).
pub fn scrolled_blit(dst: &mut IndexedSurface, src: &IndexedSurface, scroll_x: i32, scroll_y: i32) {
    if src.width == 0 || src.height == 0 {
        return;
    }
    let sx0 = scroll_x.rem_euclid(src.width as i32) as usize;
    let sy0 = scroll_y.rem_euclid(src.height as i32) as usize;

    for y in 0..dst.height {
        let src_row = src.row((sy0 + y) % src.height);
        let dst_row = &mut dst.pens[y * dst.width..(y + 1) * dst.width];
        let mut sx = sx0;
        for out in dst_row.iter_mut() {
            *out = src_row[sx];
            sx += 1;
            if sx == src.width {
                sx = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::RamPalette;

    #[test]
    fn test_blit_clips_negative_origin() {
        let mut dst = IndexedSurface::new(4, 4);
        let tile = [1u8; 4];
        let written = blit(&mut dst, &tile, 2, -1, -1, 0x10, Transparency::Opaque);
        assert_eq!(written, 1);
        assert_eq!(dst.get(0, 0), Some(0x11));
        assert_eq!(dst.get(1, 0), Some(0));
    }

    #[test]
    fn test_blit_transparency_modes() {
        let tile = [0u8, 6, 7, 1];
        let mut one = IndexedSurface::new(4, 1);
        one.fill(0xFF);
        blit(&mut one, &tile, 4, 0, 0, 0, Transparency::Pen(7));
        assert_eq!(one.row(0), &[0, 6, 0xFF, 1]);

        let mut two = IndexedSurface::new(4, 1);
        two.fill(0xFF);
        blit(&mut two, &tile, 4, 0, 0, 0, Transparency::Pens(7, 6));
        assert_eq!(two.row(0), &[0, 0xFF, 0xFF, 1]);
    }

    #[test]
    fn test_scrolled_blit_wraps_both_axes() {
        let mut src = IndexedSurface::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                src.set(x, y, (y * 4 + x) as u16);
            }
        }
        let mut dst = IndexedSurface::new(2, 2);
        scrolled_blit(&mut dst, &src, 3, 3);
        assert_eq!(dst.row(0), &[15, 12]);
        assert_eq!(dst.row(1), &[3, 0]);

        scrolled_blit(&mut dst, &src, -1, 0);
        assert_eq!(dst.row(0), &[3, 0]);
    }

    #[test]
    fn test_resolve_through_palette() {
        let palette = RamPalette::from_colors(vec![0xFF000000, 0xFFFFFFFF]);
        let mut surface = IndexedSurface::new(2, 1);
        surface.set(1, 0, 1);
        let mut frame = Frame::new(1, 1);
        surface.resolve_into(&palette, &mut frame);
        assert_eq!(frame.width, 2);
        assert_eq!(frame.pixels, vec![0xFF000000, 0xFFFFFFFF]);
    }
}
