//! Side status panel: two fixed strips of glyphs drawn over everything else.

use crate::memory::SharedMemoryArena;
use crate::profile::{OverlayLayout, PENS_PER_COLOR};
use emu_core::graphics::{blit, IndexedSurface, Transparency};
use emu_core::ppu::TileSheet;

pub struct StatusOverlay {
    layout: OverlayLayout,
}

impl StatusOverlay {
    pub fn new(layout: OverlayLayout) -> Self {
        Self { layout }
    }

    /// Bank offset applied to every glyph this frame.
    pub fn bank_offset(&self, arena: &SharedMemoryArena) -> usize {
        if arena.peek(self.layout.bank_register) & self.layout.bank_mask != 0 {
            self.layout.bank_stride as usize
        } else {
            0
        }
    }

    /// Draw both strips; returns the number of glyphs blitted.
    pub fn draw(&self, arena: &SharedMemoryArena, glyphs: &TileSheet, target: &mut IndexedSurface) -> usize {
        if glyphs.is_empty() {
            return 0;
        }
        let bank = self.bank_offset(arena);
        let gw = glyphs.width() as i32;
        let gh = glyphs.height() as i32;
        let pen_base = self.layout.palette_base + self.layout.color as u16 * PENS_PER_COLOR;
        let transparency = Transparency::Pen(self.layout.transparent_pen);
        let mut drawn = 0;

        for strip in &self.layout.strips {
            let codes = arena
                .fast
                .slice(strip.base, strip.columns as usize * strip.rows as usize);
            for (i, &code) in codes.iter().enumerate() {
                let col = (i % strip.columns as usize) as i32;
                let row = (i / strip.columns as usize) as i32;
                if let Some(glyph) = glyphs.tile(code as usize + bank) {
                    blit(
                        target,
                        glyph,
                        gw as usize,
                        strip.x as i32 + col * gw,
                        strip.y as i32 + row * gh,
                        pen_base,
                        transparency,
                    );
                    drawn += 1;
                }
            }
        }
        drawn
    }
}
