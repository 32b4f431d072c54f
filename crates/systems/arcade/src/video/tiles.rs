//! Background layer.
//!
//! Cells are redrawn into a persistent scratch surface only when their
//! `(code, attribute)` pair differs from the last rendered one. The scratch
//! surface is then copied to the screen with a single torus-wrapped
//! scrolled blit.

use crate::memory::SharedMemoryArena;
use crate::profile::{BackgroundLayout, GameProfile, ScrollRegister, PENS_PER_COLOR};
use emu_core::graphics::{blit, scrolled_blit, IndexedSurface, Transparency};
use emu_core::ppu::TileSheet;

/// Two bytes of the tilemap: tile code then attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCell {
    pub code: u8,
    pub attr: u8,
}

impl TileCell {
    pub fn tile_index(&self, layout: &BackgroundLayout) -> usize {
        let bank = (self.attr & layout.bank_mask) >> layout.bank_shift;
        self.code as usize + bank as usize * layout.bank_stride as usize
    }

    pub fn color(&self, layout: &BackgroundLayout) -> u8 {
        ((self.attr & layout.color_mask) >> layout.color_shift) ^ layout.color_xor
    }
}

/// Last rendered contents of every cell; `None` forces a redraw.
#[derive(Debug, Clone)]
pub struct DirtyCache {
    cells: Vec<Option<TileCell>>,
}

impl DirtyCache {
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<TileCell> {
        self.cells.get(index).copied().flatten()
    }

    /// Record `cell` at `index`; returns `true` if it differed (cache miss).
    pub fn update(&mut self, index: usize, cell: TileCell) -> bool {
        match self.cells.get_mut(index) {
            Some(slot) if *slot == Some(cell) => false,
            Some(slot) => {
                *slot = Some(cell);
                true
            }
            None => true,
        }
    }

    pub fn invalidate(&mut self) {
        self.cells.fill(None);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TilePassStats {
    pub redrawn: usize,
    pub skipped: usize,
}

pub struct TileCompositor {
    layout: BackgroundLayout,
    tilemap_base: u16,
    cache: DirtyCache,
    scratch: IndexedSurface,
}

/// 9-bit scroll value: low byte plus one extension bit.
pub fn read_scroll(arena: &SharedMemoryArena, reg: &ScrollRegister) -> i32 {
    let low = arena.peek(reg.low) as i32;
    if arena.peek(reg.ext) & reg.ext_mask != 0 {
        low | 0x100
    } else {
        low
    }
}

impl TileCompositor {
    pub fn new(profile: &GameProfile) -> Self {
        let layout = profile.background;
        let cell = layout.cell_size as usize;
        Self {
            cache: DirtyCache::new(layout.cell_count()),
            scratch: IndexedSurface::new(layout.columns as usize * cell, layout.rows as usize * cell),
            tilemap_base: profile.tilemap_base,
            layout,
        }
    }

    /// Redraw changed cells, then scroll the scratch surface onto `target`.
    pub fn render(
        &mut self,
        arena: &SharedMemoryArena,
        tiles: &TileSheet,
        target: &mut IndexedSurface,
    ) -> TilePassStats {
        let mut stats = TilePassStats::default();
        let layout = self.layout;
        let cell_px = layout.cell_size as i32;
        let map = arena
            .fast
            .slice(self.tilemap_base, layout.map_bytes());

        for index in 0..layout.cell_count() {
            let cell = TileCell {
                code: map.get(index * 2).copied().unwrap_or(0),
                attr: map.get(index * 2 + 1).copied().unwrap_or(0),
            };
            if !self.cache.update(index, cell) {
                stats.skipped += 1;
                continue;
            }
            stats.redrawn += 1;

            let col = (index % layout.columns as usize) as i32;
            let row = (index / layout.columns as usize) as i32;
            let pen_base = layout.palette_base + cell.color(&layout) as u16 * PENS_PER_COLOR;
            if let Some(tile) = tiles.tile(cell.tile_index(&layout)) {
                blit(
                    &mut self.scratch,
                    tile,
                    tiles.width() as usize,
                    col * cell_px,
                    row * cell_px,
                    pen_base,
                    Transparency::Opaque,
                );
            }
        }

        let (sx, sy) = self.scroll(arena);
        scrolled_blit(target, &self.scratch, sx, sy);
        stats
    }

    /// Effective scroll including the fixed origin offsets.
    pub fn scroll(&self, arena: &SharedMemoryArena) -> (i32, i32) {
        (
            read_scroll(arena, &self.layout.scroll_x) + self.layout.scroll_origin_x as i32,
            read_scroll(arena, &self.layout.scroll_y) + self.layout.scroll_origin_y as i32,
        )
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub fn cache(&self) -> &DirtyCache {
        &self.cache
    }

    pub fn scratch(&self) -> &IndexedSurface {
        &self.scratch
    }
}
