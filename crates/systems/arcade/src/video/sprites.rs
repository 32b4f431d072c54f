//! Sprite layers.
//!
//! Each layer is a fixed table of 4-byte entries `(y, code, x, attribute)`
//! drawn in table order, so later entries cover earlier ones. The attribute
//! byte carries the ninth bit of both coordinates, the tile bank bits and
//! the color.

use super::RenderContext;
use crate::memory::SharedMemoryArena;
use crate::profile::{SpriteLayout, PENS_PER_COLOR};
use emu_core::graphics::{blit, IndexedSurface, Transparency};
use emu_core::ppu::TileSheet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpriteEntry {
    pub y: u8,
    pub code: u8,
    pub x: u8,
    pub attr: u8,
}

impl SpriteEntry {
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            y: bytes[0],
            code: bytes[1],
            x: bytes[2],
            attr: bytes[3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedSprite {
    pub x: i32,
    pub y: i32,
    pub tile: usize,
    pub color: u8,
}

/// Place a 9-bit coordinate on screen. Anything at or past `512 - size`
/// continues off the top/left edge instead of appearing at the far side.
pub fn wrap_coordinate(coord: i32, offset: i32, size: i32) -> i32 {
    let c = (coord + offset) & 511;
    if c >= 512 - size {
        c - 512
    } else {
        c
    }
}

pub fn decode(entry: SpriteEntry, layout: &SpriteLayout) -> DecodedSprite {
    let size = layout.size as i32;
    let x9 = entry.x as i32 | if entry.attr & layout.x_high_mask != 0 { 256 } else { 0 };
    let y9 = entry.y as i32 | if entry.attr & layout.y_high_mask != 0 { 256 } else { 0 };

    let tile = layout
        .bank_bits
        .iter()
        .flatten()
        .filter(|bank| entry.attr & bank.mask != 0)
        .fold(entry.code as usize, |tile, bank| tile + bank.stride as usize);

    DecodedSprite {
        x: wrap_coordinate(x9, layout.offset_x as i32, size),
        y: wrap_coordinate(y9, layout.offset_y as i32, size),
        tile,
        color: entry.attr & layout.color_mask,
    }
}

/// Shadows visible: only the clear pen is skipped. Otherwise the shadow pen
/// below it is skipped as well.
pub fn transparency_for(layout: &SpriteLayout, shadows_visible: bool) -> Transparency {
    if shadows_visible {
        Transparency::Pen(layout.transparent_pen)
    } else {
        Transparency::Pens(layout.transparent_pen, layout.shadow_pen())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpritePassStats {
    pub drawn: usize,
    pub pixels: usize,
}

pub struct SpriteCompositor {
    layout: SpriteLayout,
}

impl SpriteCompositor {
    pub fn new(layout: SpriteLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SpriteLayout {
        &self.layout
    }

    /// Entries as currently stored in shared RAM.
    pub fn entries<'a>(&self, arena: &'a SharedMemoryArena) -> impl Iterator<Item = SpriteEntry> + 'a {
        arena
            .fast
            .slice(self.layout.table_base, self.layout.table_bytes())
            .chunks_exact(4)
            .map(|b| SpriteEntry::from_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn draw(
        &self,
        arena: &SharedMemoryArena,
        sheet: &TileSheet,
        ctx: &RenderContext,
        target: &mut IndexedSurface,
    ) -> SpritePassStats {
        let mut stats = SpritePassStats::default();
        if sheet.is_empty() {
            return stats;
        }
        let transparency = transparency_for(&self.layout, ctx.shadows_visible);

        for entry in self.entries(arena) {
            let sprite = decode(entry, &self.layout);
            let Some(tile) = sheet.tile(sprite.tile) else {
                continue;
            };
            let pen_base = self.layout.palette_base + sprite.color as u16 * PENS_PER_COLOR;
            stats.pixels += blit(
                target,
                tile,
                sheet.width() as usize,
                sprite.x,
                sprite.y,
                pen_base,
                transparency,
            );
            stats.drawn += 1;
        }
        stats
    }
}
