//! Video pipeline
//!
//! One pass per frame, run after every CPU slice of the frame:
//!
//! ```text
//! tilemap -> TileCompositor (dirty cache, scratch torus) --scrolled blit--+
//! sprite tables -> SpriteCompositor (small, big; order per profile) -------+-> screen pens -> palette -> Frame
//! status strips -> StatusOverlay ------------------------------------------+
//! ```

pub mod overlay;
pub mod sprites;
pub mod tiles;

use crate::memory::SharedMemoryArena;
use crate::profile::{GameProfile, LayerOrderBit, SpritePlacement};
use emu_core::graphics::IndexedSurface;
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::ppu::{RamPalette, TileSheet};
use emu_core::renderer::Renderer;
use emu_core::types::Frame;

use overlay::StatusOverlay;
use sprites::{SpriteCompositor, SpritePassStats};
use tiles::{TileCompositor, TilePassStats};

/// Per-frame render state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderContext {
    /// Flipped before every frame's sprite pass; starts `false`, so the
    /// first frame rendered shows shadows.
    pub shadows_visible: bool,
    pub frame_number: u64,
}

/// Decoded graphics supplied by the asset loader.
#[derive(Debug, Clone)]
pub struct GraphicsSet {
    pub tiles: TileSheet,
    pub small_sprites: TileSheet,
    pub big_sprites: TileSheet,
    pub glyphs: TileSheet,
    pub palette: RamPalette,
}

impl GraphicsSet {
    /// Empty sheets sized for `profile` and an all-black palette.
    pub fn blank(profile: &GameProfile) -> Self {
        let cell = profile.background.cell_size;
        let small = profile.small_sprites.size;
        let big = profile.big_sprites.map(|l| l.size).unwrap_or(small);
        Self {
            tiles: TileSheet::new(cell, cell, Vec::new()),
            small_sprites: TileSheet::new(small, small, Vec::new()),
            big_sprites: TileSheet::new(big, big, Vec::new()),
            glyphs: TileSheet::new(8, 8, Vec::new()),
            palette: RamPalette::new(0x400),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub background: TilePassStats,
    pub small_sprites: SpritePassStats,
    pub big_sprites: SpritePassStats,
    pub glyphs: usize,
    pub big_over_small: bool,
}

pub struct FrameRenderer {
    ctx: RenderContext,
    tiles: TileCompositor,
    small: SpriteCompositor,
    big: Option<SpriteCompositor>,
    overlay: StatusOverlay,
    placement: SpritePlacement,
    layer_order: LayerOrderBit,
    screen: IndexedSurface,
    frame: Frame,
}

impl FrameRenderer {
    pub fn new(profile: &GameProfile) -> Self {
        let width = profile.screen.width as usize;
        let height = profile.screen.height as usize;
        let big = if profile.has_big_sprites() {
            profile.big_sprites.map(SpriteCompositor::new)
        } else {
            None
        };
        Self {
            ctx: RenderContext::default(),
            tiles: TileCompositor::new(profile),
            small: SpriteCompositor::new(profile.small_sprites),
            big,
            overlay: StatusOverlay::new(profile.overlay),
            placement: profile.sprite_placement,
            layer_order: profile.layer_order,
            screen: IndexedSurface::new(width, height),
            frame: Frame::new(width as u32, height as u32),
        }
    }

    /// Whether big sprites go over small ones this frame.
    pub fn big_over_small(&self, arena: &SharedMemoryArena) -> bool {
        match self.placement {
            SpritePlacement::Single => false,
            SpritePlacement::LayeredBigOnTop => true,
            SpritePlacement::Layered => arena.peek(self.layer_order.addr) & self.layer_order.mask != 0,
        }
    }

    /// Compose one frame from shared memory.
    pub fn render(&mut self, arena: &SharedMemoryArena, gfx: &GraphicsSet) -> FrameStats {
        self.ctx.shadows_visible = !self.ctx.shadows_visible;
        self.ctx.frame_number += 1;

        let mut stats = FrameStats {
            background: self.tiles.render(arena, &gfx.tiles, &mut self.screen),
            ..FrameStats::default()
        };

        match &self.big {
            None => {
                stats.small_sprites = self.small.draw(arena, &gfx.small_sprites, &self.ctx, &mut self.screen);
            }
            Some(big) => {
                stats.big_over_small = self.big_over_small(arena);
                if stats.big_over_small {
                    stats.small_sprites = self.small.draw(arena, &gfx.small_sprites, &self.ctx, &mut self.screen);
                    stats.big_sprites = big.draw(arena, &gfx.big_sprites, &self.ctx, &mut self.screen);
                } else {
                    stats.big_sprites = big.draw(arena, &gfx.big_sprites, &self.ctx, &mut self.screen);
                    stats.small_sprites = self.small.draw(arena, &gfx.small_sprites, &self.ctx, &mut self.screen);
                }
            }
        }

        stats.glyphs = self.overlay.draw(arena, &gfx.glyphs, &mut self.screen);
        self.screen.resolve_into(&gfx.palette, &mut self.frame);

        log(LogCategory::Video, LogLevel::Trace, || {
            format!(
                "frame {}: {} cells redrawn, {} skipped, {} sprites",
                self.ctx.frame_number,
                stats.background.redrawn,
                stats.background.skipped,
                stats.small_sprites.drawn + stats.big_sprites.drawn
            )
        });
        stats
    }

    /// Force every background cell to be redrawn on the next pass.
    pub fn invalidate(&mut self) {
        self.tiles.invalidate();
    }

    pub fn context(&self) -> RenderContext {
        self.ctx
    }

    /// Palette indices of the last composed frame.
    pub fn screen(&self) -> &IndexedSurface {
        &self.screen
    }
}

impl Renderer for FrameRenderer {
    fn get_frame(&self) -> &Frame {
        &self.frame
    }

    fn replace_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    fn clear(&mut self, color: u32) {
        self.frame.pixels.fill(color);
    }

    fn reset(&mut self) {
        self.ctx = RenderContext::default();
        self.tiles.invalidate();
        self.screen.fill(0);
        self.clear(0xFF000000);
    }

    fn name(&self) -> &str {
        "arcade video"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::by_name;

    fn gfx(profile: &GameProfile) -> GraphicsSet {
        // Small sprites: tile 0 is pen 1, big sprites: tile 0 is pen 2.
        let small = profile.small_sprites.size;
        let big = profile.big_sprites.map(|l| l.size).unwrap_or(small);
        GraphicsSet {
            tiles: TileSheet::solid(16, 16, 1, 0),
            small_sprites: TileSheet::solid(small, small, 1, 1),
            big_sprites: TileSheet::solid(big, big, 1, 2),
            glyphs: TileSheet::new(8, 8, Vec::new()),
            palette: RamPalette::from_colors((0..0x400u32).map(|i| 0xFF000000 | i).collect()),
        }
    }

    /// Put one sprite of each layer at the top-left corner.
    fn overlap(arena: &mut SharedMemoryArena, profile: &GameProfile) {
        let small = profile.small_sprites;
        for i in 0..small.entry_count {
            arena.poke(small.table_base + i * 4 + 2, 0xC0);
        }
        arena.poke(small.table_base + 2, 0);
        if let Some(big) = profile.big_sprites {
            for i in 0..big.entry_count {
                arena.poke(big.table_base + i * 4 + 2, 0xC0);
            }
            arena.poke(big.table_base + 2, 0);
        }
    }

    #[test]
    fn test_shadow_toggle_phase() {
        let profile = by_name("ikari").unwrap();
        let arena = SharedMemoryArena::new(&profile.memory);
        let mut renderer = FrameRenderer::new(&profile);
        let gfx = gfx(&profile);

        assert!(!renderer.context().shadows_visible);
        renderer.render(&arena, &gfx);
        assert!(renderer.context().shadows_visible);
        renderer.render(&arena, &gfx);
        assert!(!renderer.context().shadows_visible);
        assert_eq!(renderer.context().frame_number, 2);
    }

    #[test]
    fn test_layer_order_bit() {
        let profile = by_name("ikari").unwrap();
        let mut arena = SharedMemoryArena::new(&profile.memory);
        overlap(&mut arena, &profile);
        let mut renderer = FrameRenderer::new(&profile);
        let gfx = gfx(&profile);

        let stats = renderer.render(&arena, &gfx);
        assert!(!stats.big_over_small);
        assert_eq!(renderer.screen().get(0, 0), Some(profile.small_sprites.palette_base + 1));

        arena.poke(profile.layer_order.addr, profile.layer_order.mask);
        let stats = renderer.render(&arena, &gfx);
        assert!(stats.big_over_small);
        let big_base = profile.big_sprites.unwrap().palette_base;
        assert_eq!(renderer.screen().get(0, 0), Some(big_base + 2));
        assert_eq!(renderer.get_frame().pixel(0, 0), Some(0xFF000000 | (big_base as u32 + 2)));
    }

    #[test]
    fn test_big_on_top_ignores_order_bit() {
        let profile = by_name("gwar").unwrap();
        let mut arena = SharedMemoryArena::new(&profile.memory);
        overlap(&mut arena, &profile);
        let renderer = FrameRenderer::new(&profile);
        assert!(renderer.big_over_small(&arena));
        arena.poke(profile.layer_order.addr, 0xFF);
        assert!(renderer.big_over_small(&arena));
    }

    #[test]
    fn test_single_layer_draws_no_big_sprites() {
        let profile = by_name("tdfever").unwrap();
        let arena = SharedMemoryArena::new(&profile.memory);
        let mut renderer = FrameRenderer::new(&profile);
        let stats = renderer.render(&arena, &gfx(&profile));
        assert_eq!(stats.big_sprites.drawn, 0);
        assert_eq!(stats.small_sprites.drawn, profile.small_sprites.entry_count as usize);
    }

    #[test]
    fn test_frame_matches_screen_geometry() {
        let profile = by_name("tnk3").unwrap();
        let renderer = FrameRenderer::new(&profile);
        assert_eq!(renderer.get_frame().width, 288);
        assert_eq!(renderer.get_frame().height, 224);
        assert_eq!(renderer.name(), "arcade video");
    }

    #[test]
    fn test_reset_restores_phase_and_cache() {
        let profile = by_name("ikari").unwrap();
        let arena = SharedMemoryArena::new(&profile.memory);
        let mut renderer = FrameRenderer::new(&profile);
        let gfx = gfx(&profile);
        renderer.render(&arena, &gfx);
        renderer.reset();
        assert_eq!(renderer.context(), RenderContext::default());
        let stats = renderer.render(&arena, &gfx);
        assert_eq!(stats.background.redrawn, 32 * 32);
    }
}
