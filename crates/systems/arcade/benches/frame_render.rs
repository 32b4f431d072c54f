use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emu_arcade::memory::SharedMemoryArena;
use emu_arcade::profile::{by_name, GameProfile};
use emu_arcade::video::{FrameRenderer, GraphicsSet};
use emu_core::ppu::{RamPalette, TileSheet};

/// Graphics with distinct pens so blits do real work.
fn graphics(profile: &GameProfile) -> GraphicsSet {
    let cell = profile.background.cell_size;
    let tile_pixels = (0..1024 * cell as usize * cell as usize)
        .map(|i| (i % 15) as u8)
        .collect();
    let small = profile.small_sprites.size;
    let big = profile.big_sprites.map(|l| l.size).unwrap_or(small);
    GraphicsSet {
        tiles: TileSheet::new(cell, cell, tile_pixels),
        small_sprites: TileSheet::solid(small, small, 256, 3),
        big_sprites: TileSheet::solid(big, big, 64, 4),
        glyphs: TileSheet::solid(8, 8, 512, 1),
        palette: RamPalette::new(0x400),
    }
}

/// Fill the tilemap and sprite tables with a varied pattern.
fn populate(arena: &mut SharedMemoryArena, profile: &GameProfile, seed: u8) {
    let bg = &profile.background;
    for i in 0..bg.map_bytes() as u16 {
        arena.poke(profile.tilemap_base + i, (i as u8).wrapping_mul(7).wrapping_add(seed));
    }
    let sprites = &profile.small_sprites;
    for i in 0..sprites.table_bytes() as u16 {
        arena.poke(sprites.table_base + i, (i as u8).wrapping_mul(13));
    }
}

fn bench_background_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_render");

    for title in ["tnk3", "ikari"] {
        let profile = by_name(title).unwrap();
        let gfx = graphics(&profile);

        group.bench_with_input(BenchmarkId::new("cached", title), &profile, |b, profile| {
            let mut arena = SharedMemoryArena::new(&profile.memory);
            populate(&mut arena, profile, 0);
            let mut renderer = FrameRenderer::new(profile);
            renderer.render(&arena, &gfx);
            b.iter(|| black_box(renderer.render(&arena, &gfx)));
        });

        group.bench_with_input(BenchmarkId::new("dirty", title), &profile, |b, profile| {
            let mut arena = SharedMemoryArena::new(&profile.memory);
            populate(&mut arena, profile, 0);
            let mut renderer = FrameRenderer::new(profile);
            b.iter(|| {
                renderer.invalidate();
                black_box(renderer.render(&arena, &gfx))
            });
        });
    }

    group.finish();
}

fn bench_scrolling_frame(c: &mut Criterion) {
    let profile = by_name("ikari").unwrap();
    let gfx = graphics(&profile);
    let mut arena = SharedMemoryArena::new(&profile.memory);
    populate(&mut arena, &profile, 0);
    let mut renderer = FrameRenderer::new(&profile);
    let scroll = profile.background.scroll_x.low;

    c.bench_function("frame_render_scrolling", |b| {
        let mut x = 0u8;
        b.iter(|| {
            x = x.wrapping_add(1);
            arena.poke(scroll, x);
            black_box(renderer.render(&arena, &gfx))
        });
    });
}

criterion_group!(benches, bench_background_pass, bench_scrolling_frame);
criterion_main!(benches);
