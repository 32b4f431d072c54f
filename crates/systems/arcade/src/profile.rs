//! Per-title board configuration.
//!
//! Every title running on the board differs only in data: which input lives
//! behind which I/O offset, where the background map sits, how sprite
//! attribute bits are wired, which bit of the status port reports the sound
//! CPU as busy. A [`GameProfile`] gathers all of it. Profiles are assembled by
//! small per-title factories from shared sub-tables, and can also be loaded
//! from JSON.

use serde::{Deserialize, Serialize};

use crate::ArcadeError;

/// Number of logical input slots behind the lane A I/O window.
pub const INPUT_SLOTS: usize = 12;

/// Pens per color group in every layer's palette block.
pub const PENS_PER_COLOR: u16 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

/// What the game sees when it reads one of the twelve input offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSlot {
    /// Nothing wired; reads `0xFF`.
    Unused,
    /// Raw port 0 with the sound-busy bit injected.
    Status,
    /// A raw port as polled by the frontend.
    Port(u8),
    /// 8-position rotary joystick (raw port `1 + player`).
    Rotary8(Player),
    /// 12-position rotary joystick (raw port `1 + player`).
    Rotary12(Player),
}

/// How the sprite layers are stacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpritePlacement {
    /// One small-sprite layer.
    Single,
    /// Small and big layers; a status bit in shared RAM picks the order each frame.
    Layered,
    /// Small and big layers; big sprites always drawn over small ones.
    LayeredBigOnTop,
}

/// Sound lane address map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundMap {
    pub rom_end: u16,
    pub ram_base: u16,
    pub ram_size: u16,
    /// Command mailbox; reading it acknowledges the command.
    pub mailbox: u16,
    /// First of the two ports (address, data) of each sound chip.
    pub chip_ports: [u16; 2],
    /// Status register: read returns it, write applies a clear mask.
    pub status: u16,
}

/// Main lane address map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLayout {
    pub rom_end: u16,
    pub io_base: u16,
    pub io_size: u16,
    pub shared_base: u16,
    pub shared_size: u16,
    /// Read: notify the peer lane. Write: arm this lane.
    pub doorbell_offset: u16,
    pub sound_command_offset: u16,
    pub hard_flag_offset: u16,
    /// Distance between two input slots in the I/O window.
    pub input_stride: u16,
    pub sound: SoundMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Interleave slices per video frame.
    pub slices_per_frame: u32,
    pub main_cycles_per_frame: u32,
    pub sound_cycles_per_frame: u32,
    pub frame_rate_hz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub width: u16,
    pub height: u16,
}

/// A scroll register: 8 low bits plus one bit of an extension register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollRegister {
    pub low: u16,
    pub ext: u16,
    pub ext_mask: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundLayout {
    pub columns: u16,
    pub rows: u16,
    /// Cell edge in pixels (8 or 16).
    pub cell_size: u16,
    pub bank_mask: u8,
    pub bank_shift: u8,
    pub bank_stride: u16,
    pub color_mask: u8,
    pub color_shift: u8,
    /// Applied to the decoded color to undo a palette wiring quirk.
    pub color_xor: u8,
    pub palette_base: u16,
    pub scroll_x: ScrollRegister,
    pub scroll_y: ScrollRegister,
    /// Fixed offsets added to the scroll registers; these differ between
    /// board revisions.
    pub scroll_origin_x: i16,
    pub scroll_origin_y: i16,
}

impl BackgroundLayout {
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn map_bytes(&self) -> usize {
        self.cell_count() * 2
    }
}

/// One attribute bit that adds `stride` to a sprite's tile index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankBit {
    pub mask: u8,
    pub stride: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteLayout {
    pub table_base: u16,
    pub entry_count: u16,
    /// Sprite edge in pixels.
    pub size: u16,
    pub x_high_mask: u8,
    pub y_high_mask: u8,
    pub bank_bits: [Option<BankBit>; 3],
    pub color_mask: u8,
    pub palette_base: u16,
    /// Clear pen; the pen just below it is the shadow pen.
    pub transparent_pen: u8,
    pub offset_x: i16,
    pub offset_y: i16,
}

impl SpriteLayout {
    pub fn table_bytes(&self) -> usize {
        self.entry_count as usize * 4
    }

    pub fn shadow_pen(&self) -> u8 {
        self.transparent_pen.wrapping_sub(1)
    }
}

/// Shared-RAM byte whose bit selects big-over-small sprite order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOrderBit {
    pub addr: u16,
    pub mask: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayStrip {
    pub base: u16,
    pub x: i16,
    pub y: i16,
    pub columns: u16,
    pub rows: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayLayout {
    pub strips: [OverlayStrip; 2],
    pub bank_register: u16,
    pub bank_mask: u8,
    pub bank_stride: u16,
    pub palette_base: u16,
    pub color: u8,
    pub transparent_pen: u8,
}

/// Immutable per-title record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameProfile {
    pub name: String,
    pub input_port_map: [InputSlot; INPUT_SLOTS],
    pub tilemap_base: u16,
    /// Bit of the status port that reads 1 while the sound CPU is busy.
    pub sound_busy_bit: u8,
    pub hard_flags_enabled: bool,
    pub sprite_placement: SpritePlacement,
    pub memory: MemoryLayout,
    pub timing: Timing,
    pub screen: ScreenGeometry,
    pub background: BackgroundLayout,
    pub small_sprites: SpriteLayout,
    pub big_sprites: Option<SpriteLayout>,
    pub layer_order: LayerOrderBit,
    pub overlay: OverlayLayout,
}

pub const STANDARD_MEMORY: MemoryLayout = MemoryLayout {
    rom_end: 0xBFFF,
    io_base: 0xC000,
    io_size: 0x1000,
    shared_base: 0xD000,
    shared_size: 0x3000,
    doorbell_offset: 0x700,
    sound_command_offset: 0x400,
    hard_flag_offset: 0xE00,
    input_stride: 0x100,
    sound: SoundMap {
        rom_end: 0xBFFF,
        ram_base: 0xC000,
        ram_size: 0x0800,
        mailbox: 0xE000,
        chip_ports: [0xE800, 0xF000],
        status: 0xF800,
    },
};

pub const STANDARD_TIMING: Timing = Timing {
    slices_per_frame: 100,
    main_cycles_per_frame: 66_666,
    sound_cycles_per_frame: 66_666,
    frame_rate_hz: 60.0,
};

pub const STANDARD_SCREEN: ScreenGeometry = ScreenGeometry {
    width: 288,
    height: 224,
};

pub const BACKGROUND_16X16: BackgroundLayout = BackgroundLayout {
    columns: 32,
    rows: 32,
    cell_size: 16,
    bank_mask: 0x30,
    bank_shift: 4,
    bank_stride: 256,
    color_mask: 0x0F,
    color_shift: 0,
    color_xor: 0,
    palette_base: 0x000,
    scroll_x: ScrollRegister {
        low: 0xCD00,
        ext: 0xCF00,
        ext_mask: 0x02,
    },
    scroll_y: ScrollRegister {
        low: 0xCC00,
        ext: 0xCF00,
        ext_mask: 0x01,
    },
    scroll_origin_x: 0,
    scroll_origin_y: 0,
};

pub const BACKGROUND_8X8: BackgroundLayout = BackgroundLayout {
    columns: 64,
    rows: 64,
    cell_size: 8,
    bank_mask: 0x30,
    bank_shift: 4,
    bank_stride: 256,
    color_mask: 0x0F,
    color_shift: 0,
    color_xor: 0x08,
    palette_base: 0x000,
    scroll_x: BACKGROUND_16X16.scroll_x,
    scroll_y: BACKGROUND_16X16.scroll_y,
    scroll_origin_x: 15,
    scroll_origin_y: 8,
};

pub const SMALL_SPRITES: SpriteLayout = SpriteLayout {
    table_base: 0xD000,
    entry_count: 64,
    size: 16,
    x_high_mask: 0x80,
    y_high_mask: 0x10,
    bank_bits: [
        Some(BankBit {
            mask: 0x20,
            stride: 256,
        }),
        Some(BankBit {
            mask: 0x40,
            stride: 512,
        }),
        None,
    ],
    color_mask: 0x0F,
    palette_base: 0x100,
    transparent_pen: 7,
    offset_x: 0,
    offset_y: 0,
};

pub const BIG_SPRITES: SpriteLayout = SpriteLayout {
    table_base: 0xD200,
    entry_count: 25,
    size: 32,
    x_high_mask: 0x80,
    y_high_mask: 0x10,
    bank_bits: [
        Some(BankBit {
            mask: 0x40,
            stride: 256,
        }),
        None,
        None,
    ],
    color_mask: 0x0F,
    palette_base: 0x200,
    transparent_pen: 7,
    offset_x: 0,
    offset_y: 0,
};

pub const LAYER_ORDER: LayerOrderBit = LayerOrderBit {
    addr: 0xD7F0,
    mask: 0x01,
};

pub const SIDE_PANEL: OverlayLayout = OverlayLayout {
    strips: [
        OverlayStrip {
            base: 0xD600,
            x: 0,
            y: 0,
            columns: 4,
            rows: 28,
        },
        OverlayStrip {
            base: 0xD680,
            x: 256,
            y: 0,
            columns: 4,
            rows: 28,
        },
    ],
    bank_register: 0xCF00,
    bank_mask: 0x20,
    bank_stride: 256,
    palette_base: 0x300,
    color: 0,
    transparent_pen: 15,
};

const STATUS_INPUTS: [InputSlot; INPUT_SLOTS] = [
    InputSlot::Status,
    InputSlot::Port(1),
    InputSlot::Port(2),
    InputSlot::Port(3),
    InputSlot::Unused,
    InputSlot::Port(4),
    InputSlot::Port(5),
    InputSlot::Unused,
    InputSlot::Unused,
    InputSlot::Unused,
    InputSlot::Unused,
    InputSlot::Unused,
];

const fn with_dials(mut map: [InputSlot; INPUT_SLOTS], one: InputSlot, two: InputSlot) -> [InputSlot; INPUT_SLOTS] {
    map[1] = one;
    map[2] = two;
    map
}

pub const ROTARY12_INPUTS: [InputSlot; INPUT_SLOTS] = with_dials(
    STATUS_INPUTS,
    InputSlot::Rotary12(Player::One),
    InputSlot::Rotary12(Player::Two),
);

pub const ROTARY8_INPUTS: [InputSlot; INPUT_SLOTS] = with_dials(
    STATUS_INPUTS,
    InputSlot::Rotary8(Player::One),
    InputSlot::Rotary8(Player::Two),
);

/// Builds a [`GameProfile`] starting from the standard sub-tables.
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    profile: GameProfile,
}

impl ProfileBuilder {
    pub fn input_map(mut self, map: [InputSlot; INPUT_SLOTS]) -> Self {
        self.profile.input_port_map = map;
        self
    }

    pub fn tilemap_base(mut self, base: u16) -> Self {
        self.profile.tilemap_base = base;
        self
    }

    pub fn sound_busy_bit(mut self, bit: u8) -> Self {
        self.profile.sound_busy_bit = bit;
        self
    }

    pub fn hard_flags(mut self, enabled: bool) -> Self {
        self.profile.hard_flags_enabled = enabled;
        self
    }

    pub fn sprite_placement(mut self, placement: SpritePlacement) -> Self {
        self.profile.sprite_placement = placement;
        self
    }

    pub fn sound_command_offset(mut self, offset: u16) -> Self {
        self.profile.memory.sound_command_offset = offset;
        self
    }

    pub fn memory(mut self, memory: MemoryLayout) -> Self {
        self.profile.memory = memory;
        self
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.profile.timing = timing;
        self
    }

    pub fn screen(mut self, width: u16, height: u16) -> Self {
        self.profile.screen = ScreenGeometry { width, height };
        self
    }

    pub fn background(mut self, background: BackgroundLayout) -> Self {
        self.profile.background = background;
        self
    }

    pub fn small_sprites(mut self, layout: SpriteLayout) -> Self {
        self.profile.small_sprites = layout;
        self
    }

    pub fn big_sprites(mut self, layout: Option<SpriteLayout>) -> Self {
        self.profile.big_sprites = layout;
        self
    }

    pub fn layer_order(mut self, bit: LayerOrderBit) -> Self {
        self.profile.layer_order = bit;
        self
    }

    pub fn overlay(mut self, overlay: OverlayLayout) -> Self {
        self.profile.overlay = overlay;
        self
    }

    pub fn build(self) -> GameProfile {
        self.profile
    }
}

impl GameProfile {
    pub fn builder(name: &str) -> ProfileBuilder {
        ProfileBuilder {
            profile: GameProfile {
                name: name.to_string(),
                input_port_map: STATUS_INPUTS,
                tilemap_base: 0xD800,
                sound_busy_bit: 0x20,
                hard_flags_enabled: false,
                sprite_placement: SpritePlacement::Single,
                memory: STANDARD_MEMORY,
                timing: STANDARD_TIMING,
                screen: STANDARD_SCREEN,
                background: BACKGROUND_16X16,
                small_sprites: SMALL_SPRITES,
                big_sprites: None,
                layer_order: LAYER_ORDER,
                overlay: SIDE_PANEL,
            },
        }
    }

    /// Parse and validate a profile from JSON.
    pub fn from_json(text: &str) -> Result<Self, ArcadeError> {
        let profile: GameProfile = serde_json::from_str(text)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn to_json(&self) -> Result<String, ArcadeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the geometry the compositors and router rely on.
    pub fn validate(&self) -> Result<(), ArcadeError> {
        let invalid = |msg: String| Err(ArcadeError::InvalidProfile(format!("{}: {}", self.name, msg)));

        let bg = &self.background;
        if !matches!(bg.cell_size, 8 | 16) {
            return invalid(format!("background cell size {} (expected 8 or 16)", bg.cell_size));
        }
        if bg.columns == 0 || bg.rows == 0 {
            return invalid("empty background grid".to_string());
        }
        if self.screen.width == 0 || self.screen.height == 0 {
            return invalid("empty screen".to_string());
        }
        if self.timing.slices_per_frame == 0 {
            return invalid("zero slices per frame".to_string());
        }
        if !(self.timing.frame_rate_hz.is_finite() && self.timing.frame_rate_hz > 0.0) {
            return invalid(format!("frame rate {}", self.timing.frame_rate_hz));
        }

        let mem = &self.memory;
        let windows = [
            ("I/O window", mem.io_base, mem.io_size),
            ("shared RAM", mem.shared_base, mem.shared_size),
            ("sound RAM", mem.sound.ram_base, mem.sound.ram_size),
        ];
        for (what, base, size) in windows {
            if size == 0 || base as u32 + size as u32 > 0x10000 {
                return invalid(format!("{} {:04X}+{:04X} outside the address space", what, base, size));
            }
        }
        if mem.rom_end >= mem.io_base || mem.rom_end >= mem.shared_base {
            return invalid(format!("main ROM end {:04X} overlaps RAM", mem.rom_end));
        }
        if mem.sound.rom_end >= mem.sound.ram_base {
            return invalid(format!("sound ROM end {:04X} overlaps RAM", mem.sound.rom_end));
        }
        if let Some(port) = mem.sound.chip_ports.iter().find(|&&p| p == 0xFFFF) {
            return invalid(format!("sound chip port pair at {:04X} wraps", port));
        }
        if !self.in_shared(self.tilemap_base, bg.map_bytes()) {
            return invalid(format!("tilemap at {:04X} leaves shared RAM", self.tilemap_base));
        }
        for layout in std::iter::once(&self.small_sprites).chain(self.big_sprites.as_ref()) {
            if layout.size == 0 || layout.size > 256 {
                return invalid(format!("sprite size {}", layout.size));
            }
            if !self.in_shared(layout.table_base, layout.table_bytes()) {
                return invalid(format!("sprite table at {:04X} leaves shared RAM", layout.table_base));
            }
        }
        for strip in &self.overlay.strips {
            if !self.in_shared(strip.base, strip.columns as usize * strip.rows as usize) {
                return invalid(format!("overlay strip at {:04X} leaves shared RAM", strip.base));
            }
        }
        Ok(())
    }

    fn in_shared(&self, base: u16, len: usize) -> bool {
        let start = self.memory.shared_base as usize;
        let end = start + self.memory.shared_size as usize;
        base as usize >= start && base as usize + len <= end
    }

    /// True when the title draws two sprite layers.
    pub fn has_big_sprites(&self) -> bool {
        self.sprite_placement != SpritePlacement::Single && self.big_sprites.is_some()
    }
}

/// Titles with built-in profiles.
pub const TITLES: &[&str] = &["tnk3", "ikari", "victroad", "gwar", "tdfever"];

/// Look up a built-in profile by title name.
pub fn by_name(name: &str) -> Option<GameProfile> {
    let profile = match name {
        "tnk3" => GameProfile::builder("tnk3")
            .input_map(ROTARY12_INPUTS)
            .tilemap_base(0xE000)
            .background(BACKGROUND_8X8)
            .small_sprites(SpriteLayout {
                entry_count: 50,
                color_mask: 0x07,
                bank_bits: [
                    Some(BankBit {
                        mask: 0x20,
                        stride: 256,
                    }),
                    Some(BankBit {
                        mask: 0x40,
                        stride: 512,
                    }),
                    Some(BankBit {
                        mask: 0x08,
                        stride: 1024,
                    }),
                ],
                offset_y: 8,
                ..SMALL_SPRITES
            })
            .build(),
        "ikari" => GameProfile::builder("ikari")
            .input_map(ROTARY12_INPUTS)
            .sound_busy_bit(0x01)
            .hard_flags(true)
            .sprite_placement(SpritePlacement::Layered)
            .small_sprites(SpriteLayout {
                entry_count: 50,
                ..SMALL_SPRITES
            })
            .big_sprites(Some(BIG_SPRITES))
            .build(),
        "victroad" => GameProfile::builder("victroad")
            .input_map(ROTARY12_INPUTS)
            .sound_busy_bit(0x20)
            .hard_flags(true)
            .sprite_placement(SpritePlacement::Layered)
            .background(BackgroundLayout {
                scroll_origin_x: -15,
                scroll_origin_y: 0,
                ..BACKGROUND_16X16
            })
            .small_sprites(SpriteLayout {
                entry_count: 50,
                ..SMALL_SPRITES
            })
            .big_sprites(Some(BIG_SPRITES))
            .build(),
        "gwar" => GameProfile::builder("gwar")
            .input_map(ROTARY12_INPUTS)
            .sound_busy_bit(0x01)
            .sprite_placement(SpritePlacement::LayeredBigOnTop)
            .small_sprites(SpriteLayout {
                entry_count: 96,
                ..SMALL_SPRITES
            })
            .big_sprites(Some(BIG_SPRITES))
            .build(),
        "tdfever" => GameProfile::builder("tdfever")
            .input_map(ROTARY8_INPUTS)
            .sound_command_offset(0x500)
            .small_sprites(SpriteLayout {
                entry_count: 96,
                ..SMALL_SPRITES
            })
            .build(),
        _ => return None,
    };
    Some(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_validate() {
        for name in TITLES {
            let profile = by_name(name).expect("built-in title");
            assert_eq!(&profile.name, name);
            profile.validate().expect("valid profile");
        }
        assert!(by_name("pacman").is_none());
    }

    #[test]
    fn test_titles_share_sub_tables() {
        let ikari = by_name("ikari").unwrap();
        let victroad = by_name("victroad").unwrap();
        assert_eq!(ikari.memory, victroad.memory);
        assert_eq!(ikari.big_sprites, victroad.big_sprites);
        assert_ne!(
            ikari.background.scroll_origin_x,
            victroad.background.scroll_origin_x
        );
    }

    #[test]
    fn test_sound_command_offset_override() {
        assert_eq!(by_name("tdfever").unwrap().memory.sound_command_offset, 0x500);
        assert_eq!(by_name("gwar").unwrap().memory.sound_command_offset, 0x400);
    }

    #[test]
    fn test_json_round_trip_of_builtin() {
        let profile = by_name("gwar").unwrap();
        let text = profile.to_json().unwrap();
        let parsed = GameProfile::from_json(&text).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_from_json_rejects_bad_geometry() {
        let mut profile = by_name("ikari").unwrap();
        profile.background.cell_size = 12;
        let text = serde_json::to_string(&profile).unwrap();
        assert!(matches!(
            GameProfile::from_json(&text),
            Err(ArcadeError::InvalidProfile(_))
        ));

        assert!(matches!(
            GameProfile::from_json("{ not json"),
            Err(ArcadeError::ProfileJson(_))
        ));
    }

    fn rejected(profile: &GameProfile) -> bool {
        let text = serde_json::to_string(profile).unwrap();
        matches!(GameProfile::from_json(&text), Err(ArcadeError::InvalidProfile(_)))
    }

    #[test]
    fn test_from_json_rejects_bad_memory_layout() {
        let base = by_name("ikari").unwrap();
        let cases: [fn(&mut GameProfile); 9] = [
            |p| p.memory.io_size = 0,
            |p| p.memory.io_size = 0x5000,
            |p| p.memory.shared_size = 0,
            |p| p.memory.shared_size = 0x3001,
            |p| p.memory.sound.ram_size = 0,
            |p| p.memory.sound.ram_base = 0xFFF0,
            |p| p.memory.sound.chip_ports[1] = 0xFFFF,
            |p| p.memory.rom_end = 0xC000,
            |p| p.memory.sound.rom_end = 0xC000,
        ];
        for (i, breaks) in cases.iter().enumerate() {
            let mut profile = base.clone();
            breaks(&mut profile);
            assert!(rejected(&profile), "case {} accepted", i);
        }
        assert!(!rejected(&base));
    }

    #[test]
    fn test_from_json_rejects_bad_frame_rate() {
        let mut profile = by_name("gwar").unwrap();
        profile.timing.frame_rate_hz = 0.0;
        assert!(rejected(&profile));
    }

    #[test]
    fn test_tilemap_must_fit_shared_ram() {
        let profile = GameProfile::builder("bad").tilemap_base(0xFC00).build();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_shadow_pen_is_adjacent() {
        assert_eq!(SMALL_SPRITES.shadow_pen(), 6);
    }
}
