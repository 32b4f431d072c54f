//! Per-lane address decoding.
//!
//! Each lane gets an ordered table of address ranges. The first entry whose
//! range contains the address and whose access mode allows the direction
//! wins; addresses no entry claims fall through to the lane's backing RAM.

use crate::lane::Lane;
use crate::memory::SharedId;
use crate::profile::{GameProfile, INPUT_SLOTS};
use std::fmt;

/// Direction(s) an entry responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    fn permits(self, dir: Access) -> bool {
        self == Access::ReadWrite || self == dir
    }
}

/// What handles an access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Rom,
    /// Lane-private RAM.
    Ram,
    Shared(SharedId),
    Doorbell,
    SoundCommand,
    SoundMailbox,
    SoundStatus,
    SoundChip(u8),
    InputPort(u8),
    HardFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    pub start: u16,
    /// Inclusive.
    pub end: u16,
    pub access: Access,
    pub kind: RegionKind,
}

impl MapEntry {
    pub fn contains(&self, addr: u16) -> bool {
        (self.start..=self.end).contains(&addr)
    }

    pub fn offset(&self, addr: u16) -> usize {
        (addr - self.start) as usize
    }
}

impl fmt::Display for MapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04X}-{:04X} {:?} {:?}",
            self.start, self.end, self.access, self.kind
        )
    }
}

// Last address of a `size`-byte window, clamped to the 64K space.
fn last(base: u16, size: u16) -> u16 {
    base.saturating_add(size.saturating_sub(1))
}

#[derive(Debug, Clone)]
pub struct AddressSpaceRouter {
    lane: Lane,
    entries: Vec<MapEntry>,
}

impl AddressSpaceRouter {
    pub fn new(lane: Lane) -> Self {
        Self {
            lane,
            entries: Vec::new(),
        }
    }

    /// Append an entry. Earlier entries take priority.
    pub fn map(mut self, start: u16, end: u16, access: Access, kind: RegionKind) -> Self {
        self.entries.push(MapEntry {
            start,
            end,
            access,
            kind,
        });
        self
    }

    /// Build the table a lane sees for `profile`.
    pub fn for_lane(lane: Lane, profile: &GameProfile) -> Self {
        let mem = &profile.memory;
        let io = |offset: u16| mem.io_base.wrapping_add(offset);

        match lane {
            Lane::A | Lane::B => {
                let mut router = Self::new(lane).map(
                    io(mem.doorbell_offset),
                    io(mem.doorbell_offset),
                    Access::ReadWrite,
                    RegionKind::Doorbell,
                );
                if profile.hard_flags_enabled {
                    router = router.map(
                        io(mem.hard_flag_offset),
                        io(mem.hard_flag_offset),
                        Access::Read,
                        RegionKind::HardFlag,
                    );
                }
                if lane == Lane::A {
                    router = router.map(
                        io(mem.sound_command_offset),
                        io(mem.sound_command_offset),
                        Access::Write,
                        RegionKind::SoundCommand,
                    );
                    for slot in 0..INPUT_SLOTS as u16 {
                        let addr = io(slot.wrapping_mul(mem.input_stride));
                        router = router.map(addr, addr, Access::Read, RegionKind::InputPort(slot as u8));
                    }
                }
                router
                    .map(
                        mem.io_base,
                        last(mem.io_base, mem.io_size),
                        Access::ReadWrite,
                        RegionKind::Shared(SharedId::IoScratch),
                    )
                    .map(
                        mem.shared_base,
                        last(mem.shared_base, mem.shared_size),
                        Access::ReadWrite,
                        RegionKind::Shared(SharedId::Fast),
                    )
                    .map(0x0000, mem.rom_end, Access::ReadWrite, RegionKind::Rom)
            }
            Lane::Sound => {
                let snd = &mem.sound;
                Self::new(lane)
                    .map(0x0000, snd.rom_end, Access::ReadWrite, RegionKind::Rom)
                    .map(
                        snd.ram_base,
                        last(snd.ram_base, snd.ram_size),
                        Access::ReadWrite,
                        RegionKind::Ram,
                    )
                    .map(snd.mailbox, snd.mailbox, Access::Read, RegionKind::SoundMailbox)
                    .map(
                        snd.chip_ports[0],
                        snd.chip_ports[0].saturating_add(1),
                        Access::ReadWrite,
                        RegionKind::SoundChip(0),
                    )
                    .map(
                        snd.chip_ports[1],
                        snd.chip_ports[1].saturating_add(1),
                        Access::ReadWrite,
                        RegionKind::SoundChip(1),
                    )
                    .map(snd.status, snd.status, Access::ReadWrite, RegionKind::SoundStatus)
            }
        }
    }

    /// First entry handling `addr` in direction `dir` (`Read` or `Write`).
    pub fn resolve(&self, addr: u16, dir: Access) -> Option<&MapEntry> {
        self.entries
            .iter()
            .find(|e| e.contains(addr) && e.access.permits(dir))
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// Human-readable decode of `addr` for both directions.
    pub fn describe(&self, addr: u16) -> String {
        let show = |dir| {
            self.resolve(addr, dir)
                .map(|e| format!("{:?}", e.kind))
                .unwrap_or_else(|| "fallback RAM".to_string())
        };
        format!(
            "{} {:04X}: read -> {}, write -> {}",
            self.lane,
            addr,
            show(Access::Read),
            show(Access::Write)
        )
    }
}
