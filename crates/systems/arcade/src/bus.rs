//! Board memory bus
//!
//! Main lane memory map (defaults, see [`crate::profile::STANDARD_MEMORY`]):
//! - 0x0000-0xBFFF: program ROM
//! - 0xC000-0xCFFF: I/O window over the I/O scratch RAM
//!   - 0x000 + n*0x100: input slot n (lane A, read)
//!   - 0x400: sound command (lane A, write)
//!   - 0x700: doorbell (read rings the peer, write arms self)
//!   - 0xE00: hard-wired flags (reads 0xFF, when enabled)
//! - 0xD000-0xFFFF: fast shared RAM (sprites, tilemap, status panel)
//!
//! Sound lane:
//! - 0x0000-0xBFFF: program ROM
//! - 0xC000-0xC7FF: RAM
//! - 0xE000: command mailbox (read acknowledges)
//! - 0xE800/0xF000: sound chip 0/1 ports
//! - 0xF800: status register (write = clear mask in upper nibble)

use crate::input::InputPortMapper;
use crate::lane::Lane;
use crate::latch::InterCpuLatchController;
use crate::memory::SharedMemoryArena;
use crate::profile::GameProfile;
use crate::router::{Access, AddressSpaceRouter, RegionKind};
use crate::sound::SoundCommandRouter;
use crate::ArcadeError;
use emu_core::apu::{SilentChip, SoundChip};
use emu_core::logging::{log, LogCategory, LogLevel};

/// Byte-wide memory as one lane's CPU sees it.
pub trait LaneMemory {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, val: u8);
}

/// All mutable machine state, owned in one place.
pub struct Board {
    profile: GameProfile,
    arena: SharedMemoryArena,
    roms: [Vec<u8>; 3],
    ram: [Vec<u8>; 3],
    latch: InterCpuLatchController,
    sound: SoundCommandRouter,
    inputs: InputPortMapper,
    chips: [Box<dyn SoundChip>; 2],
    routers: [AddressSpaceRouter; 3],
}

impl Board {
    /// Board with silent sound chips.
    pub fn new(profile: GameProfile) -> Self {
        Self::with_chips(
            profile,
            [Box::new(SilentChip::new()), Box::new(SilentChip::new())],
        )
    }

    pub fn with_chips(profile: GameProfile, chips: [Box<dyn SoundChip>; 2]) -> Self {
        let routers = Lane::ALL.map(|lane| AddressSpaceRouter::for_lane(lane, &profile));
        let ram = Lane::ALL.map(|lane| {
            let size = routers[lane.index()]
                .entries()
                .iter()
                .filter(|e| e.kind == RegionKind::Ram)
                .map(|e| e.end as usize - e.start as usize + 1)
                .max()
                .unwrap_or(0);
            vec![0u8; size]
        });

        Self {
            arena: SharedMemoryArena::new(&profile.memory),
            roms: [Vec::new(), Vec::new(), Vec::new()],
            ram,
            latch: InterCpuLatchController::new(),
            sound: SoundCommandRouter::new(),
            inputs: InputPortMapper::new(profile.input_port_map, profile.sound_busy_bit),
            chips,
            routers,
            profile,
        }
    }

    pub fn read(&mut self, lane: Lane, addr: u16) -> u8 {
        let i = lane.index();
        let Some(entry) = self.routers[i].resolve(addr, Access::Read).copied() else {
            log(LogCategory::Bus, LogLevel::Trace, || {
                format!("{} unmapped read {:04X}", lane, addr)
            });
            return self.arena.fallback_read(lane, addr);
        };
        let offset = entry.offset(addr);

        match entry.kind {
            RegionKind::Rom => self.roms[i].get(offset).copied().unwrap_or(0xFF),
            RegionKind::Ram => self.ram[i].get(offset).copied().unwrap_or(0),
            RegionKind::Shared(id) => match self.arena.region(id).read_as(lane, addr) {
                Some(val) => val,
                None => self.arena.fallback_read(lane, addr),
            },
            RegionKind::Doorbell => self.latch.notify_peer(lane),
            RegionKind::SoundMailbox => self.sound.clear_on_read(),
            RegionKind::SoundStatus => self.sound.read_register(),
            RegionKind::SoundChip(n) => self.chips[n as usize & 1].read(offset as u8),
            RegionKind::InputPort(slot) => self.inputs.read_slot(slot, self.sound.is_busy()),
            RegionKind::HardFlag => 0xFF,
            RegionKind::SoundCommand => self.arena.fallback_read(lane, addr),
        }
    }

    pub fn write(&mut self, lane: Lane, addr: u16, val: u8) {
        let i = lane.index();
        let Some(entry) = self.routers[i].resolve(addr, Access::Write).copied() else {
            log(LogCategory::Bus, LogLevel::Trace, || {
                format!("{} unmapped write {:04X} = {:02X}", lane, addr, val)
            });
            self.arena.fallback_write(lane, addr, val);
            return;
        };
        let offset = entry.offset(addr);

        match entry.kind {
            RegionKind::Rom => {
                log(LogCategory::Bus, LogLevel::Debug, || {
                    format!("{} write to ROM {:04X} = {:02X} ignored", lane, addr, val)
                });
            }
            RegionKind::Ram => {
                if let Some(slot) = self.ram[i].get_mut(offset) {
                    *slot = val;
                }
            }
            RegionKind::Shared(id) => {
                if !self.arena.region_mut(id).write_as(lane, addr, val) {
                    self.arena.fallback_write(lane, addr, val);
                }
            }
            RegionKind::Doorbell => self.latch.doorbell_write(lane),
            RegionKind::SoundCommand => self.sound.write_command(val),
            RegionKind::SoundStatus => self.sound.write_register_mask(val),
            RegionKind::SoundChip(n) => self.chips[n as usize & 1].write(offset as u8, val),
            RegionKind::SoundMailbox | RegionKind::InputPort(_) | RegionKind::HardFlag => {
                self.arena.fallback_write(lane, addr, val);
            }
        }
    }

    /// Borrow the bus as seen by one lane.
    pub fn bus(&mut self, lane: Lane) -> LaneBus<'_> {
        LaneBus { board: self, lane }
    }

    /// Size of the ROM window of `lane`.
    pub fn rom_capacity(&self, lane: Lane) -> usize {
        let end = match lane {
            Lane::A | Lane::B => self.profile.memory.rom_end,
            Lane::Sound => self.profile.memory.sound.rom_end,
        };
        end as usize + 1
    }

    pub fn load_rom(&mut self, lane: Lane, data: &[u8]) -> Result<(), ArcadeError> {
        let capacity = self.rom_capacity(lane);
        if data.len() > capacity {
            return Err(ArcadeError::RomTooLarge {
                lane,
                size: data.len(),
                capacity,
            });
        }
        self.roms[lane.index()] = data.to_vec();
        log(LogCategory::Bus, LogLevel::Info, || {
            format!("{}: loaded {} bytes of ROM", lane, data.len())
        });
        Ok(())
    }

    pub fn unload_rom(&mut self, lane: Lane) {
        self.roms[lane.index()].clear();
    }

    pub fn rom_loaded(&self, lane: Lane) -> bool {
        !self.roms[lane.index()].is_empty()
    }

    /// Clock both sound chips and latch their completions into the status
    /// register.
    pub fn advance_chips(&mut self, cycles: u32) {
        for (n, chip) in self.chips.iter_mut().enumerate() {
            if chip.advance(cycles) {
                self.sound.on_chip_completion(n as u8);
            }
        }
    }

    /// Power-on state; ROMs stay loaded.
    pub fn reset(&mut self) {
        self.arena.reset();
        for ram in &mut self.ram {
            ram.fill(0);
        }
        self.latch.reset();
        self.sound.reset();
        self.inputs.reset();
        for chip in &mut self.chips {
            chip.reset();
        }
    }

    pub fn profile(&self) -> &GameProfile {
        &self.profile
    }

    pub fn arena(&self) -> &SharedMemoryArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut SharedMemoryArena {
        &mut self.arena
    }

    pub fn latch(&self) -> &InterCpuLatchController {
        &self.latch
    }

    pub fn latch_mut(&mut self) -> &mut InterCpuLatchController {
        &mut self.latch
    }

    pub fn sound(&self) -> &SoundCommandRouter {
        &self.sound
    }

    pub fn sound_mut(&mut self) -> &mut SoundCommandRouter {
        &mut self.sound
    }

    pub fn inputs(&self) -> &InputPortMapper {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut InputPortMapper {
        &mut self.inputs
    }

    pub fn router(&self, lane: Lane) -> &AddressSpaceRouter {
        &self.routers[lane.index()]
    }

    pub fn chip(&self, n: usize) -> Option<&dyn SoundChip> {
        self.chips.get(n).map(|c| &**c)
    }
}

/// One lane's view of the board, handed to the executor for a slice.
pub struct LaneBus<'a> {
    board: &'a mut Board,
    lane: Lane,
}

impl LaneBus<'_> {
    pub fn lane(&self) -> Lane {
        self.lane
    }
}

impl LaneMemory for LaneBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        self.board.read(self.lane, addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.board.write(self.lane, addr, val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::by_name;

    fn board(title: &str) -> Board {
        Board::new(by_name(title).unwrap())
    }

    #[test]
    fn test_shared_ram_visible_to_both_lanes() {
        let mut board = board("ikari");
        board.write(Lane::A, 0xD400, 0x5A);
        assert_eq!(board.read(Lane::B, 0xD400), 0x5A);
        board.write(Lane::B, 0xC123, 0x77);
        assert_eq!(board.read(Lane::A, 0xC123), 0x77);
    }

    #[test]
    fn test_rom_reads_and_ignored_writes() {
        let mut board = board("ikari");
        board.load_rom(Lane::A, &[0x3E, 0x01]).unwrap();
        assert_eq!(board.read(Lane::A, 0x0001), 0x01);
        assert_eq!(board.read(Lane::A, 0x0002), 0xFF);
        board.write(Lane::A, 0x0000, 0x00);
        assert_eq!(board.read(Lane::A, 0x0000), 0x3E);
        assert_eq!(board.read(Lane::B, 0x0000), 0xFF);
    }

    #[test]
    fn test_rom_too_large() {
        let mut board = board("ikari");
        let err = board.load_rom(Lane::Sound, &vec![0; 0xC001]).unwrap_err();
        assert!(matches!(err, ArcadeError::RomTooLarge { capacity: 0xC000, .. }));
        assert!(!board.rom_loaded(Lane::Sound));
    }

    #[test]
    fn test_doorbell_through_bus() {
        let mut board = board("ikari");
        board.write(Lane::A, 0xC700, 0);
        assert_eq!(board.read(Lane::B, 0xC700), 0xFF);
        assert_eq!(board.latch_mut().take_interrupts(Lane::A), 1);
        assert!(!board.latch().state(Lane::A).enabled());
    }

    #[test]
    fn test_sound_command_round_trip() {
        let mut board = board("ikari");
        board.write(Lane::A, 0xC400, 0x42);
        assert_eq!(board.read(Lane::Sound, 0xF800), 0x0C);
        assert_eq!(board.read(Lane::Sound, 0xE000), 0x42);
        assert_eq!(board.read(Lane::Sound, 0xF800), 0x00);
    }

    #[test]
    fn test_status_port_reports_busy() {
        let mut board = board("ikari");
        assert_eq!(board.read(Lane::A, 0xC000) & 0x01, 0);
        board.write(Lane::A, 0xC400, 1);
        assert_eq!(board.read(Lane::A, 0xC000) & 0x01, 0x01);
    }

    #[test]
    fn test_hard_flag() {
        let mut with = board("ikari");
        assert_eq!(with.read(Lane::B, 0xCE00), 0xFF);

        let mut without = board("tnk3");
        assert_eq!(without.read(Lane::A, 0xCE00), 0x00);
    }

    #[test]
    fn test_unmapped_falls_back_to_lane_ram() {
        let mut board = board("gwar");
        board.write(Lane::Sound, 0xD000, 0x99);
        assert_eq!(board.read(Lane::Sound, 0xD000), 0x99);
        board.write(Lane::Sound, 0xC010, 0x11);
        assert_eq!(board.read(Lane::Sound, 0xC010), 0x11);
    }

    #[test]
    fn test_chip_ports_and_completion() {
        struct OneShot {
            fired: bool,
        }
        impl SoundChip for OneShot {
            fn write(&mut self, _port: u8, _val: u8) {}
            fn advance(&mut self, _cycles: u32) -> bool {
                !std::mem::replace(&mut self.fired, true)
            }
            fn reset(&mut self) {
                self.fired = false;
            }
            fn name(&self) -> &str {
                "one-shot"
            }
        }

        let mut board = Board::with_chips(
            by_name("gwar").unwrap(),
            [Box::new(SilentChip::new()), Box::new(OneShot { fired: false })],
        );
        board.advance_chips(100);
        assert_eq!(board.sound().read_register(), 0x02);
        board.advance_chips(100);
        board.write(Lane::Sound, 0xF800, 0xDF);
        assert_eq!(board.sound().read_register(), 0x00);

        board.write(Lane::Sound, 0xE801, 0x3C);
        assert_eq!(board.chip(1).unwrap().name(), "one-shot");
    }

    #[test]
    fn test_reset_keeps_roms() {
        let mut board = board("ikari");
        board.load_rom(Lane::A, &[1, 2, 3]).unwrap();
        board.write(Lane::A, 0xD000, 7);
        board.reset();
        assert_eq!(board.read(Lane::A, 0xD000), 0);
        assert!(board.rom_loaded(Lane::A));
    }
}
