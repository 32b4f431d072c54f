//! Shared memory arena
//!
//! Two regions are shared between the main lanes: the "fast" shared RAM bank
//! and the scratch RAM behind the I/O window. Both lanes read and write the
//! same bytes with no locking; ordering comes from the doorbell protocol
//! alone. Every lane also owns a 64K fall-back RAM for unmapped addresses.

use crate::lane::{Lane, LaneSet};
use crate::profile::MemoryLayout;
use emu_core::logging::{log, LogCategory, LogLevel};

/// Which shared region a router entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedId {
    Fast,
    IoScratch,
}

#[derive(Debug, Clone)]
pub struct SharedRegion {
    pub name: &'static str,
    pub base: u16,
    data: Vec<u8>,
    pub visible_to: LaneSet,
}

impl SharedRegion {
    pub fn new(name: &'static str, base: u16, len: usize, visible_to: LaneSet) -> Self {
        Self {
            name,
            base,
            data: vec![0; len],
            visible_to,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when `addr` falls inside the region.
    pub fn contains(&self, addr: u16) -> bool {
        addr >= self.base && ((addr - self.base) as usize) < self.data.len()
    }

    /// Read at an absolute address; out-of-range reads return 0.
    pub fn read(&self, addr: u16) -> u8 {
        addr.checked_sub(self.base)
            .and_then(|off| self.data.get(off as usize))
            .copied()
            .unwrap_or(0)
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        if let Some(slot) = addr
            .checked_sub(self.base)
            .and_then(|off| self.data.get_mut(off as usize))
        {
            *slot = val;
        }
    }

    /// Read on behalf of `lane`; `None` when the region is hidden from it.
    pub fn read_as(&self, lane: Lane, addr: u16) -> Option<u8> {
        if self.visible_to.contains(lane) {
            Some(self.read(addr))
        } else {
            log(LogCategory::Bus, LogLevel::Trace, || {
                format!("{} read {:04X} in {} denied", lane, addr, self.name)
            });
            None
        }
    }

    /// Write on behalf of `lane`; false when the region is hidden from it.
    pub fn write_as(&mut self, lane: Lane, addr: u16, val: u8) -> bool {
        if self.visible_to.contains(lane) {
            self.write(addr, val);
            true
        } else {
            log(LogCategory::Bus, LogLevel::Trace, || {
                format!("{} write {:04X} = {:02X} in {} denied", lane, addr, val, self.name)
            });
            false
        }
    }

    /// Bytes starting at absolute address `addr`, clipped to the region.
    pub fn slice(&self, addr: u16, len: usize) -> &[u8] {
        let Some(start) = addr.checked_sub(self.base).map(usize::from) else {
            return &[];
        };
        let start = start.min(self.data.len());
        let end = (start + len).min(self.data.len());
        &self.data[start..end]
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

/// All RAM of the board.
#[derive(Debug, Clone)]
pub struct SharedMemoryArena {
    pub fast: SharedRegion,
    pub io_scratch: SharedRegion,
    fallback: [Vec<u8>; 3],
}

impl SharedMemoryArena {
    pub fn new(layout: &MemoryLayout) -> Self {
        Self {
            fast: SharedRegion::new(
                "fast shared RAM",
                layout.shared_base,
                layout.shared_size as usize,
                LaneSet::MAIN,
            ),
            io_scratch: SharedRegion::new(
                "I/O scratch RAM",
                layout.io_base,
                layout.io_size as usize,
                LaneSet::MAIN,
            ),
            fallback: [vec![0; 0x10000], vec![0; 0x10000], vec![0; 0x10000]],
        }
    }

    pub fn region(&self, id: SharedId) -> &SharedRegion {
        match id {
            SharedId::Fast => &self.fast,
            SharedId::IoScratch => &self.io_scratch,
        }
    }

    pub fn region_mut(&mut self, id: SharedId) -> &mut SharedRegion {
        match id {
            SharedId::Fast => &mut self.fast,
            SharedId::IoScratch => &mut self.io_scratch,
        }
    }

    /// Read shared memory the way the video hardware sees it: fast RAM
    /// first, then the I/O window scratch bytes (video registers live there).
    pub fn peek(&self, addr: u16) -> u8 {
        if self.fast.contains(addr) {
            self.fast.read(addr)
        } else if self.io_scratch.contains(addr) {
            self.io_scratch.read(addr)
        } else {
            0
        }
    }

    /// Write through the same view as [`peek`](Self::peek).
    pub fn poke(&mut self, addr: u16, val: u8) {
        if self.fast.contains(addr) {
            self.fast.write(addr, val);
        } else if self.io_scratch.contains(addr) {
            self.io_scratch.write(addr, val);
        }
    }

    pub fn fallback_read(&self, lane: Lane, addr: u16) -> u8 {
        self.fallback[lane.index()][addr as usize]
    }

    pub fn fallback_write(&mut self, lane: Lane, addr: u16, val: u8) {
        self.fallback[lane.index()][addr as usize] = val;
    }

    pub fn reset(&mut self) {
        self.fast.clear();
        self.io_scratch.clear();
        for ram in &mut self.fallback {
            ram.fill(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::STANDARD_MEMORY;

    #[test]
    fn test_region_bounds() {
        let region = SharedRegion::new("test", 0xD000, 0x100, LaneSet::MAIN);
        assert!(region.contains(0xD000));
        assert!(region.contains(0xD0FF));
        assert!(!region.contains(0xD100));
        assert!(!region.contains(0xCFFF));
        assert_eq!(region.read(0x1234), 0);
    }

    #[test]
    fn test_region_visibility() {
        let mut region = SharedRegion::new("test", 0xD000, 0x100, LaneSet::MAIN);
        assert!(region.write_as(Lane::B, 0xD010, 7));
        assert_eq!(region.read_as(Lane::A, 0xD010), Some(7));
        assert_eq!(region.read_as(Lane::Sound, 0xD010), None);
        assert!(!region.write_as(Lane::Sound, 0xD010, 9));
        assert_eq!(region.read(0xD010), 7);
    }

    #[test]
    fn test_peek_sees_both_regions() {
        let mut arena = SharedMemoryArena::new(&STANDARD_MEMORY);
        arena.poke(0xD800, 0x12);
        arena.poke(0xCD00, 0x34);
        assert_eq!(arena.peek(0xD800), 0x12);
        assert_eq!(arena.peek(0xCD00), 0x34);
        assert_eq!(arena.fast.read(0xD800), 0x12);
        assert_eq!(arena.io_scratch.read(0xCD00), 0x34);
        assert_eq!(arena.peek(0x1000), 0);
    }

    #[test]
    fn test_slice_clips() {
        let mut arena = SharedMemoryArena::new(&STANDARD_MEMORY);
        arena.poke(0xFFFF, 9);
        let tail = arena.fast.slice(0xFFFE, 16);
        assert_eq!(tail, &[0, 9]);
        assert!(arena.fast.slice(0x0000, 4).is_empty());
    }

    #[test]
    fn test_fallback_is_per_lane() {
        let mut arena = SharedMemoryArena::new(&STANDARD_MEMORY);
        arena.fallback_write(Lane::A, 0x8000, 1);
        assert_eq!(arena.fallback_read(Lane::A, 0x8000), 1);
        assert_eq!(arena.fallback_read(Lane::B, 0x8000), 0);
        arena.reset();
        assert_eq!(arena.fallback_read(Lane::A, 0x8000), 0);
    }
}
