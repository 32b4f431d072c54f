//! CPU lane identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One emulated CPU with its own address space and instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    /// Main CPU A
    A,
    /// Main CPU B
    B,
    /// Audio coprocessor
    Sound,
}

impl Lane {
    /// Execution order inside every slice.
    pub const ALL: [Lane; 3] = [Lane::A, Lane::B, Lane::Sound];

    pub fn index(self) -> usize {
        match self {
            Lane::A => 0,
            Lane::B => 1,
            Lane::Sound => 2,
        }
    }

    /// The other main lane; the sound lane has no doorbell peer.
    pub fn peer(self) -> Option<Lane> {
        match self {
            Lane::A => Some(Lane::B),
            Lane::B => Some(Lane::A),
            Lane::Sound => None,
        }
    }

    pub fn is_main(self) -> bool {
        self != Lane::Sound
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::A => write!(f, "lane A"),
            Lane::B => write!(f, "lane B"),
            Lane::Sound => write!(f, "sound lane"),
        }
    }
}

/// A small set of lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneSet(u8);

impl LaneSet {
    pub const MAIN: LaneSet = LaneSet(0b011);
    pub const ALL: LaneSet = LaneSet(0b111);

    pub fn only(lane: Lane) -> Self {
        LaneSet(1 << lane.index())
    }

    pub fn contains(self, lane: Lane) -> bool {
        self.0 & (1 << lane.index()) != 0
    }

    pub fn with(self, lane: Lane) -> Self {
        LaneSet(self.0 | (1 << lane.index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peers() {
        assert_eq!(Lane::A.peer(), Some(Lane::B));
        assert_eq!(Lane::B.peer(), Some(Lane::A));
        assert_eq!(Lane::Sound.peer(), None);
    }

    #[test]
    fn test_lane_set() {
        assert!(LaneSet::MAIN.contains(Lane::A));
        assert!(LaneSet::MAIN.contains(Lane::B));
        assert!(!LaneSet::MAIN.contains(Lane::Sound));
        assert!(LaneSet::only(Lane::Sound).with(Lane::A).contains(Lane::A));
        assert_eq!(LaneSet::MAIN.with(Lane::Sound), LaneSet::ALL);
    }
}
