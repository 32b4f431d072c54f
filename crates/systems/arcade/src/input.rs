//! Input port mapping and rotary joystick decoding.
//!
//! The frontend sets raw port bytes (active low, idle = `0xFF`); the game
//! reads logical slots whose meaning comes from the title's input map. Two
//! slot kinds decode a rotary dial in the upper nibble of the raw byte.

use crate::profile::{InputSlot, INPUT_SLOTS};
use emu_core::logging::{log, LogCategory, LogLevel};

pub const RAW_PORTS: usize = 8;

const DIAL8: [u8; 8] = [0xF0, 0x30, 0x10, 0x50, 0x40, 0xC0, 0x80, 0xA0];

const DIAL12: [u8; 12] = [
    0xB0, 0xA0, 0x90, 0x80, 0x70, 0x60, 0x50, 0x40, 0x30, 0x20, 0x10, 0x00,
];

/// 8-position dial: stateless table lookup, button bits passed through.
pub fn decode_rot8(raw: u8) -> u8 {
    (raw & 0x0F) | DIAL8[((raw >> 4) >> 1) as usize]
}

/// 12-position dial accumulator for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotaryDial12 {
    previous: u8,
    position: u8,
}

impl RotaryDial12 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u8 {
        self.position
    }

    /// Feed one poll of the raw byte and return the decoded byte.
    pub fn poll(&mut self, raw: u8) -> u8 {
        let current = raw >> 4;
        let mut delta = current as i32 - self.previous as i32;
        if delta >= 8 {
            delta -= 16;
        } else if delta < -8 {
            delta += 16;
        }
        self.previous = current;
        self.position = (self.position as i32 + delta).rem_euclid(12) as u8;
        (raw & 0x0F) | DIAL12[self.position as usize]
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct InputPortMapper {
    ports: [u8; RAW_PORTS],
    dials: [RotaryDial12; 2],
    map: [InputSlot; INPUT_SLOTS],
    busy_bit: u8,
}

impl InputPortMapper {
    pub fn new(map: [InputSlot; INPUT_SLOTS], busy_bit: u8) -> Self {
        Self {
            ports: [0xFF; RAW_PORTS],
            dials: [RotaryDial12::new(); 2],
            map,
            busy_bit,
        }
    }

    /// Set a raw port as polled from the host.
    pub fn set_port(&mut self, port: usize, value: u8) {
        match self.ports.get_mut(port) {
            Some(slot) => *slot = value,
            None => log(LogCategory::Input, LogLevel::Warn, || {
                format!("raw port {} out of range", port)
            }),
        }
    }

    pub fn port(&self, port: usize) -> u8 {
        self.ports.get(port).copied().unwrap_or(0xFF)
    }

    pub fn slot_kind(&self, slot: u8) -> InputSlot {
        self.map
            .get(slot as usize)
            .copied()
            .unwrap_or(InputSlot::Unused)
    }

    /// Game read of logical slot `slot`.
    ///
    /// The status slot has the title's busy bit cleared while the sound CPU
    /// is idle.
    pub fn read_slot(&mut self, slot: u8, sound_busy: bool) -> u8 {
        match self.slot_kind(slot) {
            InputSlot::Unused => 0xFF,
            InputSlot::Status => {
                let raw = self.port(0);
                if sound_busy {
                    raw
                } else {
                    raw & !self.busy_bit
                }
            }
            InputSlot::Port(n) => self.port(n as usize),
            InputSlot::Rotary8(player) => decode_rot8(self.port(1 + player.index())),
            InputSlot::Rotary12(player) => {
                let raw = self.port(1 + player.index());
                self.dials[player.index()].poll(raw)
            }
        }
    }

    pub fn dial(&self, player: usize) -> Option<&RotaryDial12> {
        self.dials.get(player)
    }

    /// Idle ports, centred dials.
    pub fn reset(&mut self) {
        self.ports = [0xFF; RAW_PORTS];
        for dial in &mut self.dials {
            dial.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Player, ROTARY12_INPUTS, ROTARY8_INPUTS};

    #[test]
    fn test_rot8_table() {
        assert_eq!(decode_rot8(0x00), 0xF0);
        assert_eq!(decode_rot8(0x1F), 0xFF);
        assert_eq!(decode_rot8(0x25), 0x35);
        assert_eq!(decode_rot8(0xF3), 0xA3);
        for raw in 0..=255u8 {
            assert_eq!(decode_rot8(raw) & 0x0F, raw & 0x0F);
        }
    }

    #[test]
    fn test_rot12_smooth_rotation() {
        let mut dial = RotaryDial12::new();
        let mut last = dial.position();
        let sequence: Vec<u8> = (0..16).chain([0, 1]).collect();
        for raw16 in sequence {
            dial.poll(raw16 << 4);
            let pos = dial.position();
            assert!(pos < 12);
            let step = (pos as i32 - last as i32).rem_euclid(12);
            assert!(step <= 1, "moved {} -> {}", last, pos);
            last = pos;
        }
        // 0 then 15 steps forward then 2 more: 17 steps total.
        assert_eq!(dial.position(), 17 % 12);
    }

    #[test]
    fn test_rot12_wraps_at_twelve() {
        let mut dial = RotaryDial12::new();
        for raw16 in 1..=11u8 {
            dial.poll(raw16 << 4);
        }
        assert_eq!(dial.position(), 11);
        assert_eq!(dial.poll(12 << 4) & 0xF0, DIAL12[0]);
        assert_eq!(dial.position(), 0);
    }

    #[test]
    fn test_rot12_backwards_takes_short_path() {
        let mut dial = RotaryDial12::new();
        dial.poll(0xF0);
        assert_eq!(dial.position(), 11);
        dial.poll(0xE0);
        assert_eq!(dial.position(), 10);
    }

    #[test]
    fn test_status_slot_busy_bit() {
        let mut inputs = InputPortMapper::new(ROTARY12_INPUTS, 0x20);
        inputs.set_port(0, 0xFF);
        assert_eq!(inputs.read_slot(0, true), 0xFF);
        assert_eq!(inputs.read_slot(0, false), 0xDF);
    }

    #[test]
    fn test_players_have_independent_dials() {
        let mut inputs = InputPortMapper::new(ROTARY12_INPUTS, 0x20);
        inputs.set_port(1, 0x1F);
        inputs.read_slot(1, false);
        assert_eq!(inputs.dial(0).unwrap().position(), 1);
        assert_eq!(inputs.dial(1).unwrap().position(), 0);
        assert_eq!(inputs.slot_kind(2), InputSlot::Rotary12(Player::Two));
    }

    #[test]
    fn test_rot8_slot_and_unused() {
        let mut inputs = InputPortMapper::new(ROTARY8_INPUTS, 0x01);
        inputs.set_port(2, 0x07);
        assert_eq!(inputs.read_slot(2, false), 0xF7);
        assert_eq!(inputs.read_slot(11, false), 0xFF);
        assert_eq!(inputs.read_slot(40, false), 0xFF);
        assert_eq!(inputs.read_slot(5, false), 0xFF);
    }
}
