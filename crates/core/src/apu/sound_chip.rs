//! Pluggable sound chip interface.

/// The part of an audio chip a CPU bus can see.
///
/// Implementations wrap a real synthesizer (FM, PSG, ...). `advance` is
/// called after every sound-lane slice with the cycles that elapsed; it
/// returns `true` once for each completed event, which the board turns into
/// a status-register bit.
pub trait SoundChip {
    /// Write to a chip port (`0` = address latch, `1` = data on two-port chips).
    fn write(&mut self, port: u8, val: u8);

    /// Read a chip port (status on most chips).
    fn read(&mut self, port: u8) -> u8 {
        let _ = port;
        0
    }

    /// Advance the chip clock; `true` when an event completed.
    fn advance(&mut self, cycles: u32) -> bool;

    /// Reset the chip to power-on state
    fn reset(&mut self);

    /// Chip name for diagnostics
    fn name(&self) -> &str;
}

/// A chip that accepts writes and never completes anything.
#[derive(Debug, Default, Clone)]
pub struct SilentChip {
    last_write: Option<(u8, u8)>,
}

impl SilentChip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last (port, value) pair written, for diagnostics.
    pub fn last_write(&self) -> Option<(u8, u8)> {
        self.last_write
    }
}

impl SoundChip for SilentChip {
    fn write(&mut self, port: u8, val: u8) {
        self.last_write = Some((port, val));
    }

    fn advance(&mut self, _cycles: u32) -> bool {
        false
    }

    fn reset(&mut self) {
        self.last_write = None;
    }

    fn name(&self) -> &str {
        "silent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_chip_records_writes() {
        let mut chip = SilentChip::new();
        chip.write(0, 0x28);
        chip.write(1, 0xF0);
        assert_eq!(chip.last_write(), Some((1, 0xF0)));
        assert_eq!(chip.read(0), 0);
        assert!(!chip.advance(1000));

        chip.reset();
        assert_eq!(chip.last_write(), None);
    }
}
