//! Sound command register.
//!
//! A one-byte mailbox from lane A to the sound lane, plus a 4-bit status
//! register:
//!
//! | bit | meaning                  |
//! |-----|--------------------------|
//! | 0   | chip 0 finished an event |
//! | 1   | chip 1 finished an event |
//! | 2   | sound CPU busy           |
//! | 3   | command pending          |

use emu_core::logging::{log, LogCategory, LogLevel};

pub const CHIP0_DONE: u8 = 0x01;
pub const CHIP1_DONE: u8 = 0x02;
pub const BUSY: u8 = 0x04;
pub const COMMAND_PENDING: u8 = 0x08;

/// Bits that hold the sound lane's IRQ line asserted.
const IRQ_SOURCES: u8 = CHIP0_DONE | CHIP1_DONE | COMMAND_PENDING;

#[derive(Debug, Clone, Default)]
pub struct SoundCommandRouter {
    mailbox: u8,
    register: u8,
}

impl SoundCommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a command from a main lane.
    pub fn write_command(&mut self, data: u8) {
        self.mailbox = data;
        self.register |= BUSY | COMMAND_PENDING;
        log(LogCategory::Sound, LogLevel::Debug, || {
            format!("command {:02X} posted", data)
        });
    }

    /// Sound lane read of the mailbox: returns the command and fully
    /// acknowledges it.
    pub fn clear_on_read(&mut self) -> u8 {
        let data = self.mailbox;
        self.mailbox = 0;
        self.register = 0;
        data
    }

    /// Sound lane write to the status port: the upper nibble is an AND mask.
    pub fn write_register_mask(&mut self, data: u8) {
        self.register &= data >> 4;
    }

    pub fn read_register(&self) -> u8 {
        self.register
    }

    /// Called when audio chip `chip` (0 or 1) completes an event.
    pub fn on_chip_completion(&mut self, chip: u8) {
        match chip {
            0 => self.register |= CHIP0_DONE,
            1 => self.register |= CHIP1_DONE,
            _ => {
                log(LogCategory::Sound, LogLevel::Warn, || {
                    format!("completion from unknown chip {}", chip)
                });
            }
        }
    }

    pub fn irq_asserted(&self) -> bool {
        self.register & IRQ_SOURCES != 0
    }

    pub fn is_busy(&self) -> bool {
        self.register & BUSY != 0
    }

    /// Current mailbox contents without acknowledging.
    pub fn mailbox(&self) -> u8 {
        self.mailbox
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
