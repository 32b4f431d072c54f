//! Doorbell handshake between the two main lanes.
//!
//! Each lane owns two independent bits:
//!
//! - `ENABLE`: the peer may interrupt me
//! - `PENDING`: the peer tried to interrupt me while I was not armed
//!
//! A read of the doorbell offset rings the peer, a write arms the caller.
//! Requests coalesce: however many rings arrive before the lane arms, it is
//! interrupted exactly once.

use crate::lane::Lane;
use emu_core::logging::{log, LogCategory, LogLevel};

/// Value returned by the doorbell offset on every read.
pub const DOORBELL_SENTINEL: u8 = 0xFF;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoorbellState(u8);

impl DoorbellState {
    pub const IDLE: DoorbellState = DoorbellState(0);
    pub const ENABLE: u8 = 0x01;
    pub const PENDING: u8 = 0x02;

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn enabled(self) -> bool {
        self.0 & Self::ENABLE != 0
    }

    pub fn pending(self) -> bool {
        self.0 & Self::PENDING != 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterCpuLatchController {
    state: [DoorbellState; 2],
    delivered: [u32; 2],
}

impl InterCpuLatchController {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(lane: Lane) -> Option<usize> {
        match lane {
            Lane::A => Some(0),
            Lane::B => Some(1),
            Lane::Sound => None,
        }
    }

    fn deliver(&mut self, lane: Lane) {
        if let Some(i) = Self::slot(lane) {
            self.delivered[i] += 1;
            log(LogCategory::Latch, LogLevel::Debug, || {
                format!("interrupt delivered to {}", lane)
            });
        }
    }

    /// `lane` wrote its own doorbell offset.
    pub fn doorbell_write(&mut self, lane: Lane) {
        let Some(i) = Self::slot(lane) else {
            return;
        };
        if self.state[i].pending() {
            self.state[i] = DoorbellState::IDLE;
            self.deliver(lane);
        } else {
            self.state[i].0 |= DoorbellState::ENABLE;
            log(LogCategory::Latch, LogLevel::Trace, || format!("{} armed", lane));
        }
    }

    /// `from` read the doorbell offset, ringing its peer. Always returns the
    /// sentinel byte.
    pub fn notify_peer(&mut self, from: Lane) -> u8 {
        let Some(peer) = from.peer() else {
            return DOORBELL_SENTINEL;
        };
        let Some(i) = Self::slot(peer) else {
            return DOORBELL_SENTINEL;
        };
        if self.state[i].enabled() {
            self.state[i].0 &= !DoorbellState::ENABLE;
            self.deliver(peer);
        } else {
            if self.state[i].pending() {
                log(LogCategory::Latch, LogLevel::Trace, || {
                    format!("{} ring coalesced into pending request", peer)
                });
            }
            self.state[i].0 |= DoorbellState::PENDING;
        }
        DOORBELL_SENTINEL
    }

    /// Drain the interrupts delivered to `lane` since the last call.
    pub fn take_interrupts(&mut self, lane: Lane) -> u32 {
        Self::slot(lane)
            .map(|i| std::mem::take(&mut self.delivered[i]))
            .unwrap_or(0)
    }

    pub fn pending_interrupts(&self, lane: Lane) -> u32 {
        Self::slot(lane).map(|i| self.delivered[i]).unwrap_or(0)
    }

    pub fn state(&self, lane: Lane) -> DoorbellState {
        Self::slot(lane)
            .map(|i| self.state[i])
            .unwrap_or(DoorbellState::IDLE)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
