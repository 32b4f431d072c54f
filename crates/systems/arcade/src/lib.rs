//! Twin-lane arcade board emulation
//!
//! This crate emulates the glue logic of arcade boards built around two main
//! 8-bit CPUs sharing memory plus an audio CPU driving two sound chips.
//!
//! # Architecture
//!
//! - **Lanes**: main lanes A and B, and the sound lane; instruction execution
//!   is supplied from outside through [`LaneExecutor`]
//! - **Doorbell latch**: NMI handshake between lanes A and B ([`latch`])
//! - **Sound register**: command mailbox + 4-bit status ([`sound`])
//! - **Address routing**: one declarative table per lane ([`router`])
//! - **Video**: cached background, two sprite layers, side status panel ([`video`])
//! - **Profiles**: per-title configuration ([`profile`])

pub mod bus;
pub mod input;
pub mod lane;
pub mod latch;
pub mod memory;
pub mod profile;
pub mod router;
pub mod sound;
mod system;
pub mod video;

pub use bus::{Board, LaneBus, LaneMemory};
pub use lane::Lane;
pub use profile::GameProfile;
pub use system::{ArcadeError, ArcadeSystem, IdleExecutor, LaneExecutor};
pub use video::{FrameRenderer, FrameStats, GraphicsSet};
