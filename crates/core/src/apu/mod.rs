//! Audio chip interface.
//!
//! Waveform synthesis lives outside this workspace; a board only needs the
//! register interface of its sound chips and to hear when a chip finishes an
//! event (a timer or envelope callback raising the chip's IRQ output).

pub mod sound_chip;

pub use sound_chip::{SilentChip, SoundChip};
