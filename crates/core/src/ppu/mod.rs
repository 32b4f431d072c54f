//! Decoded graphics assets consumed by tile/sprite video hardware.
//!
//! ROM bit-plane decoding happens in the asset loader; what reaches the video
//! pipeline is a [`TileSheet`] of pen indices and an indexed palette.

pub mod palette;
pub mod tile;

pub use palette::{IndexedPalette, RamPalette};
pub use tile::TileSheet;
