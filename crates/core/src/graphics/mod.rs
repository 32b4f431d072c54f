//! Reusable graphics operations for tile/sprite compositors.
//!
//! Compositing happens on pen indices, not colors: layers are blitted into an
//! [`IndexedSurface`] and the finished surface is resolved through a palette
//! into a `Frame` once per video frame.

pub mod surface;

pub use surface::{blit, scrolled_blit, IndexedSurface, Transparency};
