//! Common renderer trait for video pipelines.
//!
//! A board's video hardware keeps its own state (RAM, registers, caches) and
//! composes into a [`Frame`]. The trait is what the system loop and frontends
//! talk to:
//!
//! ```text
//! System (state) -> Renderer -> Frame (ARGB8888)
//! ```

use crate::types::Frame;

/// Common renderer trait for emulated graphics hardware
pub trait Renderer: Send {
    /// Get the current framebuffer (read-only)
    fn get_frame(&self) -> &Frame;

    /// Take the current frame, leaving an empty one of the same size.
    fn take_frame(&mut self) -> Frame {
        let frame = self.get_frame();
        let replacement = Frame::new(frame.width, frame.height);
        let taken = frame.clone();
        self.replace_frame(replacement);
        taken
    }

    /// Swap in a new framebuffer.
    fn replace_frame(&mut self, frame: Frame);

    /// Clear the framebuffer with a solid ARGB8888 color
    fn clear(&mut self, color: u32);

    /// Reset the renderer to its initial state, including any caches.
    fn reset(&mut self);

    /// Renderer name for diagnostics
    fn name(&self) -> &str;
}
