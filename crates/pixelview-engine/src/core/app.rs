use crate::coords::Viewport;
use crate::viewer::PixelViewer;

/// Data-producer contract implemented by the host application.
///
/// The runtime owns event delivery and frame pacing; implementors own the
/// pixel memory. `pixels()` is borrowed once per texture synchronization and
/// released as soon as the upload returns — the viewer keeps no reference
/// between calls, so the producer is free to mutate or reallocate its buffer
/// between frames.
pub trait PixelApp {
    /// Called once, after the window and GPU context exist.
    ///
    /// Declare the initial source size on `viewer` and fill the buffer here.
    fn on_load(&mut self, viewer: &mut PixelViewer, client: Viewport);

    /// Called when the window client size changes (logical pixels).
    ///
    /// Re-declare the source size here if the image should track the window.
    fn on_resize(&mut self, viewer: &mut PixelViewer, width: u32, height: u32) {
        let _ = (viewer, width, height);
    }

    /// Current pixel buffer: RGBA8, row-major, rows top-to-bottom, at least
    /// `width * height * 4` bytes for the declared source size.
    fn pixels(&self) -> &[u8];
}
