//! The pixel viewer core.
//!
//! [`PixelViewer`] displays a caller-supplied RGBA8 buffer as a full-window
//! quad with cursor-anchored zoom. It is composed of the texture synchronizer
//! (`texture`), the zoom transform (`transform`) and the blit renderer
//! (`renderer`); the window runtime wires host events into it.
//!
//! Lifecycle: uninitialized → loaded (`initialize`) → resize/zoom/render
//! self-loops → unloaded (`shutdown`, terminal). Resources are one-shot: a
//! shut-down viewer never re-initializes.

mod renderer;
mod texture;
mod transform;

pub use texture::SourceSize;
pub use transform::{cursor_to_ndc, ZoomState, ZOOM_SENSITIVITY};

use crate::coords::{Vec2, Viewport};
use crate::render::{RenderCtx, RenderTarget};

/// Real-time viewer for an externally produced pixel buffer.
///
/// Single-threaded by construction: every method takes `&mut self` and runs
/// on the thread owning the GPU context. The viewer holds no reference to
/// the pixel memory — bytes are borrowed per [`sync`](Self::sync) call only.
pub struct PixelViewer {
    blit: renderer::BlitRenderer,
    texture: texture::PixelTexture,
    zoom: transform::ZoomState,
    shut_down: bool,
}

impl PixelViewer {
    pub fn new() -> Self {
        Self {
            blit: renderer::BlitRenderer::new(),
            texture: texture::PixelTexture::new(),
            zoom: transform::ZoomState::default(),
            shut_down: false,
        }
    }

    /// Creates the GPU resources: quad mesh, pipeline, sampler, uniform
    /// buffer. Shader validation failures are logged and non-fatal; see
    /// [`renderer`].
    pub fn initialize(&mut self, ctx: &RenderCtx<'_>) {
        if self.shut_down {
            log::warn!("viewer is shut down and cannot be re-initialized");
            return;
        }

        self.blit.initialize(ctx);
        self.blit.write_zoom_uniform(ctx, &self.zoom);
    }

    pub fn is_initialized(&self) -> bool {
        !self.shut_down && self.blit.is_initialized()
    }

    /// Releases every GPU resource. Idempotent, and terminal: call it before
    /// the surface/context goes away, after it the viewer only no-ops.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }

        self.blit.release();
        self.texture.release();
        self.shut_down = true;
        log::debug!("viewer resources released");
    }

    /// Declares the source buffer dimensions and schedules a texture sync.
    pub fn set_source_size(&mut self, size: SourceSize) {
        self.texture.set_size(size);
    }

    pub fn source_size(&self) -> SourceSize {
        self.texture.size()
    }

    /// Marks the source content stale; the next [`sync`](Self::sync)
    /// re-uploads it.
    pub fn mark_pixels_dirty(&mut self) {
        self.texture.mark_dirty();
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    /// Handles a vertical scroll at `cursor` (logical px, top-left origin).
    ///
    /// Updates the zoom state, pushes the uniform immediately (no batching)
    /// and schedules a texture re-sync, mirroring the upload the original
    /// event flow performs on every wheel tick. The caller requests the
    /// redraw.
    pub fn on_scroll(&mut self, ctx: &RenderCtx<'_>, cursor: Vec2, scroll_y: f32, client: Viewport) {
        if self.shut_down {
            return;
        }

        self.zoom.apply_scroll(cursor, scroll_y, client);
        self.blit.write_zoom_uniform(ctx, &self.zoom);
        self.texture.mark_dirty();
    }

    /// Re-pushes per-surface state after a window resize.
    ///
    /// The surface swap does not carry the uniform or texture binding
    /// assumptions across size changes, so both are refreshed before the
    /// next draw.
    pub fn on_resize(&mut self, ctx: &RenderCtx<'_>) {
        if self.shut_down {
            return;
        }

        self.blit.write_zoom_uniform(ctx, &self.zoom);
        self.texture.mark_dirty();
    }

    /// Uploads `pixels` into the GPU texture if a sync is pending.
    ///
    /// `pixels` is only borrowed for the duration of this call. Runs before
    /// the draw call in the same event-handler invocation.
    pub fn sync(&mut self, ctx: &RenderCtx<'_>, pixels: &[u8]) {
        if self.shut_down {
            return;
        }

        self.texture.sync(ctx, pixels);
    }

    /// Records the frame: clear + one indexed quad draw.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        if self.shut_down {
            return;
        }

        self.blit.render(ctx, target, &self.texture);
    }
}

impl Default for PixelViewer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn starts_uninitialized_at_identity_zoom() {
        let v = PixelViewer::new();
        assert!(!v.is_initialized());
        assert_eq!(v.zoom().zoom, 1.0);
        assert_eq!(v.zoom().offset, Vec2::zero());
        assert_eq!(v.source_size(), SourceSize::default());
    }

    #[test]
    fn double_shutdown_is_safe() {
        let mut v = PixelViewer::new();
        v.shutdown();
        v.shutdown();
        assert!(!v.is_initialized());
    }

    #[test]
    fn shutdown_is_terminal() {
        let mut v = PixelViewer::new();
        v.set_source_size(SourceSize::new(8, 8));
        v.shutdown();

        // State mutators become no-ops after shutdown; the source size
        // bookkeeping stays readable but nothing re-acquires GPU resources.
        assert!(!v.is_initialized());
    }

    // ── source bookkeeping ────────────────────────────────────────────────

    #[test]
    fn set_source_size_is_observable() {
        let mut v = PixelViewer::new();
        v.set_source_size(SourceSize::new(800, 600));
        assert_eq!(v.source_size(), SourceSize::new(800, 600));
    }
}
