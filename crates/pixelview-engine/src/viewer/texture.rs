use crate::render::RenderCtx;

/// Declared dimensions of the source pixel buffer.
///
/// Declared independently of the window client size; the producer re-declares
/// whenever its logical image changes size.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SourceSize {
    pub width: u32,
    pub height: u32,
}

impl SourceSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Minimum byte length a buffer of this size must have (RGBA8).
    #[inline]
    pub fn byte_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Texture synchronizer: owns the GPU texture mirroring the producer's
/// buffer.
///
/// The producer's bytes are borrowed for the duration of one [`sync`] call
/// and released when the upload returns; no reference is retained between
/// calls. Every sync re-uploads the full buffer — no dirty rectangles.
///
/// [`sync`]: PixelTexture::sync
#[derive(Default)]
pub(crate) struct PixelTexture {
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,

    /// Declared source size.
    size: SourceSize,
    /// Extent of the live texture allocation.
    allocated: SourceSize,

    /// Content or size changed since the last upload.
    dirty: bool,

    /// Bumped on every re-specification; bind groups track it to know when
    /// their texture view went stale.
    generation: u64,
}

impl PixelTexture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Declares the source dimensions and schedules a synchronization.
    ///
    /// Re-declaring the same size still marks the content dirty (the producer
    /// typically refreshed the bytes too), but only a size change causes the
    /// texture storage to be re-specified.
    pub(crate) fn set_size(&mut self, size: SourceSize) {
        self.size = size;
        self.dirty = true;
    }

    pub(crate) fn size(&self) -> SourceSize {
        self.size
    }

    /// Marks the current contents stale so the next sync re-uploads.
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn needs_sync(&self) -> bool {
        self.dirty || self.texture.is_none() || self.allocated != self.size
    }

    pub(crate) fn view(&self) -> Option<&wgpu::TextureView> {
        self.view.as_ref()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Uploads `pixels` into the GPU texture if a sync is pending.
    ///
    /// Re-specifies the texture storage when the declared size differs from
    /// the allocated extent. A buffer shorter than `size.byte_len()` is a
    /// caller contract violation: it is logged and the upload skipped, never
    /// read out of bounds.
    pub(crate) fn sync(&mut self, ctx: &RenderCtx<'_>, pixels: &[u8]) {
        if !self.needs_sync() {
            return;
        }

        if self.size.is_empty() {
            log::debug!("pixel source is 0-sized; nothing to upload");
            self.dirty = false;
            return;
        }

        let required = self.size.byte_len();
        if pixels.len() < required {
            log::error!(
                "pixel buffer too short for declared {}x{} source: {} < {} bytes; upload skipped",
                self.size.width,
                self.size.height,
                pixels.len(),
                required
            );
            return;
        }

        if self.texture.is_none() || self.allocated != self.size {
            self.respecify(ctx);
        }

        let Some(texture) = self.texture.as_ref() else {
            return;
        };

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels[..required],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.size.width),
                rows_per_image: Some(self.size.height),
            },
            wgpu::Extent3d {
                width: self.size.width,
                height: self.size.height,
                depth_or_array_layers: 1,
            },
        );

        self.dirty = false;
    }

    /// Replaces the texture allocation at the declared size.
    ///
    /// The previous texture (if any) is dropped here, exactly once; the new
    /// generation tells dependent bind groups to rebuild, which re-attaches
    /// the sampler state to the fresh allocation.
    fn respecify(&mut self, ctx: &RenderCtx<'_>) {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("pixelview source texture"),
            size: wgpu::Extent3d {
                width: self.size.width,
                height: self.size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.texture = Some(texture);
        self.allocated = self.size;
        self.generation += 1;

        log::debug!(
            "source texture re-specified at {}x{}",
            self.size.width,
            self.size.height
        );
    }

    /// Drops the texture objects. Safe to call more than once.
    pub(crate) fn release(&mut self) {
        self.view = None;
        self.texture = None;
        self.allocated = SourceSize::default();
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── SourceSize ────────────────────────────────────────────────────────

    #[test]
    fn byte_len_is_rgba8() {
        assert_eq!(SourceSize::new(800, 600).byte_len(), 800 * 600 * 4);
        assert_eq!(SourceSize::new(0, 600).byte_len(), 0);
    }

    #[test]
    fn byte_len_does_not_overflow_u32_math() {
        // 16k × 16k × 4 exceeds u32::MAX; the arithmetic is usize throughout.
        let s = SourceSize::new(16_384, 16_384);
        assert_eq!(s.byte_len(), 1_073_741_824);
    }

    #[test]
    fn emptiness() {
        assert!(SourceSize::new(0, 10).is_empty());
        assert!(SourceSize::new(10, 0).is_empty());
        assert!(!SourceSize::new(1, 1).is_empty());
    }

    // ── sync bookkeeping ──────────────────────────────────────────────────

    #[test]
    fn fresh_texture_needs_initial_sync() {
        let mut t = PixelTexture::new();
        t.set_size(SourceSize::new(8, 8));
        assert!(t.needs_sync());
    }

    #[test]
    fn set_size_marks_one_pending_sync() {
        let mut t = PixelTexture::new();
        t.set_size(SourceSize::new(8, 8));
        // Re-declaring is idempotent at the bookkeeping level: there is a
        // single pending sync, not a queue of them.
        t.set_size(SourceSize::new(8, 8));
        assert!(t.needs_sync());
        assert_eq!(t.size(), SourceSize::new(8, 8));
    }

    #[test]
    fn mark_dirty_schedules_resync() {
        let mut t = PixelTexture::new();
        t.set_size(SourceSize::new(4, 4));
        t.dirty = false;
        t.allocated = t.size;
        assert!(t.needs_sync()); // no texture object yet

        t.mark_dirty();
        assert!(t.dirty);
    }

    #[test]
    fn release_is_idempotent() {
        let mut t = PixelTexture::new();
        t.set_size(SourceSize::new(4, 4));
        t.release();
        t.release();
        assert!(t.view().is_none());
        assert_eq!(t.generation(), 0);
    }
}
