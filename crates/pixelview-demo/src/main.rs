use anyhow::Result;
use winit::dpi::LogicalSize;

use pixelview_engine::coords::Viewport;
use pixelview_engine::core::PixelApp;
use pixelview_engine::device::GpuInit;
use pixelview_engine::logging::{init_logging, LoggingConfig};
use pixelview_engine::viewer::{PixelViewer, SourceSize};
use pixelview_engine::window::{Runtime, RuntimeConfig};

/// Fills the window with RGBA noise, regenerated to match every resize.
/// Scroll to zoom toward the cursor.
struct NoiseApp {
    pixels: Vec<u8>,
    rng: u64,
}

impl NoiseApp {
    fn new() -> Self {
        Self {
            pixels: Vec::new(),
            rng: 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Reallocates the buffer at `width`×`height` and refills it with noise.
    fn refill(&mut self, width: u32, height: u32) {
        let len = width as usize * height as usize * 4;
        self.pixels.clear();
        self.pixels.reserve(len);

        // xorshift64 keeps the demo free of an rng dependency.
        let mut s = self.rng;
        while self.pixels.len() < len {
            s ^= s << 13;
            s ^= s >> 7;
            s ^= s << 17;
            self.pixels.extend_from_slice(&s.to_le_bytes());
        }
        self.pixels.truncate(len);
        self.rng = s;

        log::debug!("noise buffer refilled at {width}x{height}");
    }
}

impl PixelApp for NoiseApp {
    fn on_load(&mut self, viewer: &mut PixelViewer, client: Viewport) {
        let (w, h) = (client.width as u32, client.height as u32);
        self.refill(w, h);
        viewer.set_source_size(SourceSize::new(w, h));
    }

    fn on_resize(&mut self, viewer: &mut PixelViewer, width: u32, height: u32) {
        self.refill(width, height);
        viewer.set_source_size(SourceSize::new(width, height));
    }

    fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(
        RuntimeConfig {
            title: "pixelview demo".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        },
        GpuInit::default(),
        NoiseApp::new(),
    )
}
