use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::{Vec2, Viewport};
use crate::core::PixelApp;
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::input::{PointerState, WheelDelta};
use crate::render::{RenderCtx, RenderTarget};
use crate::viewer::PixelViewer;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "pixelview".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Entry point for the runtime.
///
/// Opens the viewer window, runs the event loop to completion, and drives
/// exactly one [`PixelViewer`] — one viewer per GPU context.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + PixelApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = ViewerState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    pointer: PointerState,
    viewer: PixelViewer,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct ViewerState<A>
where
    A: PixelApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
}

impl<A> ViewerState<A>
where
    A: PixelApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
        }
    }
}

impl<A> ApplicationHandler for ViewerState<A>
where
    A: PixelApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = match event_loop.create_window(attrs) {
            Ok(w) => w,
            Err(e) => {
                log::error!("failed to create viewer window: {e}");
                event_loop.exit();
                return;
            }
        };

        let gpu_init = self.gpu_init.clone();
        let mut entry = WindowEntryBuilder {
            pointer: PointerState::default(),
            viewer: PixelViewer::new(),
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init))
                    .expect("GPU initialization failed for viewer window")
            },
        }
        .build();

        // Load event: resources first, then the producer declares its source.
        let app = &mut self.app;
        entry.with_mut(|fields| {
            let client = logical_viewport(fields.window);
            let ctx = render_ctx(fields.gpu);
            fields.viewer.initialize(&ctx);
            app.on_load(fields.viewer, client);
        });
        entry.with_window(|w| w.request_redraw());

        self.entry = Some(entry);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Event-driven: redraws are requested by the handlers that cause
        // damage (resize, scroll, content refresh), never from a busy loop.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        // Split borrows so closures never capture `self`.
        let (app, entry) = (&mut self.app, &mut self.entry);

        let Some(entry_ref) = entry.as_mut() else {
            return;
        };
        if entry_ref.with_window(|w| w.id()) != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                // Shutdown is the last GPU operation; surface and window are
                // dropped with the entry right after.
                entry_ref.with_viewer_mut(|v| v.shutdown());
                *entry = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                entry_ref.with_mut(|fields| {
                    fields.gpu.resize(new_size);

                    let client = logical_viewport(fields.window);
                    let ctx = render_ctx(fields.gpu);
                    fields.viewer.on_resize(&ctx);
                    app.on_resize(fields.viewer, client.width as u32, client.height as u32);

                    fields.window.request_redraw();
                });
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                entry_ref.with_mut(|fields| {
                    let new_size = fields.window.inner_size();
                    fields.gpu.resize(new_size);
                    fields.window.request_redraw();
                });
            }

            WindowEvent::CursorMoved { position, .. } => {
                entry_ref.with_mut(|fields| {
                    let (x, y) = to_logical_f32(fields.window, position);
                    fields.pointer.moved(Vec2::new(x, y));
                });
            }

            WindowEvent::CursorLeft { .. } => {
                entry_ref.with_pointer_mut(|p| p.left());
            }

            WindowEvent::MouseWheel { delta, .. } => {
                entry_ref.with_mut(|fields| {
                    let delta = match delta {
                        MouseScrollDelta::LineDelta(x, y) => WheelDelta::Line { x, y },
                        MouseScrollDelta::PixelDelta(p) => {
                            let (x, y) = to_logical_f32(fields.window, p);
                            WheelDelta::Pixel { x, y }
                        }
                    };

                    // Wheel events arrive without a cursor position; zoom is
                    // only meaningful while the pointer is inside the window.
                    let Some(cursor) = fields.pointer.pos() else {
                        return;
                    };

                    let client = logical_viewport(fields.window);
                    let ctx = render_ctx(fields.gpu);
                    fields
                        .viewer
                        .on_scroll(&ctx, cursor, delta.scroll_y(), client);
                    fields.window.request_redraw();
                });
            }

            WindowEvent::RedrawRequested => {
                let mut fatal = false;

                entry_ref.with_mut(|fields| {
                    // Texture sync always precedes the draw recorded below,
                    // within this same handler invocation.
                    {
                        let ctx = render_ctx(fields.gpu);
                        fields.viewer.sync(&ctx, app.pixels());
                    }

                    let mut frame = match fields.gpu.begin_frame() {
                        Ok(frame) => frame,
                        Err(err) => {
                            match fields.gpu.handle_surface_error(err) {
                                SurfaceErrorAction::Reconfigured => {
                                    fields.window.request_redraw();
                                }
                                SurfaceErrorAction::SkipFrame => {}
                                SurfaceErrorAction::Fatal => {
                                    log::error!("surface is out of memory; exiting");
                                    fatal = true;
                                }
                            }
                            return;
                        }
                    };

                    // Runtime graphics errors are queried after the draw is
                    // submitted; they are logged and the loop continues.
                    let error_scope = fields.gpu.device().push_error_scope(wgpu::ErrorFilter::Validation);

                    let ctx = render_ctx(fields.gpu);
                    {
                        let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
                        fields.viewer.render(&ctx, &mut target);
                    }

                    fields.window.pre_present_notify();
                    fields.gpu.submit(frame);

                    if let Some(err) = pollster::block_on(error_scope.pop()) {
                        log::error!("graphics error after draw: {err}");
                    }
                });

                if fatal {
                    self.exit_requested = true;
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

fn render_ctx<'a>(gpu: &'a Gpu<'_>) -> RenderCtx<'a> {
    RenderCtx::new(gpu.device(), gpu.queue(), gpu.surface_format())
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let scale = window.scale_factor();
    let logical = pos.to_logical::<f64>(scale);
    (logical.x as f32, logical.y as f32)
}

fn logical_viewport(window: &Window) -> Viewport {
    let phys = window.inner_size();
    let logical: LogicalSize<f64> = phys.to_logical(window.scale_factor());
    Viewport::new(logical.width as f32, logical.height as f32)
}
