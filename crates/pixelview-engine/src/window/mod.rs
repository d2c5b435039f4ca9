//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single viewer window, and wires host
//! events (resize, scroll, redraw) into the viewer and the data producer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
