//! Pixelview engine crate.
//!
//! Displays an externally produced RGBA pixel buffer in a window, with
//! cursor-anchored zoom. The `viewer` module is the core; the rest is the
//! platform plumbing (GPU device, window runtime, input) that feeds it.

pub mod device;
pub mod window;
pub mod input;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod viewer;
