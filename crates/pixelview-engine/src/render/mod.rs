//! Renderer-facing GPU context types.
//!
//! The viewer receives these per call; it never stores device references.

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};
