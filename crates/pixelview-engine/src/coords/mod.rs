//! Coordinate types shared by the viewer and the window runtime.
//!
//! Conventions:
//! - Window/cursor space: logical pixels, origin top-left, +X right, +Y down.
//! - NDC: [-1,1]×[-1,1], origin at the viewport center, +Y up.
//! - Texture space: [0,1]×[0,1], row 0 at the top screen edge of the quad.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
