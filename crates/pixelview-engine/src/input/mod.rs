//! Host input plumbing for the viewer.
//!
//! Deliberately narrow: the zoom controller only consumes a cursor position
//! and a vertical wheel delta, so that is all this module models.

mod state;
mod types;

pub use state::PointerState;
pub use types::WheelDelta;
