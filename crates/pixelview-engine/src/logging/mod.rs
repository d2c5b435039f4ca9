//! Logging utilities.
//!
//! All diagnostics in this crate go through the `log` facade; this module
//! owns the one-time `env_logger` backend setup.

mod init;

pub use init::{init_logging, LoggingConfig};
