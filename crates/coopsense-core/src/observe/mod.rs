//! # Observability
//!
//! Library code reports through `tracing` events only:
//!
//! - `debug!` for history flushes, mode changes and switch decisions
//! - `trace!` for per-channel vacancy estimates
//!
//! Binaries install a subscriber once with [`init_logging`].
//!
//! ```rust,ignore
//! use coopsense_core::observe::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development());
//! tracing::info!(steps = 10_000, "simulation started");
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
