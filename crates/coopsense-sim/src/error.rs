//! Simulation error types

use coopsense_core::CoopError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;

/// Errors that can occur while loading traffic or running a simulation
#[derive(Error, Debug)]
pub enum SimError {
    /// Decision engine rejected a parameter or input
    #[error("engine error: {0}")]
    Core(#[from] CoopError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failed to read a trace file
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed line in a trace file
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Traffic data unusable as a trace
    #[error("invalid traffic: {0}")]
    InvalidTraffic(String),

    /// Traffic width does not match the engine's channel count
    #[error("traffic has {traffic} channels but the engine observes {engine}")]
    ChannelMismatch { engine: usize, traffic: usize },
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file or profile not found
    #[error("config not found: {0}")]
    NotFound(String),

    /// Failed to read or write configuration file
    #[error("failed to read config: {0}")]
    Read(String),

    /// Failed to parse configuration
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Invalid engine parameters
    #[error("invalid config: {0}")]
    Validation(#[from] CoopError),

    /// Invalid simulation parameters
    #[error("invalid config: {0}")]
    Invalid(String),
}
