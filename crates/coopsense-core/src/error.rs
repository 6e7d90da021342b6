//! Decision engine error types

use thiserror::Error;

/// Result type for decision engine operations
pub type CoopResult<T> = Result<T, CoopError>;

/// Errors raised by the decision engine.
///
/// The configuration variants are fatal and surface once, at construction.
/// The bounds variants guard the per-step entry points against callers that
/// hand in channel indices or snapshot widths the engine was not built for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoopError {
    /// More radio units than channels to place them on
    #[error("{units} radio units cannot share {channels} channels")]
    TooManyRadioUnits { units: usize, channels: usize },

    /// Maximum cache size is not a multiple of the channel count
    #[error("max channel cache size {max_cache} is not a multiple of {channels} channels")]
    CacheSizeNotMultipleOfChannels { max_cache: usize, channels: usize },

    /// Minimum cache size does not divide the maximum cache size
    #[error("max channel cache size {max_cache} is not a multiple of min channel cache size {min_cache}")]
    CacheSizeNotMultipleOfMinimum { max_cache: usize, min_cache: usize },

    /// A parameter that must be non-zero (or otherwise bounded) is not
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Channel index outside `[0, channels)`
    #[error("channel {channel} out of range for {channels} channels")]
    ChannelOutOfRange { channel: usize, channels: usize },

    /// Snapshot or channel map width does not match the engine
    #[error("width mismatch: expected {expected} channels, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    /// Radio unit index outside the pool
    #[error("radio unit {index} out of range for {units} units")]
    UnitOutOfRange { index: usize, units: usize },

    /// Integer code that is not a channel state
    #[error("invalid channel state code {0} (expected 0, 1 or 2)")]
    InvalidStateCode(u8),
}

impl CoopError {
    /// Check if this error was raised while validating configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CoopError::TooManyRadioUnits { .. }
                | CoopError::CacheSizeNotMultipleOfChannels { .. }
                | CoopError::CacheSizeNotMultipleOfMinimum { .. }
                | CoopError::InvalidParameter { .. }
        )
    }
}
