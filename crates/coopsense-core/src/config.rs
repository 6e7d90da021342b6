//! # Engine Configuration
//!
//! Construction parameters for the decision engine. They are validated once,
//! when a [`CoopController`](crate::coop::CoopController) is built, and are
//! immutable afterwards.
//!
//! ## Example Configuration
//!
//! ```yaml
//! number_of_radio_units: 2
//! number_of_channels: 8
//! max_channel_cache_size: 1024
//! min_channel_cache_size: 32
//! exploration_modulus: 10
//! seed: 7
//! ```

use crate::error::{CoopError, CoopResult};
use crate::switch::DEFAULT_EXPLORATION_MODULUS;
use serde::{Deserialize, Serialize};

/// Decision engine parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cooperating sensing units (at most `number_of_channels`)
    pub number_of_radio_units: usize,
    /// Channels under observation
    pub number_of_channels: usize,
    /// History rows kept before a full flush (multiple of channels and of the minimum)
    pub max_channel_cache_size: usize,
    /// History rows required before smart switching starts
    pub min_channel_cache_size: usize,
    /// Every n-th smart switch is a random exploration
    pub exploration_modulus: u64,
    /// Seed for the exploration RNG (None = OS entropy)
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            number_of_radio_units: 2,
            number_of_channels: 8,
            max_channel_cache_size: 1024,
            min_channel_cache_size: 32,
            exploration_modulus: DEFAULT_EXPLORATION_MODULUS,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn new(
        number_of_radio_units: usize,
        number_of_channels: usize,
        max_channel_cache_size: usize,
        min_channel_cache_size: usize,
    ) -> Self {
        Self {
            number_of_radio_units,
            number_of_channels,
            max_channel_cache_size,
            min_channel_cache_size,
            ..Default::default()
        }
    }

    /// Set the exploration RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the exploration cadence.
    pub fn with_exploration_modulus(mut self, modulus: u64) -> Self {
        self.exploration_modulus = modulus;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> CoopResult<()> {
        let channels = self.number_of_channels;
        let max_cache = self.max_channel_cache_size;
        let min_cache = self.min_channel_cache_size;

        if channels == 0 {
            return Err(invalid("number_of_channels", "must be greater than zero"));
        }
        if self.number_of_radio_units == 0 {
            return Err(invalid("number_of_radio_units", "at least one radio unit is required"));
        }
        if self.number_of_radio_units > channels {
            return Err(CoopError::TooManyRadioUnits {
                units: self.number_of_radio_units,
                channels,
            });
        }
        if max_cache == 0 {
            return Err(invalid("max_channel_cache_size", "must be greater than zero"));
        }
        if min_cache == 0 {
            return Err(invalid("min_channel_cache_size", "must be greater than zero"));
        }
        if max_cache % channels != 0 {
            return Err(CoopError::CacheSizeNotMultipleOfChannels { max_cache, channels });
        }
        if max_cache % min_cache != 0 {
            return Err(CoopError::CacheSizeNotMultipleOfMinimum { max_cache, min_cache });
        }
        if self.exploration_modulus == 0 {
            return Err(invalid("exploration_modulus", "must be greater than zero"));
        }

        Ok(())
    }
}

fn invalid(name: &'static str, reason: &str) -> CoopError {
    CoopError::InvalidParameter {
        name,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.number_of_channels, 8);
        assert_eq!(config.exploration_modulus, 10);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            EngineConfig::new(7, 6, 42, 7).validate(),
            Err(CoopError::TooManyRadioUnits { units: 7, channels: 6 })
        );
        assert_eq!(
            EngineConfig::new(2, 6, 40, 8).validate(),
            Err(CoopError::CacheSizeNotMultipleOfChannels { max_cache: 40, channels: 6 })
        );
        assert_eq!(
            EngineConfig::new(2, 6, 42, 5).validate(),
            Err(CoopError::CacheSizeNotMultipleOfMinimum { max_cache: 42, min_cache: 5 })
        );
        assert!(EngineConfig::new(2, 6, 42, 7).validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zeros() {
        for config in [
            EngineConfig::new(2, 0, 42, 7),
            EngineConfig::new(0, 6, 42, 7),
            EngineConfig::new(2, 6, 0, 7),
            EngineConfig::new(2, 6, 42, 0),
            EngineConfig::new(2, 6, 42, 7).with_exploration_modulus(0),
        ] {
            let err = config.validate().unwrap_err();
            assert!(matches!(err, CoopError::InvalidParameter { .. }), "{err}");
        }
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
number_of_channels: 6
max_channel_cache_size: 42
min_channel_cache_size: 7
seed: 11
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.number_of_radio_units, 2);
        assert_eq!(config.number_of_channels, 6);
        assert_eq!(config.seed, Some(11));
        assert!(config.validate().is_ok());
    }
}
