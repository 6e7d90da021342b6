//! # Simulation Configuration
//!
//! YAML configuration for the `coopsense-sim` runner:
//!
//! - Engine parameters (radio units, channels, cache sizes, exploration)
//! - Logging
//! - Synthetic traffic, or an RSSI dataset to replay instead
//! - Named engine profiles
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path in the `COOPSENSE_CONFIG` environment variable
//! 2. `./coopsense.yaml` (current directory)
//! 3. `<user config dir>/coopsense/config.yaml`
//! 4. `/etc/coopsense/config.yaml`
//!
//! ## Example Configuration
//!
//! ```yaml
//! engine:
//!   number_of_radio_units: 2
//!   number_of_channels: 8
//!   max_channel_cache_size: 1024
//!   min_channel_cache_size: 32
//!
//! traffic:
//!   profile: fixed_interval
//!   switch_interval: 10
//!   length: 10000
//!
//! profiles:
//!   wide:
//!     number_of_radio_units: 4
//!     number_of_channels: 8
//! ```

use crate::dataset::{RssiTraceReader, DEFAULT_MAX_LENGTH, DEFAULT_RSSI_THRESHOLD};
use crate::error::{ConfigError, SimResult};
use crate::generator::{TrafficConfig, TrafficProfile};
use crate::traffic::{ExhaustionPolicy, RecordedTraffic};
use coopsense_core::config::EngineConfig;
use coopsense_core::observe::LogConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "COOPSENSE_CONFIG";

/// RSSI dataset replay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// One trace file per node; node i feeds channel i
    pub paths: Vec<PathBuf>,
    /// Readings below this are OCCUPIED
    pub threshold: i64,
    /// Readings kept per node (None = all)
    pub max_length: Option<usize>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            threshold: DEFAULT_RSSI_THRESHOLD,
            max_length: Some(DEFAULT_MAX_LENGTH),
        }
    }
}

impl DatasetConfig {
    pub fn reader(&self) -> RssiTraceReader {
        RssiTraceReader::new(self.threshold).with_max_length(self.max_length)
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Configuration version
    pub version: String,
    /// Decision engine parameters
    pub engine: EngineConfig,
    /// Logging configuration
    pub logging: LogConfig,
    /// Synthetic traffic, used when no dataset is given
    pub traffic: TrafficConfig,
    /// Recorded RSSI traces to replay
    pub dataset: Option<DatasetConfig>,
    /// Stop after this many steps
    pub max_steps: Option<usize>,
    /// Engine profiles (name -> config)
    pub profiles: HashMap<String, EngineConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            engine: EngineConfig::default(),
            logging: LogConfig::default(),
            traffic: TrafficConfig::default(),
            dataset: None,
            max_steps: None,
            profiles: HashMap::new(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
            debug!(%path, "{} points at a missing file", CONFIG_ENV_VAR);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded config");
        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))
    }

    /// Replace the engine parameters with a named profile.
    pub fn with_profile(&self, name: &str) -> Result<Self, ConfigError> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::NotFound(format!("profile '{}' not found", name)))?;

        let mut config = self.clone();
        config.engine = profile.clone();
        Ok(config)
    }

    /// Candidate config files after `COOPSENSE_CONFIG`, in search order.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./coopsense.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "coopsense") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/coopsense/config.yaml"));
        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;

        let channels = self.engine.number_of_channels;
        match &self.dataset {
            Some(dataset) => {
                if dataset.paths.is_empty() {
                    return Err(ConfigError::Invalid("dataset.paths must not be empty".to_string()));
                }
                if dataset.paths.len() != channels {
                    return Err(ConfigError::Invalid(format!(
                        "dataset has {} nodes but the engine observes {} channels",
                        dataset.paths.len(),
                        channels
                    )));
                }
                if dataset.max_length == Some(0) {
                    return Err(ConfigError::Invalid("dataset.max_length must be > 0".to_string()));
                }
            }
            None => {
                if self.traffic.length == 0 {
                    return Err(ConfigError::Invalid("traffic.length must be > 0".to_string()));
                }
                if self.traffic.profile == TrafficProfile::FixedInterval && self.traffic.switch_interval == 0 {
                    return Err(ConfigError::Invalid("traffic.switch_interval must be > 0".to_string()));
                }
                if self.traffic.num_channels() != channels {
                    return Err(ConfigError::Invalid(format!(
                        "traffic generates {} channels but the engine observes {}",
                        self.traffic.num_channels(),
                        channels
                    )));
                }
            }
        }

        if self.max_steps == Some(0) {
            return Err(ConfigError::Invalid("max_steps must be > 0".to_string()));
        }
        if self.traffic.exhaustion != ExhaustionPolicy::Stop && self.max_steps.is_none() {
            return Err(ConfigError::Invalid(format!(
                "traffic.exhaustion {:?} never ends; set max_steps",
                self.traffic.exhaustion
            )));
        }

        Ok(())
    }

    /// Build the traffic source: the dataset when one is configured, else
    /// synthetic traffic.
    pub fn build_traffic(&self) -> SimResult<RecordedTraffic> {
        match &self.dataset {
            Some(dataset) => Ok(dataset
                .reader()
                .load_nodes(&dataset.paths[..])?
                .with_policy(self.traffic.exhaustion)),
            None => self.traffic.build(),
        }
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            engine: EngineConfig::default().with_seed(42),
            max_steps: Some(5_000),
            profiles: {
                let mut profiles = HashMap::new();
                profiles.insert("single".to_string(), EngineConfig::new(1, 8, 1024, 32));
                profiles.insert(
                    "fast_explore".to_string(),
                    EngineConfig::new(2, 8, 256, 32).with_exploration_modulus(4),
                );
                profiles
            },
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coopsense_core::observe::LogLevel;
    use coopsense_core::CoopError;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.engine.number_of_channels, 8);
        assert_eq!(config.traffic.num_channels(), 8);
        assert!(config.dataset.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
engine:
  number_of_radio_units: 3
  number_of_channels: 6
  max_channel_cache_size: 42
  min_channel_cache_size: 7
  seed: 11

logging:
  level: debug

traffic:
  profile: fixed
  empty_biased_channels: 3
  occupied_biased_channels: 3
  length: 500

max_steps: 200
"#;

        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.engine.number_of_radio_units, 3);
        assert_eq!(config.engine.seed, Some(11));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.traffic.profile, TrafficProfile::Fixed);
        assert_eq!(config.traffic.num_channels(), 6);
        assert_eq!(config.max_steps, Some(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config = SimulationConfig::parse("max_steps: 10\n").unwrap();
        assert_eq!(config.max_steps, Some(10));
        assert_eq!(config.engine.max_channel_cache_size, 1024);
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn test_parse_rejects_bad_yaml() {
        let err = SimulationConfig::parse("engine: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_profiles() {
        let yaml = r#"
profiles:
  wide:
    number_of_radio_units: 4
    number_of_channels: 8
    max_channel_cache_size: 64
    min_channel_cache_size: 16
"#;

        let config = SimulationConfig::parse(yaml).unwrap();
        let wide = config.with_profile("wide").unwrap();
        assert_eq!(wide.engine.number_of_radio_units, 4);
        assert_eq!(wide.engine.max_channel_cache_size, 64);
        assert!(wide.validate().is_ok());

        assert!(matches!(
            config.with_profile("missing"),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_validate_engine_errors() {
        // 8 channels, minimum 32: 1001 is not a multiple of 8.
        let mut config = SimulationConfig::default();
        config.engine.max_channel_cache_size = 1001;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(CoopError::CacheSizeNotMultipleOfChannels { .. }))
        ));

        // 1000 is a multiple of 8 but not of 32.
        config.engine.max_channel_cache_size = 1000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(CoopError::CacheSizeNotMultipleOfMinimum {
                max_cache: 1000,
                min_cache: 32
            }))
        ));
    }

    #[test]
    fn test_validate_traffic_width() {
        let mut config = SimulationConfig::default();
        config.traffic.biases.occupied_biased_channels = 2;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SimulationConfig::default();
        config.max_steps = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unbounded_traffic_needs_max_steps() {
        let mut config = SimulationConfig::default();
        config.traffic.exhaustion = ExhaustionPolicy::Wrap;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.max_steps = Some(50_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_dataset() {
        let mut config = SimulationConfig::default();
        config.dataset = Some(DatasetConfig::default());
        assert!(config.validate().is_err());

        config.dataset = Some(DatasetConfig {
            paths: (1..=8).map(|i| PathBuf::from(format!("node{}.txt", i))).collect(),
            ..Default::default()
        });
        // Traffic width no longer matters once a dataset is set.
        config.traffic.biases.empty_biased_channels = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir().join(format!("coopsense-config-{}.yaml", std::process::id()));
        let mut config = SimulationConfig::default();
        config.engine.seed = Some(99);
        config.max_steps = Some(123);

        config.save(&path).unwrap();
        let loaded = SimulationConfig::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = SimulationConfig::load_from(Path::new("/nonexistent/coopsense.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn test_search_paths() {
        let paths = SimulationConfig::config_search_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("./coopsense.yaml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("/etc/coopsense/config.yaml")));
    }

    #[test]
    fn test_example_yaml_parses() {
        let yaml = SimulationConfig::example_yaml();
        let config = SimulationConfig::parse(&yaml).unwrap();
        assert!(config.profiles.contains_key("fast_explore"));
        assert_eq!(config.engine.seed, Some(42));
        assert!(config.validate().is_ok());
        for name in config.profiles.keys() {
            assert!(config.with_profile(name).unwrap().validate().is_ok());
        }
    }

    #[test]
    fn test_build_traffic_synthetic() {
        let mut config = SimulationConfig::default();
        config.traffic.length = 50;
        config.traffic.seed = Some(3);
        let traffic = config.build_traffic().unwrap();
        assert_eq!(traffic.len(), 50);
    }
}
