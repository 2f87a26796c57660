//! Configuration system for the ecosystem simulator.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::arena::{ArenaConfig, ArenaError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub observer: ObserverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Pacing of the background driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Advances per batch (0 = arena_size² / 50)
    pub iterations_per_sleep: usize,
    /// Pause between batches in milliseconds
    pub sleep_interval_ms: u64,
}

/// Display refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Milliseconds between frames
    pub frame_interval_ms: u64,
    /// Generation counter text; `{}` is replaced by the generation
    pub generation_format: String,
}

/// Logging and census configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Generations between census records
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            iterations_per_sleep: 0,
            sleep_interval_ms: 1,
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            generation_format: "Generation: {}".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 10_000,
            log_level: "info".to_string(),
        }
    }
}

impl DriverConfig {
    /// Batch size for an arena of the given side length
    pub fn batch_size(&self, arena_size: usize) -> usize {
        if self.iterations_per_sleep > 0 {
            self.iterations_per_sleep
        } else {
            (arena_size * arena_size / 50).max(1)
        }
    }
}

impl ObserverConfig {
    /// Render the generation counter text
    pub fn format_generation(&self, generation: u64) -> String {
        self.generation_format.replacen("{}", &generation.to_string(), 1)
    }
}

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Invalid(e.to_string())
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arena.validate()?;
        if self.logging.stats_interval == 0 {
            return Err(ConfigError::Invalid("stats_interval must be > 0".to_string()));
        }
        if !self.observer.generation_format.contains("{}") {
            return Err(ConfigError::Invalid(
                "generation_format must contain {}".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.arena.num_breeds, 5);
        assert_eq!(config.arena.arena_size, 100);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.arena.seed = Some(42);
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(loaded.arena.arena_size, config.arena.arena_size);
        assert_eq!(loaded.arena.seed, Some(42));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "arena:\n  num_breeds: 3\n  arena_size: 40\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.arena.num_breeds, 3);
        assert_eq!(config.arena.seed, None);
        assert_eq!(config.driver.sleep_interval_ms, 1);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let yaml = "driver:\n  sleep_interval_ms: 0\nobserver:\n  frame_interval_ms: 33\nlogging:\n  log_level: debug\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.driver.sleep_interval_ms, 0);
        assert_eq!(config.driver.iterations_per_sleep, 0);
        assert_eq!(config.observer.frame_interval_ms, 33);
        assert_eq!(config.observer.generation_format, "Generation: {}");
        assert_eq!(config.logging.log_level, "debug");
        assert_eq!(config.logging.stats_interval, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.arena.num_breeds = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.arena.arena_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.stats_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_size() {
        let driver = DriverConfig::default();
        assert_eq!(driver.batch_size(100), 200);
        assert_eq!(driver.batch_size(3), 1);

        let fixed = DriverConfig {
            iterations_per_sleep: 17,
            sleep_interval_ms: 0,
        };
        assert_eq!(fixed.batch_size(100), 17);
    }

    #[test]
    fn test_generation_format() {
        let observer = ObserverConfig::default();
        assert_eq!(observer.format_generation(42), "Generation: 42");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.arena.num_breeds = 7;
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.arena.num_breeds, 7);
    }
}
