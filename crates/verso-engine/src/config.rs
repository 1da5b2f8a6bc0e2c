//! Configuration for verso.
//!
//! A small JSON file in the data directory. Every field has a default, so
//! a missing file or a partial one both load cleanly.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File name of the configuration inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Main configuration for verso.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the generation endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Milliseconds between revealed characters.
    #[serde(default = "default_reveal_interval_ms")]
    pub reveal_interval_ms: u64,

    /// Milliseconds between UI ticks.
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8080".into()
}

fn default_reveal_interval_ms() -> u64 {
    25
}

fn default_tick_rate_ms() -> u64 {
    25
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            reveal_interval_ms: default_reveal_interval_ms(),
            tick_rate_ms: default_tick_rate_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration, falling back to defaults if the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, "http://localhost:8080");
        assert_eq!(config.reveal_interval(), Duration::from_millis(25));
        assert_eq!(config.tick_rate(), Duration::from_millis(25));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"endpoint":"http://poemas.test"}"#).unwrap();
        assert_eq!(config.endpoint, "http://poemas.test");
        assert_eq!(config.reveal_interval_ms, 25);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"endpoint":"http://poemas.test","reveal_interval_ms":5}"#)
            .unwrap();
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.endpoint, "http://poemas.test");
        assert_eq!(config.reveal_interval(), Duration::from_millis(5));
        assert_eq!(config.tick_rate_ms, 25);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_or_default(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
