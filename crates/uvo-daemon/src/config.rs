//! Daemon configuration
//!
//! A single YAML file:
//!
//! ```yaml
//! username: owner@example.com
//! password: hunter2
//! scan_interval_minutes: 30   # optional, 1-999
//! log_filter: info            # optional, tracing EnvFilter directive
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use uvo_core::ScanInterval;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Daemon configuration file contents
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Owners-account username
    pub username: String,

    /// Owners-account password
    pub password: String,

    /// Polling interval in minutes (1-999); defaults when absent
    #[serde(default)]
    pub scan_interval_minutes: Option<u32>,

    /// tracing filter directive, e.g. "info" or "uvo_coordinator=debug"
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl DaemonConfig {
    /// Load and validate the configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> ConfigResult<Self> {
        let config: DaemonConfig =
            serde_yaml::from_str(content).map_err(|source| ConfigError::ParseYaml {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.username.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "username".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "password".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        self.scan_interval()?;
        Ok(())
    }

    /// Validated scan interval, falling back to the default when unset
    pub fn scan_interval(&self) -> ConfigResult<ScanInterval> {
        match self.scan_interval_minutes {
            None => Ok(ScanInterval::default()),
            Some(minutes) => {
                ScanInterval::new(minutes).map_err(|err| ConfigError::InvalidValue {
                    key: "scan_interval_minutes".to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }
}
