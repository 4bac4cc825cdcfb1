use std::path::{Path, PathBuf};

use registry_core::LogFields;
use serde::Deserialize;

use crate::telemetry::LogFormat;

/// Log field key under which the node identifier is attached.
pub const NODE_ID_FIELD: &str = "nodeID";

/// Registry server configuration.
///
/// Every field has a default, so a config file only needs the values it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Identifier of this registry node. When set it is attached to every call
    /// as `nodeID` unless `log_options` already carries that key.
    pub node_id: String,
    /// Additional context fields attached to every call.
    pub log_options: LogFields,
    /// Capacity of the channel backing a `find` stream.
    pub find_channel_capacity: usize,
    pub log_format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            node_id: String::new(),
            log_options: LogFields::new(),
            find_channel_capacity: 64,
            log_format: LogFormat::Text,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("log option must be KEY=VALUE, got {0:?}")]
    InvalidLogOption(String),
    #[error("find_channel_capacity must be at least 1")]
    ZeroChannelCapacity,
}

impl RegistryConfig {
    /// Parses a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid config JSON,
    /// or a validation error from [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroChannelCapacity`] if `find_channel_capacity` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.find_channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        Ok(())
    }

    /// Reads and parses a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its content is invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Fields the log option element should attach: `log_options` plus `nodeID`.
    #[must_use]
    pub fn effective_log_options(&self) -> LogFields {
        if self.node_id.is_empty() {
            return self.log_options.clone();
        }
        let node: LogFields = [(NODE_ID_FIELD, self.node_id.as_str())]
            .into_iter()
            .collect();
        node.merged(&self.log_options)
    }
}

/// Parses one `KEY=VALUE` log option. The value may itself contain `=`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidLogOption`] if there is no `=` or the key is empty.
pub fn parse_log_option(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(ConfigError::InvalidLogOption(raw.to_string())),
    }
}
