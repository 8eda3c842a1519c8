//! Model configuration, loaded from TOML.
//!
//! ```toml
//! change_buffer = 512
//! default_sort = "time-desc"
//! picker_single_pane = true
//! log_filter = "kbfs_client=debug,info"
//! ```
//!
//! Every key is optional.

use std::path::Path as FsPath;

use kbfs_types::SortSetting;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::constants::{DEFAULT_CHANGE_BUFFER, DEFAULT_LOG_FILTER};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Capacity of the store's change broadcast.
    pub change_buffer: usize,

    /// Sort applied to folders without a per-path setting.
    #[serde(
        serialize_with = "serialize_sort",
        deserialize_with = "deserialize_sort"
    )]
    pub default_sort: SortSetting,

    /// Destination picker backs up within a single pane.
    pub picker_single_pane: bool,

    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            change_buffer: DEFAULT_CHANGE_BUFFER,
            default_sort: SortSetting::default(),
            picker_single_pane: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ModelConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<FsPath>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded model config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.change_buffer == 0 {
            return Err(ConfigError::Invalid("change_buffer must be at least 1".into()));
        }
        Ok(())
    }
}

fn serialize_sort<S: Serializer>(setting: &SortSetting, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(setting)
}

fn deserialize_sort<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SortSetting, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse()
        .map_err(|_| serde::de::Error::custom(format!("unknown sort setting {raw:?}")))
}
