//! Runtime configuration file parsing.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::runner::binary_value::ConversionConfig;
use crate::runner::callback::registry::RegistryConfig;
use crate::runner::ds::heap::HeapConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete runtime configuration. Every section and key is optional.
///
/// Expected format:
/// ```toml
/// [heap]
/// max_bytes = 16777216
///
/// [registry]
/// max_callers = 1024
///
/// [conversion]
/// max_depth = 32
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub heap: HeapConfig,
    pub registry: RegistryConfig,
    pub conversion: ConversionConfig,
}

impl RuntimeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
