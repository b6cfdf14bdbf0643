//! Generator Configuration
//!
//! Loaded from a JSON file. Every field has a default, so an absent file
//! is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::export::NamingConvention;
use crate::serial::SerialPolicy;
use crate::symbol::{SymbolSpec, MIN_BORDER};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid symbol geometry: {0}")]
    Symbol(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(default)]
    pub policy: SerialPolicy,
    #[serde(default)]
    pub naming: NamingConvention,
    #[serde(default)]
    pub symbol: SymbolSpec,
    /// Export target when the request leaves it blank
    #[serde(default)]
    pub save_directory: Option<PathBuf>,
}

impl GeneratorConfig {
    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let s = &self.symbol;
        if s.size == 0 {
            return Err(ConfigError::Symbol("size must be positive".into()));
        }
        if s.box_size == 0 {
            return Err(ConfigError::Symbol("boxSize must be positive".into()));
        }
        if s.border < MIN_BORDER {
            return Err(ConfigError::Symbol(format!(
                "border must be at least {} modules",
                MIN_BORDER
            )));
        }
        Ok(())
    }
}
