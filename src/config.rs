//! Engine configuration.
//!
//! Supports loading config from:
//! - a TOML file (`--config` or `CORRIDOR_RISK_CONFIG`)
//! - environment variables
//!
//! Explicit CLI flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Weights;

pub const CONFIG_ENV: &str = "CORRIDOR_RISK_CONFIG";
pub const DROUGHT_TABLE_ENV: &str = "CORRIDOR_RISK_DROUGHT_TABLE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: Weights,
    /// Local water stress of the scored node, 0 (low) to 1 (very high).
    pub base_water_stress: f64,
    pub region: String,
    pub drought_table: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            weights: Weights::default(),
            base_water_stress: 0.9,
            region: "Ege".to_string(),
            drought_table: None,
        }
    }
}

impl EngineConfig {
    /// Defaults, then the config file if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => EngineConfig::default(),
        };

        config.apply_env(std::env::var(DROUGHT_TABLE_ENV).ok());
        Ok(config)
    }

    /// Apply the value of `CORRIDOR_RISK_DROUGHT_TABLE`, if set.
    pub fn apply_env(&mut self, drought_table: Option<String>) {
        if let Some(table) = drought_table.filter(|t| !t.trim().is_empty()) {
            self.drought_table = Some(PathBuf::from(table));
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config =
            toml::from_str::<EngineConfig>(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }
}
