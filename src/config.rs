//! CLI configuration.
//!
//! Layered the usual way: built-in defaults, then an optional YAML file,
//! then command-line flags applied by the caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use statewalker_explorer::ExplorerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    /// Budgets, thresholds, and safety policy for the engine.
    pub explorer: ExplorerConfig,
    /// Where session snapshots are written; `None` disables persistence.
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            explorer: ExplorerConfig::default(),
            snapshot_path: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Resolve the config: explicit path, else `./config/statewalker.yaml`,
    /// else the user config directory, else defaults.
    pub fn load(explicit: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let local = PathBuf::from("config/statewalker.yaml");
        if local.exists() {
            return Self::from_file(&local);
        }
        if let Some(mut dir) = dirs::config_dir() {
            dir.push("statewalker");
            dir.push("config.yaml");
            if dir.exists() {
                return Self::from_file(&dir);
            }
        }
        Ok(Self::default())
    }
}
