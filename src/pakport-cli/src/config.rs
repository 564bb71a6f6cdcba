//! Configuration management for pakport CLI

use anyhow::{Context, Result};
use pakport::{FourCC, ProjectLayout, TypeCatalog};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Default worker thread count; 0 or unset uses every core
    pub threads: Option<usize>,
    pub keep_raw: bool,
    /// Type code marking world archives (defaults to MLVL)
    pub world_type: Option<String>,
    pub layout: ProjectLayout,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("pakport");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Type catalog honoring the configured world type
    pub fn catalog(&self) -> Result<TypeCatalog> {
        match &self.world_type {
            Some(code) => {
                let code: FourCC = code
                    .parse()
                    .with_context(|| format!("Invalid world type in config: {}", code))?;
                Ok(TypeCatalog::with_world_type(code))
            }
            None => Ok(TypeCatalog::new()),
        }
    }

    /// Thread count with a command-line override applied
    pub fn threads(&self, flag: Option<usize>) -> usize {
        flag.or(self.threads).unwrap_or(0)
    }
}
