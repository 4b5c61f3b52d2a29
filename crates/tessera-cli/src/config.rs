//! Configuration management for Tessera CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_factory::FactoryConfig;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decoder settings
    pub factory: FactoryConfig,

    /// Report formatting
    pub output: OutputConfig,
}

/// Report formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Decimal places for statistics in text output
    pub precision: usize,

    /// Number of leading elements shown in text output
    pub preview_elements: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            preview_elements: 8,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    ///
    /// An explicitly given path must exist; a missing file at the default
    /// location yields the default configuration.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::default_config_path();
                if !path.exists() {
                    return Ok(Config::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config
            .factory
            .validate()
            .with_context(|| format!("Invalid factory settings in {}", config_path.display()))?;

        Ok(config)
    }

    /// Save configuration to file
    #[allow(dead_code)]
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"))
            .join("tessera")
            .join("config.toml")
    }
}
