//! Factory configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decode::Endianness;
use crate::error::{FactoryError, Result};

/// Environment variable overriding [`FactoryConfig::default_endianness`]
pub const ENDIANNESS_ENV: &str = "TESSERA_DEFAULT_ENDIANNESS";

/// Settings applied to every decode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Byte order used when a request does not name one
    pub default_endianness: Endianness,
    /// Largest accepted input buffer in bytes
    pub max_tensor_bytes: usize,
    /// Largest accepted batch
    pub max_batch_entries: usize,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        // Environment override for the default byte order
        let default_endianness = std::env::var(ENDIANNESS_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            default_endianness,
            max_tensor_bytes: 4 << 30, // 4 GiB
            max_batch_entries: 4096,
            logging: LoggingConfig::default(),
        }
    }
}

impl FactoryConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_tensor_bytes == 0 {
            return Err(FactoryError::InvalidConfig(
                "max_tensor_bytes must be greater than 0".to_string(),
            ));
        }
        if self.max_batch_entries == 0 {
            return Err(FactoryError::InvalidConfig(
                "max_batch_entries must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: LogLevel::Warn }
    }
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug output
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Matching `tracing` level
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FactoryConfig::from_toml_str(
            r#"
            default_endianness = "big"
            max_batch_entries = 8

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_endianness, Endianness::Big);
        assert_eq!(config.max_batch_entries, 8);
        assert_eq!(config.max_tensor_bytes, 4 << 30);
        assert_eq!(config.logging.level.as_tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let err = FactoryConfig::from_toml_str("max_tensor_bytes = 0").unwrap_err();
        assert!(matches!(err, FactoryError::InvalidConfig(_)));
        assert!(FactoryConfig::from_toml_str("default_endianness = \"middle\"").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factory.toml");

        let config = FactoryConfig {
            default_endianness: Endianness::Big,
            max_batch_entries: 16,
            ..FactoryConfig::default()
        };
        config.to_file(&path).unwrap();
        assert_eq!(FactoryConfig::from_file(&path).unwrap(), config);
    }
}
