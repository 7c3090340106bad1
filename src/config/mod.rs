//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - Environment variables
//! - CLI arguments

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod types;

pub use types::{ClipboardConfig, LoggingConfig};

/// Longest render deadline accepted, in milliseconds
pub const MAX_RENDER_TIMEOUT_MS: u64 = 30_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Clipboard configuration
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line, applied over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Force host→guest on or off
    pub to_guest_enabled: Option<bool>,
    /// Force guest→host on or off
    pub to_client_enabled: Option<bool>,
    /// Verbosity 0-4
    pub verbosity: Option<u8>,
    /// Log format
    pub log_format: Option<String>,
    /// Log directory
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            clipboard: ClipboardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let timeout = self.clipboard.render_timeout_ms;
        if timeout == 0 || timeout > MAX_RENDER_TIMEOUT_MS {
            anyhow::bail!(
                "render_timeout_ms ({}) must be between 1 and {}",
                timeout,
                MAX_RENDER_TIMEOUT_MS
            );
        }

        if self.logging.verbosity > 4 {
            anyhow::bail!(
                "Invalid verbosity: {} (expected 0-4)",
                self.logging.verbosity
            );
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(enabled) = overrides.to_guest_enabled {
            self.clipboard.to_guest_enabled = enabled;
        }
        if let Some(enabled) = overrides.to_client_enabled {
            self.clipboard.to_client_enabled = enabled;
        }
        if let Some(verbosity) = overrides.verbosity {
            self.logging.verbosity = verbosity.min(4);
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
        if overrides.log_dir.is_some() {
            self.logging.log_dir = overrides.log_dir;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert!(config.clipboard.to_guest_enabled);
        assert!(config.clipboard.to_client_enabled);
        assert_eq!(config.clipboard.render_timeout_ms, 10_000);
        assert_eq!(config.logging.verbosity, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [clipboard]
            to_client_enabled = false
            "#,
        )
        .unwrap();
        assert!(config.clipboard.to_guest_enabled);
        assert!(!config.clipboard.to_client_enabled);
        assert_eq!(config.clipboard.render_timeout_ms, 10_000);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_config_validation_render_timeout() {
        let mut config = Config::default_config();
        config.clipboard.render_timeout_ms = 0;
        assert!(config.validate().is_err());
        config.clipboard.render_timeout_ms = MAX_RENDER_TIMEOUT_MS + 1;
        assert!(config.validate().is_err());
        config.clipboard.render_timeout_ms = MAX_RENDER_TIMEOUT_MS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_logging() {
        let mut config = Config::default_config();
        config.logging.verbosity = 5;
        assert!(config.validate().is_err());

        let mut config = Config::default_config();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default_config().with_overrides(Overrides {
            to_guest_enabled: Some(false),
            verbosity: Some(9),
            log_dir: Some(PathBuf::from("/tmp/logs")),
            ..Overrides::default()
        });
        assert!(!config.clipboard.to_guest_enabled);
        assert!(config.clipboard.to_client_enabled);
        assert_eq!(config.logging.verbosity, 4);
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert!(!config.clipboard.feature_flags().to_guest_enabled);
    }
}
