//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::clipboard::FeatureFlags;

/// Clipboard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardConfig {
    /// Offer the host clipboard to the guest
    #[serde(default = "default_true")]
    pub to_guest_enabled: bool,

    /// Deliver the guest clipboard to the host
    #[serde(default = "default_true")]
    pub to_client_enabled: bool,

    /// How long a local paste waits for guest data, in milliseconds
    /// Default: 10000. Valid range 1..=30000.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_render_timeout_ms() -> u64 {
    10_000
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            to_guest_enabled: true,
            to_client_enabled: true,
            render_timeout_ms: default_render_timeout_ms(),
        }
    }
}

impl ClipboardConfig {
    /// Direction switches for the controller
    pub fn feature_flags(&self) -> FeatureFlags {
        FeatureFlags {
            to_guest_enabled: self.to_guest_enabled,
            to_client_enabled: self.to_client_enabled,
        }
    }

    /// Render deadline
    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Verbosity 0-4 (error, warn, info, debug, trace)
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,

    /// Output format ("pretty", "compact", "json")
    #[serde(default = "default_format")]
    pub format: String,

    /// Directory for log files (None = console only)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_verbosity() -> u8 {
    2
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbosity: default_verbosity(),
            format: default_format(),
            log_dir: None,
        }
    }
}
