//! Configuration system for yamlrelay.
//!
//! This module provides the user settings for the command-line host with
//! sensible defaults and support for serialization/deserialization via serde.
//! Configuration is loaded from a TOML file and overridden by command-line
//! arguments.
//!
//! # Example
//!
//! ```
//! use yamlrelay::config::Config;
//!
//! // Use default configuration
//! let config = Config::default();
//! assert_eq!(config.log_level, "warn");
//! assert_eq!(config.default_namespace, "default");
//!
//! // Create custom configuration
//! let custom = Config {
//!     create_backup: true,
//!     ..Config::default()
//! };
//! assert!(custom.create_backup);
//! ```

use crate::document::resid::DEFAULT_NAMESPACE;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the yamlrelay command-line host.
///
/// # Fields
///
/// * `log_level` - Log level used when neither `-v` nor `RUST_LOG` is given (default: "warn")
/// * `default_namespace` - Namespace assumed for resources that declare none (default: "default")
/// * `create_backup` - Create .bak files before rewriting a file in place (default: false)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// One of "off", "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_namespace")]
    pub default_namespace: String,

    /// Create .bak files before rewriting in place
    #[serde(default)]
    pub create_backup: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_namespace: default_namespace(),
            create_backup: false,
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/yamlrelay/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("yamlrelay");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads configuration from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string).context("Failed to write config")?;

        Ok(())
    }

    /// The configured log level, or `Warn` when it is not a level name.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level
            .trim()
            .parse()
            .unwrap_or(log::LevelFilter::Warn)
    }
}
