//! Configuration file support.
//!
//! ace reads two configuration file locations:
//! - Global: `~/.ace/config.toml` - User-wide defaults
//! - Project: `.ace/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::context::NotFoundAction;

/// ace configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SDK location
    pub sdk: SdkConfig,

    /// Packaging settings
    pub build: BuildConfig,

    /// ICU data settings
    pub icu: IcuConfig,
}

/// SDK-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// ArkUI-X SDK root, or a directory holding `<api>/arkui-x`
    pub path: Option<PathBuf>,

    /// OpenHarmony API level, when the project does not declare one
    pub api_version: Option<u32>,
}

/// Packaging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Delete managed libraries the build no longer needs
    pub clear_lib_before_copy: Option<bool>,

    /// What to do when a declared library is missing from the SDK
    /// (`abort`, `ignore`, `ignore-all`)
    pub not_found: Option<String>,

    /// Comma-separated fallback Android targets (`arm64,arm,x86_64`)
    pub target_platform: Option<String>,
}

/// ICU data configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IcuConfig {
    /// Ship ICU data with the native project
    pub enabled: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.sdk.path.is_some() {
            self.sdk.path = other.sdk.path;
        }
        if other.sdk.api_version.is_some() {
            self.sdk.api_version = other.sdk.api_version;
        }

        if other.build.clear_lib_before_copy.is_some() {
            self.build.clear_lib_before_copy = other.build.clear_lib_before_copy;
        }
        if other.build.not_found.is_some() {
            self.build.not_found = other.build.not_found;
        }
        if other.build.target_platform.is_some() {
            self.build.target_platform = other.build.target_platform;
        }

        if other.icu.enabled.is_some() {
            self.icu.enabled = other.icu.enabled;
        }
    }

    pub fn clear_lib_before_copy(&self) -> bool {
        self.build.clear_lib_before_copy.unwrap_or(false)
    }

    pub fn icu_enabled(&self) -> bool {
        self.icu.enabled.unwrap_or(true)
    }

    /// The configured not-found action, defaulting to `ignore-all`.
    pub fn not_found(&self) -> Result<NotFoundAction> {
        match &self.build.not_found {
            Some(s) => s
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("invalid `build.not_found` in config"),
            None => Ok(NotFoundAction::IgnoreAll),
        }
    }

    /// Fallback Android targets as a list.
    pub fn target_platforms(&self) -> Vec<String> {
        split_list(self.build.target_platform.as_deref().unwrap_or(""))
    }
}

/// Split a comma-separated list, dropping empty items.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.ace/config.toml)
/// 2. Global config (~/.ace/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global ace config directory (~/.ace).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".ace"))
}

/// Get the project config path (.ace/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".ace").join("config.toml")
}
