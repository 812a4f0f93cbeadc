//! Configuration file support for wharf.
//!
//! wharf reads two optional configuration files:
//! - Global: `~/.wharf/config.toml` - User-wide defaults
//! - Project: `.wharf/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::wheel::Compression;

/// wharf configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Legacy metadata extraction settings
    pub legacy: LegacyConfig,
}

/// Compression method name as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMethod {
    Deflated,
    Stored,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Drop files version control ignores (default: true)
    pub respect_vcs_ignores: Option<bool>,

    /// Entry compression (default: deflated)
    pub compression: Option<CompressionMethod>,

    /// Deflate level
    pub compression_level: Option<i64>,
}

/// Legacy `setup.py` extraction settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    /// Extractor command line, e.g. `["python3", "/opt/find_dependency.py"]`.
    pub command: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or malformed.
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
        if other.build.respect_vcs_ignores.is_some() {
            self.build.respect_vcs_ignores = other.build.respect_vcs_ignores;
        }
        if other.build.compression.is_some() {
            self.build.compression = other.build.compression;
        }
        if other.build.compression_level.is_some() {
            self.build.compression_level = other.build.compression_level;
        }

        if !other.legacy.command.is_empty() {
            self.legacy.command = other.legacy.command;
        }
    }

    /// Whether version control ignore lists apply.
    pub fn respect_vcs_ignores(&self) -> bool {
        self.build.respect_vcs_ignores.unwrap_or(true)
    }

    /// Compression for archive entries.
    pub fn compression(&self) -> Compression {
        match self.build.compression {
            Some(CompressionMethod::Stored) => Compression::Stored,
            Some(CompressionMethod::Deflated) | None => {
                Compression::Deflated(self.build.compression_level)
            }
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.wharf/config.toml)
/// 2. Global config (~/.wharf/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }
    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global wharf config directory (~/.wharf).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".wharf"))
}

/// Get the global config path (~/.wharf/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.wharf/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".wharf").join("config.toml")
}
