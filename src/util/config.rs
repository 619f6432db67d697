//! Configuration file support for Slipway.
//!
//! Slipway supports two configuration file locations:
//! - Global: `~/.slipway/config.toml` - User-wide defaults
//! - Project: `.slipway/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. All settings are
//! resolved into plain values here; nothing downstream consults a config
//! source at run time.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Slipway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package path settings
    pub paths: PathsConfig,

    /// Build settings
    pub build: BuildConfig,
}

/// Package installation and search paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where `build --install` lands packages (default: ~/.slipway/packages)
    pub local_packages: Option<PathBuf>,

    /// Where `release` lands packages (default: ~/.slipway/releases)
    pub release_packages: Option<PathBuf>,

    /// Additional package roots consulted by the resolver, in order
    #[serde(default)]
    pub search: Vec<PathBuf>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build directory relative to the package root (default: "build")
    pub directory: Option<String>,
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
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.paths.local_packages.is_some() {
            self.paths.local_packages = other.paths.local_packages;
        }
        if other.paths.release_packages.is_some() {
            self.paths.release_packages = other.paths.release_packages;
        }
        if !other.paths.search.is_empty() {
            self.paths.search = other.paths.search;
        }
        if other.build.directory.is_some() {
            self.build.directory = other.build.directory;
        }
    }

    /// The path local (non-released) package installs go to.
    ///
    /// `None` only when unconfigured and the home directory cannot be
    /// determined.
    pub fn local_packages_path(&self) -> Option<PathBuf> {
        self.paths
            .local_packages
            .clone()
            .or_else(|| global_config_dir().map(|dir| dir.join("packages")))
    }

    /// The path released packages go to.
    pub fn release_packages_path(&self) -> Option<PathBuf> {
        self.paths
            .release_packages
            .clone()
            .or_else(|| global_config_dir().map(|dir| dir.join("releases")))
    }

    /// Build directory name, relative to the package root.
    pub fn build_directory(&self) -> &str {
        self.build.directory.as_deref().unwrap_or("build")
    }

    /// Package roots a build resolves against: local installs first, then
    /// releases, then the extra search paths.
    pub fn build_search_paths(&self) -> Option<Vec<PathBuf>> {
        let mut paths = vec![self.local_packages_path()?, self.release_packages_path()?];
        paths.extend(self.paths.search.iter().cloned());
        Some(paths)
    }

    /// Package roots a release resolves against: releases, then the extra
    /// search paths. Local installs are never visible to a release resolve.
    pub fn release_search_paths(&self) -> Option<Vec<PathBuf>> {
        let mut paths = vec![self.release_packages_path()?];
        paths.extend(self.paths.search.iter().cloned());
        Some(paths)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.slipway/config.toml)
/// 2. Global config (~/.slipway/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global slipway config directory (~/.slipway).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".slipway"))
}

/// Get the global config path (~/.slipway/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.slipway/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".slipway").join("config.toml")
}
