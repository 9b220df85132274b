//! Configuration file support for extconf.
//!
//! extconf reads two configuration file locations:
//! - Global: `~/.extconf/config.toml` - User-wide defaults
//! - Project: `.extconf/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. The link decision
//! itself lives in the project's INI setup file (see
//! [`crate::ops::link_decision`]); this file only says where to look.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::link::LibraryInfo;

/// Default environment variable consulted for the link decision.
pub const DEFAULT_ENV_VAR: &str = "NIPY_EXTERNAL_LAPACK";

/// Default INI setup file name, relative to the project root.
pub const DEFAULT_SETUP_FILE: &str = "setup.cfg";

/// Environment variable appending array-interface include directories.
pub const ARRAY_INCLUDE_ENV: &str = "EXTCONF_ARRAY_INCLUDE";

/// extconf configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Link decision lookup settings
    pub lapack: LapackConfig,

    /// Backend metadata probing
    pub probe: ProbeConfig,

    /// Array-interface headers
    pub array: ArrayConfig,
}

/// Where the link decision is read from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LapackConfig {
    /// Environment variable name (default: NIPY_EXTERNAL_LAPACK)
    pub env_var: Option<String>,

    /// INI setup file, relative to the project root (default: setup.cfg)
    pub setup_file: Option<PathBuf>,
}

impl LapackConfig {
    pub fn env_var(&self) -> &str {
        self.env_var.as_deref().unwrap_or(DEFAULT_ENV_VAR)
    }

    pub fn setup_file(&self) -> &Path {
        self.setup_file
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_SETUP_FILE))
    }
}

/// pkg-config packages tried for each metadata profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProbeConfig {
    /// Candidates for the optimized profile, in order
    pub optimized: Vec<String>,

    /// Candidates for the plain profile, in order
    pub plain: Vec<String>,

    /// Pinned metadata used instead of pkg-config
    #[serde(rename = "static")]
    pub static_info: Option<StaticProbeConfig>,
}

impl ProbeConfig {
    pub fn optimized_candidates(&self) -> Vec<String> {
        if self.optimized.is_empty() {
            vec!["openblas".to_string(), "flexiblas".to_string()]
        } else {
            self.optimized.clone()
        }
    }

    pub fn plain_candidates(&self) -> Vec<String> {
        if self.plain.is_empty() {
            vec!["lapack".to_string(), "blas".to_string()]
        } else {
            self.plain.clone()
        }
    }
}

/// Backend metadata pinned in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StaticProbeConfig {
    pub libraries: Vec<String>,
    pub library_dirs: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
}

impl StaticProbeConfig {
    pub fn to_library_info(&self) -> LibraryInfo {
        LibraryInfo::with_libraries(self.libraries.iter().cloned())
            .with_library_dirs(self.library_dirs.iter().cloned())
            .with_include_dirs(self.include_dirs.iter().cloned())
            .with_source("config")
    }
}

/// Array-interface include directories required by every extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArrayConfig {
    pub include_dirs: Vec<PathBuf>,
}

impl ArrayConfig {
    /// Configured directories followed by those from `EXTCONF_ARRAY_INCLUDE`.
    pub fn resolve_include_dirs(&self, env_value: Option<&str>) -> Vec<PathBuf> {
        let mut dirs = self.include_dirs.clone();
        if let Some(value) = env_value {
            for dir in std::env::split_paths(value) {
                if !dir.as_os_str().is_empty() && !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
        }
        dirs
    }
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
        if other.lapack.env_var.is_some() {
            self.lapack.env_var = other.lapack.env_var;
        }
        if other.lapack.setup_file.is_some() {
            self.lapack.setup_file = other.lapack.setup_file;
        }

        if !other.probe.optimized.is_empty() {
            self.probe.optimized = other.probe.optimized;
        }
        if !other.probe.plain.is_empty() {
            self.probe.plain = other.probe.plain;
        }
        if other.probe.static_info.is_some() {
            self.probe.static_info = other.probe.static_info;
        }

        // Include dirs accumulate: global headers plus project headers
        for dir in other.array.include_dirs {
            if !self.array.include_dirs.contains(&dir) {
                self.array.include_dirs.push(dir);
            }
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.extconf/config.toml)
/// 2. Global config (~/.extconf/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global extconf config directory (~/.extconf).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".extconf"))
}

/// Get the global config path (~/.extconf/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.extconf/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".extconf").join("config.toml")
}
