//! Global context for extconf operations.
//!
//! Provides centralized access to the working directory, configuration
//! paths, and the process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::manifest::{ManifestError, MANIFEST_NAME};
use crate::util::config::{self, Config};

/// Read access to environment variables.
///
/// Configuration runs read variables through this trait so tests can supply
/// a fixed environment instead of mutating the process one.
pub trait Env {
    /// Look up a variable, `None` if unset or not valid UTF-8.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Env for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            verbose: false,
            color: true,
        }
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Load the merged global and project configuration for `project_root`.
    pub fn load_config(&self, project_root: &Path) -> Config {
        let global = config::global_config_path();
        config::load_config(global.as_deref(), &config::project_config_path(project_root))
    }

    /// Find `Extconf.toml` starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(MANIFEST_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                return Err(ManifestError::NotFound {
                    dir: self.cwd.clone(),
                });
            }
        }
    }
}
