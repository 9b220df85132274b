//! Build-info record written after a configuration run.
//!
//! Downstream code reads this to report how the package was configured:
//! which link decision was taken, where it came from, and what backend
//! metadata (if any) was probed.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::link::{LibraryInfo, LinkDecision};
use crate::core::subpackage::SubpackageNode;
use crate::ops::session::ConfigureSession;

/// Record of the choices made during a configuration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Dotted name of the root package
    pub package: String,

    pub link_decision: LinkDecision,

    /// Probe result, absent when no probe ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lapack_info: Option<LibraryInfo>,
}

impl BuildInfo {
    /// Collect the record from a finished session.
    ///
    /// Resolves the link decision if no library needed it during the run.
    pub fn collect(session: &ConfigureSession<'_>, root: &SubpackageNode) -> Self {
        BuildInfo {
            package: root.package.clone(),
            link_decision: session.link_decision(),
            lapack_info: session.probed().cloned(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize build info")
    }

    /// Write the record as JSON to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let json = self.to_json()?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write build info to {}", path.display()))?;

        tracing::debug!("wrote build info to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse build info {}", path.display()))
    }
}
