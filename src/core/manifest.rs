//! Extconf.toml manifest parsing and schema.
//!
//! Every package and subpackage directory may carry an `Extconf.toml`
//! declaring its native libraries, extension modules and child subpackages.
//! Paths in a manifest are relative to the directory containing it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ops::errors::ConfigureError;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Extconf.toml";

/// Error locating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{}` in `{}` or any parent directory", MANIFEST_NAME, .dir.display())]
    NotFound { dir: PathBuf },
}

/// Package metadata from the [package] section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PackageSection {
    /// Package name (one path component)
    pub name: String,

    /// Include directories shared by every target of the package
    #[serde(default)]
    pub include_dirs: Vec<String>,

    /// Child subpackages, configured in this order
    #[serde(default)]
    pub subpackages: Vec<String>,
}

/// A `[[library]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LibrarySpec {
    pub name: String,

    /// Wrapper sources, always compiled
    pub sources: Vec<String>,

    /// Bundled fallback sources, compiled only when linking internally
    #[serde(default)]
    pub fallback_sources: Vec<String>,

    /// Whether the library is conditioned on the LAPACK link decision
    #[serde(default)]
    pub lapack: bool,

    #[serde(default)]
    pub include_dirs: Vec<String>,
}

/// An `[[extension]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExtensionSpec {
    pub name: String,

    /// Interface source, optionally followed by implementation sources
    pub sources: Vec<String>,

    #[serde(default)]
    pub include_dirs: Vec<String>,

    /// Native library to link, declared here or by an enclosing package
    #[serde(default)]
    pub library: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    package: PackageSection,

    #[serde(default, rename = "library")]
    libraries: Vec<LibrarySpec>,

    #[serde(default, rename = "extension")]
    extensions: Vec<ExtensionSpec>,
}

/// The parsed Extconf.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub package: PackageSection,

    pub libraries: Vec<LibrarySpec>,

    pub extensions: Vec<ExtensionSpec>,

    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

impl Manifest {
    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigureError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigureError::Manifest {
            path: path.to_path_buf(),
            message: format!("failed to read: {}", e),
        })?;

        let manifest_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::parse(&contents, manifest_dir).map_err(|message| ConfigureError::Manifest {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse manifest contents.
    pub fn parse(contents: &str, manifest_dir: PathBuf) -> Result<Self, String> {
        let raw: RawManifest = toml::from_str(contents).map_err(|e| e.message().to_string())?;

        validate_component("package name", &raw.package.name)?;
        for child in &raw.package.subpackages {
            validate_component("subpackage name", child)?;
        }

        Ok(Manifest {
            package: raw.package,
            libraries: raw.libraries,
            extensions: raw.extensions,
            manifest_dir,
        })
    }

    /// Get the package name.
    pub fn name(&self) -> &str {
        &self.package.name
    }
}

/// Names become directory components and dotted-name segments.
fn validate_component(what: &str, name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{} must not be empty", what));
    }
    if name.contains(['.', '/', '\\']) {
        return Err(format!(
            "{} `{}` must be a single path component without dots",
            what, name
        ));
    }
    Ok(())
}
