//! Target definitions - what the external build tool compiles.
//!
//! A [`NativeLibraryTarget`] is a named unit of C sources plus link
//! metadata. An [`ExtensionTarget`] is a compiled module exposed to
//! higher-level code, optionally linking one of the native libraries.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::link::LibraryInfo;

/// The kind of target, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Native library (compiled C sources)
    Library,

    /// Extension module
    Extension,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Library => write!(f, "library"),
            TargetKind::Extension => write!(f, "extension"),
        }
    }
}

/// Ordered path-or-glob entries for a native library.
///
/// Fallback sources always follow the wrapper sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceSet(Vec<PathBuf>);

impl SourceSet {
    pub fn new() -> Self {
        SourceSet(Vec::new())
    }

    /// Build a source set from entries resolved against `base`.
    pub fn from_patterns(base: &Path, patterns: &[String]) -> Self {
        let mut set = SourceSet::new();
        set.extend_from(base, patterns);
        set
    }

    /// Append entries resolved against `base`.
    pub fn extend_from(&mut self, base: &Path, patterns: &[String]) {
        self.0.extend(patterns.iter().map(|p| base.join(p)));
    }

    pub fn push(&mut self, entry: impl Into<PathBuf>) {
        self.0.push(entry.into());
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn contains(&self, entry: &Path) -> bool {
        self.0.iter().any(|e| e == entry)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for SourceSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        SourceSet(iter.into_iter().map(Into::into).collect())
    }
}

/// Link metadata attached to a native library at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSettings {
    pub library_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub include_dirs: Vec<PathBuf>,
    pub extra_info: LibraryInfo,
}

/// A native library target with its link metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeLibraryTarget {
    /// Library name
    pub name: String,

    /// Sources: wrapper sources, then fallback sources if linking internally
    pub sources: SourceSet,

    /// Library search directories for the external backend
    #[serde(default)]
    pub library_dirs: Vec<PathBuf>,

    /// Libraries to link from the external backend
    #[serde(default)]
    pub libraries: Vec<String>,

    /// Include directories needed to compile the library
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// Full backend metadata, passed through to the build tool
    #[serde(default)]
    pub extra_info: LibraryInfo,
}

impl NativeLibraryTarget {
    /// True if this library links an external backend.
    pub fn links_external(&self) -> bool {
        !self.libraries.is_empty()
    }
}

/// An extension module target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionTarget {
    /// Extension module name
    pub name: String,

    /// Interface source, optionally followed by implementation sources
    pub sources: Vec<PathBuf>,

    /// Include directories (array interface headers come first)
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// Native library this extension links, by name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
}

impl ExtensionTarget {
    /// The binding-layer source.
    pub fn interface_source(&self) -> Option<&Path> {
        self.sources.first().map(PathBuf::as_path)
    }

    /// Separately compiled implementation sources.
    pub fn implementation_sources(&self) -> &[PathBuf] {
        self.sources.get(1..).unwrap_or(&[])
    }
}
