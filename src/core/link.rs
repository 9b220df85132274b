//! Link decision and backend linkage metadata.
//!
//! A [`LinkDecision`] says whether native libraries are compiled against an
//! external optimized LAPACK/BLAS backend or against the bundled fallback.
//! [`LibraryInfo`] is the linkage metadata reported for that backend.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a link decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkOrigin {
    /// `[lapack] external` in the setup file
    ConfigFile,
    /// The designated environment variable
    EnvironmentVariable,
    /// Nothing was set
    Default,
}

impl fmt::Display for LinkOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkOrigin::ConfigFile => write!(f, "setup file"),
            LinkOrigin::EnvironmentVariable => write!(f, "environment variable"),
            LinkOrigin::Default => write!(f, "default"),
        }
    }
}

/// Resolved choice between the external backend and the bundled fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDecision {
    /// Link against the external optimized backend
    pub use_external: bool,

    /// Which lookup tier produced the value
    pub origin: LinkOrigin,
}

impl LinkDecision {
    /// The decision used when no tier yields a value.
    pub fn default_internal() -> Self {
        LinkDecision {
            use_external: false,
            origin: LinkOrigin::Default,
        }
    }

    /// Interpret a raw setting value.
    ///
    /// `"0"` and `"false"` (any case) mean internal linking. Every other
    /// value, malformed ones included, means external linking.
    pub fn from_value(value: &str, origin: LinkOrigin) -> Self {
        let value = value.trim().to_ascii_lowercase();
        LinkDecision {
            use_external: value != "0" && value != "false",
            origin,
        }
    }
}

/// Metadata profile requested from a library metadata source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkProfile {
    /// Optimized backend (`lapack_opt`)
    Optimized,
    /// Plain reference backend (`lapack`)
    Plain,
}

impl LinkProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkProfile::Optimized => "lapack_opt",
            LinkProfile::Plain => "lapack",
        }
    }
}

impl fmt::Display for LinkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Linkage metadata for an installed backend.
///
/// An empty value means the backend was not found. That is a valid state
/// unless external linking was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryInfo {
    /// Library search directories (-L)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub library_dirs: Vec<PathBuf>,

    /// Library names (-l)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<String>,

    /// Header directories (-I)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_dirs: Vec<PathBuf>,

    /// Preprocessor defines reported alongside the libraries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub define_macros: Vec<(String, Option<String>)>,

    /// Name of the metadata package that supplied this profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LibraryInfo {
    /// Create metadata for the given libraries.
    pub fn with_libraries(libraries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        LibraryInfo {
            libraries: libraries.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the library search directories.
    pub fn with_library_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.library_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the header directories.
    pub fn with_include_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.include_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Record which metadata package supplied this profile.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// True if the profile carries any linkage information.
    pub fn is_present(&self) -> bool {
        !self.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.library_dirs.is_empty()
            && self.libraries.is_empty()
            && self.include_dirs.is_empty()
            && self.define_macros.is_empty()
    }

    /// True if the profile names at least one library.
    pub fn has_libraries(&self) -> bool {
        !self.libraries.is_empty()
    }
}

impl fmt::Display for LibraryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{{}}");
        }
        write!(
            f,
            "{{libraries: {:?}, library_dirs: {:?}, include_dirs: {:?}",
            self.libraries, self.library_dirs, self.include_dirs
        )?;
        if !self.define_macros.is_empty() {
            write!(f, ", define_macros: {:?}", self.define_macros)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ", source: {}", source)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_false_spellings() {
        for value in ["0", "false", "False", "FALSE", " false "] {
            let decision = LinkDecision::from_value(value, LinkOrigin::EnvironmentVariable);
            assert!(!decision.use_external, "{value:?} should mean internal");
        }
    }

    #[test]
    fn test_from_value_anything_else_is_true() {
        for value in ["1", "true", "yes", "no", "off", "garbage"] {
            let decision = LinkDecision::from_value(value, LinkOrigin::ConfigFile);
            assert!(decision.use_external, "{value:?} should mean external");
            assert_eq!(decision.origin, LinkOrigin::ConfigFile);
        }
    }

    #[test]
    fn test_library_info_presence() {
        assert!(!LibraryInfo::default().is_present());

        let info = LibraryInfo::default().with_include_dirs(["/opt/include"]);
        assert!(info.is_present());
        assert!(!info.has_libraries());

        let info = LibraryInfo::with_libraries(["blas", "lapack"]);
        assert!(info.is_present());
        assert!(info.has_libraries());
    }

    #[test]
    fn test_library_info_display() {
        assert_eq!(LibraryInfo::default().to_string(), "{}");

        let info = LibraryInfo::with_libraries(["openblas"]).with_source("openblas");
        let text = info.to_string();
        assert!(text.contains("\"openblas\""));
        assert!(text.contains("source: openblas"));
    }
}
