//! Test fixtures for common test scenarios.
//!
//! This module provides pre-built project layouts for composition tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::manifest::MANIFEST_NAME;

/// Fixture for a complete project tree.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// Project (root package) name, also its directory name.
    pub name: String,
    /// Files (path relative to project root -> content).
    pub files: BTreeMap<PathBuf, String>,
}

impl ProjectFixture {
    /// Create a project with only a root manifest.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut files = BTreeMap::new();
        files.insert(
            PathBuf::from(MANIFEST_NAME),
            format!("[package]\nname = \"{name}\"\n"),
        );
        ProjectFixture { name, files }
    }

    /// A neuroimaging-style tree.
    ///
    /// ```text
    /// nipy/
    ///   labs/            cstat (LAPACK-conditioned), tests/ without manifest
    ///   algorithms/
    ///     statistics/    intvol, histogram, _quantile
    /// ```
    pub fn nipy_like() -> Self {
        ProjectFixture::new("nipy")
            .with_manifest(
                "",
                r#"[package]
name = "nipy"
subpackages = ["labs", "algorithms"]
"#,
            )
            .with_manifest(
                "labs",
                r#"[package]
name = "labs"
subpackages = ["tests"]

[[library]]
name = "cstat"
sources = ["lib/fff/*.c", "lib/fff_python_wrapper/*.c"]
fallback-sources = ["lib/lapack_lite/*.c"]
lapack = true
include-dirs = ["lib/fff", "lib/fff_python_wrapper"]
"#,
            )
            .with_file("labs/tests/__init__.py", "")
            .with_manifest(
                "algorithms",
                r#"[package]
name = "algorithms"
subpackages = ["statistics"]
"#,
            )
            .with_manifest(
                "algorithms/statistics",
                r#"[package]
name = "statistics"

[[extension]]
name = "intvol"
sources = ["intvol.pyx"]

[[extension]]
name = "histogram"
sources = ["histogram.pyx"]

[[extension]]
name = "_quantile"
sources = ["_quantile.pyx", "quantile.c"]
"#,
            )
    }

    /// Set the manifest of the package in `dir` (relative, "" for the root).
    pub fn with_manifest(self, dir: impl AsRef<Path>, manifest: impl Into<String>) -> Self {
        let path = dir.as_ref().join(MANIFEST_NAME);
        self.with_file(path, manifest)
    }

    /// Add a file.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Write the project under `base_path` and return the project root.
    pub fn write(&self, base_path: &Path) -> PathBuf {
        self.write_to(base_path)
            .expect("failed to write project fixture")
    }

    /// Write the project under `base_path`.
    pub fn write_to(&self, base_path: &Path) -> std::io::Result<PathBuf> {
        let project_path = base_path.join(&self.name);
        std::fs::create_dir_all(&project_path)?;

        for (path, content) in &self.files {
            let full_path = project_path.join(path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, content)?;
        }

        Ok(project_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_nipy_like_layout() {
        let tmp = TempDir::new().unwrap();
        let root = ProjectFixture::nipy_like().write(tmp.path());

        assert_eq!(root, tmp.path().join("nipy"));
        assert!(root.join(MANIFEST_NAME).is_file());
        assert!(root.join("labs").join(MANIFEST_NAME).is_file());
        assert!(root.join("labs/tests").is_dir());
        assert!(!root.join("labs/tests").join(MANIFEST_NAME).exists());
        assert!(root
            .join("algorithms/statistics")
            .join(MANIFEST_NAME)
            .is_file());
    }
}
