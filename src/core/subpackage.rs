//! Subpackage configurations and the composed configuration tree.
//!
//! A [`Configuration`] collects the targets one subpackage declares; it
//! owns the library and extension registrars. Once its children are
//! configured it is frozen into a [`SubpackageNode`], the read-only value
//! handed to the external build tool.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::link::LibraryInfo;
use crate::core::target::{ExtensionTarget, LinkSettings, NativeLibraryTarget, SourceSet, TargetKind};
use crate::ops::errors::ConfigureError;

/// Targets declared by one subpackage, before composition.
#[derive(Debug, Clone)]
pub struct Configuration {
    name: String,
    parent_package: String,
    parent_path: PathBuf,
    path: PathBuf,
    include_dirs: Vec<PathBuf>,
    array_include_dirs: Vec<PathBuf>,
    libraries: Vec<NativeLibraryTarget>,
    extensions: Vec<ExtensionTarget>,
    subpackages: Vec<String>,
}

impl Configuration {
    /// Configuration for subpackage `name` living in `parent_path/name`.
    pub fn new(
        name: impl Into<String>,
        parent_package: impl Into<String>,
        parent_path: impl Into<PathBuf>,
    ) -> Self {
        let name = name.into();
        let parent_path = parent_path.into();
        let path = parent_path.join(&name);
        Configuration {
            name,
            parent_package: parent_package.into(),
            parent_path,
            path,
            include_dirs: Vec::new(),
            array_include_dirs: Vec::new(),
            libraries: Vec::new(),
            extensions: Vec::new(),
            subpackages: Vec::new(),
        }
    }

    /// Root configuration whose package directory is `dir`.
    pub fn root(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let parent_path = dir.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut config = Configuration::new(name, "", parent_path);
        config.path = dir;
        config
    }

    /// Set the array-interface include directories every extension needs.
    pub fn with_array_include_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.array_include_dirs = dirs.into_iter().collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted name including all ancestors (e.g. `nipy.labs.glm`).
    pub fn qualified_name(&self) -> String {
        qualify(&self.parent_package, &self.name)
    }

    /// The package directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parent_path(&self) -> &Path {
        &self.parent_path
    }

    pub fn array_include_dirs(&self) -> &[PathBuf] {
        &self.array_include_dirs
    }

    pub fn libraries(&self) -> &[NativeLibraryTarget] {
        &self.libraries
    }

    pub fn extensions(&self) -> &[ExtensionTarget] {
        &self.extensions
    }

    pub fn subpackages(&self) -> &[String] {
        &self.subpackages
    }

    /// Add include directories shared by the package's targets.
    ///
    /// Relative entries resolve against the package directory.
    pub fn add_include_dirs(&mut self, dirs: impl IntoIterator<Item = impl AsRef<Path>>) {
        for dir in dirs {
            let dir = self.path.join(dir);
            push_unique(&mut self.include_dirs, dir);
        }
    }

    /// Declare a child subpackage, configured later by the composer.
    pub fn add_subpackage(&mut self, name: impl Into<String>) {
        self.subpackages.push(name.into());
    }

    /// Register a native library target from assembled link settings.
    pub fn add_library(
        &mut self,
        name: impl Into<String>,
        sources: SourceSet,
        link: LinkSettings,
    ) -> Result<&NativeLibraryTarget, ConfigureError> {
        self.register_library(
            name,
            sources,
            link.library_dirs,
            link.libraries,
            link.include_dirs,
            link.extra_info,
        )
    }

    /// Register a native library target.
    ///
    /// Include directories start with the package's shared directories,
    /// followed by `include_dirs`.
    pub fn register_library(
        &mut self,
        name: impl Into<String>,
        sources: SourceSet,
        library_dirs: Vec<PathBuf>,
        libraries: Vec<String>,
        include_dirs: Vec<PathBuf>,
        extra_info: LibraryInfo,
    ) -> Result<&NativeLibraryTarget, ConfigureError> {
        let name = name.into();
        if name.is_empty() {
            return Err(self.invalid(TargetKind::Library, &name, "name must not be empty"));
        }
        if sources.is_empty() {
            return Err(self.invalid(TargetKind::Library, &name, "no sources"));
        }
        if self.libraries.iter().any(|l| l.name == name) {
            return Err(self.duplicate(TargetKind::Library, name));
        }

        let include_dirs = merge_dirs(&self.include_dirs, include_dirs);

        tracing::debug!(
            "registered library `{}` in `{}` ({} source entries)",
            name,
            self.qualified_name(),
            sources.len()
        );

        let index = self.libraries.len();
        self.libraries.push(NativeLibraryTarget {
            name,
            sources,
            library_dirs,
            libraries,
            include_dirs,
            extra_info,
        });
        Ok(&self.libraries[index])
    }

    /// Register an extension module.
    ///
    /// Include directories start with the array-interface directories,
    /// followed by the package's shared directories and `include_dirs`.
    /// `library` is passed through by name; the build tool resolves it,
    /// so it may name a library of an ancestor package.
    pub fn add_extension(
        &mut self,
        name: impl Into<String>,
        sources: Vec<PathBuf>,
        include_dirs: Vec<PathBuf>,
        library: Option<String>,
    ) -> Result<&ExtensionTarget, ConfigureError> {
        let name = name.into();
        if name.is_empty() {
            return Err(self.invalid(TargetKind::Extension, &name, "name must not be empty"));
        }
        if sources.is_empty() {
            return Err(self.invalid(TargetKind::Extension, &name, "no sources"));
        }
        if self.extensions.iter().any(|e| e.name == name) {
            return Err(self.duplicate(TargetKind::Extension, name));
        }
        if self.array_include_dirs.is_empty() {
            return Err(ConfigureError::MissingArrayHeaders {
                package: self.qualified_name(),
                name,
            });
        }

        let own_dirs = include_dirs.into_iter().map(|d| self.path.join(d)).collect();
        let dirs = merge_dirs(&self.extension_prefix_dirs(), own_dirs);

        let sources = sources.into_iter().map(|s| self.path.join(s)).collect();

        let index = self.extensions.len();
        self.extensions.push(ExtensionTarget {
            name,
            sources,
            include_dirs: dirs,
            library,
        });
        Ok(&self.extensions[index])
    }

    /// Freeze into a tree node with the given, already configured, children.
    ///
    /// Package include directories added after a target was registered are
    /// merged into that target here, ahead of its own directories.
    pub fn into_node(self, children: Vec<SubpackageNode>) -> SubpackageNode {
        let package = self.qualified_name();
        let extension_prefix = self.extension_prefix_dirs();

        let libraries = self
            .libraries
            .into_iter()
            .map(|mut lib| {
                lib.include_dirs = merge_dirs(&self.include_dirs, lib.include_dirs);
                lib
            })
            .collect();
        let extensions = self
            .extensions
            .into_iter()
            .map(|mut ext| {
                ext.include_dirs = merge_dirs(&extension_prefix, ext.include_dirs);
                ext
            })
            .collect();

        SubpackageNode {
            name: self.name,
            package,
            parent_path: self.parent_path,
            path: self.path,
            include_dirs: self.include_dirs,
            libraries,
            extensions,
            children,
        }
    }

    fn extension_prefix_dirs(&self) -> Vec<PathBuf> {
        merge_dirs(&self.array_include_dirs, self.include_dirs.clone())
    }

    fn duplicate(&self, kind: TargetKind, name: String) -> ConfigureError {
        ConfigureError::DuplicateTargetName {
            package: self.qualified_name(),
            kind,
            name,
        }
    }

    fn invalid(&self, kind: TargetKind, name: &str, reason: &str) -> ConfigureError {
        ConfigureError::InvalidTarget {
            package: self.qualified_name(),
            kind,
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// One level of the composed configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubpackageNode {
    /// Subpackage name
    pub name: String,

    /// Dotted name including ancestors
    pub package: String,

    /// Directory of the parent package
    pub parent_path: PathBuf,

    /// Package directory
    pub path: PathBuf,

    pub include_dirs: Vec<PathBuf>,

    pub libraries: Vec<NativeLibraryTarget>,

    pub extensions: Vec<ExtensionTarget>,

    /// Child subpackages in declaration order
    #[serde(rename = "subpackages")]
    pub children: Vec<SubpackageNode>,
}

impl SubpackageNode {
    /// Convert to the plain mapping consumed by the build tool.
    pub fn to_mapping(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Depth-first, pre-order traversal of the tree.
    pub fn walk(&self) -> Vec<&SubpackageNode> {
        let mut nodes = vec![self];
        for child in &self.children {
            nodes.extend(child.walk());
        }
        nodes
    }

    /// Find a node by dotted package name.
    pub fn find(&self, package: &str) -> Option<&SubpackageNode> {
        self.walk().into_iter().find(|n| n.package == package)
    }

    pub fn child(&self, name: &str) -> Option<&SubpackageNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn library(&self, name: &str) -> Option<&NativeLibraryTarget> {
        self.libraries.iter().find(|l| l.name == name)
    }

    pub fn extension(&self, name: &str) -> Option<&ExtensionTarget> {
        self.extensions.iter().find(|e| e.name == name)
    }
}

/// Join a parent package name and a child name with a dot.
pub fn qualify(parent_package: &str, name: &str) -> String {
    if parent_package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent_package, name)
    }
}

/// `prefix` followed by `dirs`, first occurrence kept.
fn merge_dirs(prefix: &[PathBuf], dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut merged = prefix.to_vec();
    for dir in dirs {
        push_unique(&mut merged, dir);
    }
    merged
}

fn push_unique(dirs: &mut Vec<PathBuf>, dir: PathBuf) {
    if !dirs.contains(&dir) {
        dirs.push(dir);
    }
}
