//! Composition of the subpackage configuration tree.
//!
//! Every subpackage exposes the same [`ConfigureSubpackage`] capability.
//! The composer asks a [`SubpackageResolver`] for each declared child,
//! configures it depth-first in declaration order, and stops at the first
//! failure. No partial tree is ever returned.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::manifest::{Manifest, MANIFEST_NAME};
use crate::core::subpackage::{qualify, Configuration, SubpackageNode};
use crate::core::target::{LinkSettings, SourceSet, TargetKind};
use crate::ops::assemble::BundledSources;
use crate::ops::errors::ConfigureError;
use crate::ops::session::ConfigureSession;

/// The uniform "configure me" entry point of a subpackage.
pub trait ConfigureSubpackage {
    /// Configure this subpackage as a child of `parent_package`, whose
    /// directory is `parent_path`.
    fn configure(
        &self,
        parent_package: &str,
        parent_path: &Path,
        session: &ConfigureSession<'_>,
    ) -> Result<SubpackageNode, ConfigureError>;
}

impl<F> ConfigureSubpackage for F
where
    F: Fn(&str, &Path, &ConfigureSession<'_>) -> Result<SubpackageNode, ConfigureError>,
{
    fn configure(
        &self,
        parent_package: &str,
        parent_path: &Path,
        session: &ConfigureSession<'_>,
    ) -> Result<SubpackageNode, ConfigureError> {
        self(parent_package, parent_path, session)
    }
}

/// Finds the configure capability for a child subpackage.
pub trait SubpackageResolver {
    fn subpackage(
        &self,
        parent_package: &str,
        name: &str,
    ) -> Option<Box<dyn ConfigureSubpackage + '_>>;
}

/// Compose `config` and its declared children into a tree node.
pub fn compose(
    config: Configuration,
    session: &ConfigureSession<'_>,
    resolver: &dyn SubpackageResolver,
) -> Result<SubpackageNode, ConfigureError> {
    let parent_package = config.qualified_name();
    let mut children = Vec::with_capacity(config.subpackages().len());

    for name in config.subpackages() {
        let child_package = qualify(&parent_package, name);
        let wrap = |source: ConfigureError| ConfigureError::ChildComposition {
            child: child_package.clone(),
            source: Box::new(source),
        };

        let child = resolver
            .subpackage(&parent_package, name)
            .ok_or_else(|| {
                wrap(ConfigureError::UnknownSubpackage {
                    package: child_package.clone(),
                })
            })?;

        tracing::debug!("configuring subpackage `{}`", child_package);
        let node = child
            .configure(&parent_package, config.path(), session)
            .map_err(wrap)?;

        if node.parent_path != config.path() || node.package != child_package {
            return Err(wrap(ConfigureError::MisplacedSubpackage {
                package: node.package.clone(),
                expected: config.path().to_path_buf(),
                found: node.parent_path.clone(),
            }));
        }

        children.push(node);
    }

    Ok(config.into_node(children))
}

/// Subpackage configured from the `Extconf.toml` in its directory.
///
/// A directory without a manifest is an empty subpackage.
#[derive(Debug, Clone)]
pub struct ManifestSubpackage {
    name: String,
}

impl ManifestSubpackage {
    pub fn new(name: impl Into<String>) -> Self {
        ManifestSubpackage { name: name.into() }
    }
}

impl ConfigureSubpackage for ManifestSubpackage {
    fn configure(
        &self,
        parent_package: &str,
        parent_path: &Path,
        session: &ConfigureSession<'_>,
    ) -> Result<SubpackageNode, ConfigureError> {
        let config = Configuration::new(&self.name, parent_package, parent_path)
            .with_array_include_dirs(session.array_include_dirs().iter().cloned());

        let manifest_path = config.path().join(MANIFEST_NAME);
        if !manifest_path.is_file() {
            tracing::debug!(
                "no manifest for `{}`, treating it as empty",
                config.qualified_name()
            );
            return compose(config, session, &ManifestResolver);
        }

        let manifest = Manifest::load(&manifest_path)?;
        if manifest.name() != self.name {
            return Err(ConfigureError::Manifest {
                path: manifest_path,
                message: format!(
                    "package name `{}` does not match directory `{}`",
                    manifest.name(),
                    self.name
                ),
            });
        }

        let config = apply_manifest(config, &manifest, session)?;
        compose(config, session, &ManifestResolver)
    }
}

/// Resolves every child to its directory's manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestResolver;

impl SubpackageResolver for ManifestResolver {
    fn subpackage(
        &self,
        _parent_package: &str,
        name: &str,
    ) -> Option<Box<dyn ConfigureSubpackage + '_>> {
        Some(Box::new(ManifestSubpackage::new(name)))
    }
}

/// Resolves children from a fixed table keyed by dotted package name.
#[derive(Default)]
pub struct TableResolver<'a> {
    entries: HashMap<String, Box<dyn ConfigureSubpackage + 'a>>,
}

impl<'a> TableResolver<'a> {
    pub fn new() -> Self {
        TableResolver {
            entries: HashMap::new(),
        }
    }

    /// Register the capability for the subpackage named `package`.
    pub fn insert(&mut self, package: impl Into<String>, sub: impl ConfigureSubpackage + 'a) {
        self.entries.insert(package.into(), Box::new(sub));
    }
}

impl SubpackageResolver for TableResolver<'_> {
    fn subpackage(
        &self,
        parent_package: &str,
        name: &str,
    ) -> Option<Box<dyn ConfigureSubpackage + '_>> {
        let sub = self.entries.get(&qualify(parent_package, name))?;
        Some(Box::new(Borrowed(sub.as_ref())))
    }
}

struct Borrowed<'b>(&'b dyn ConfigureSubpackage);

impl ConfigureSubpackage for Borrowed<'_> {
    fn configure(
        &self,
        parent_package: &str,
        parent_path: &Path,
        session: &ConfigureSession<'_>,
    ) -> Result<SubpackageNode, ConfigureError> {
        self.0.configure(parent_package, parent_path, session)
    }
}

/// Register a manifest's targets and children on `config`.
pub fn apply_manifest(
    mut config: Configuration,
    manifest: &Manifest,
    session: &ConfigureSession<'_>,
) -> Result<Configuration, ConfigureError> {
    config.add_include_dirs(&manifest.package.include_dirs);

    for lib in &manifest.libraries {
        let own_include_dirs: Vec<PathBuf> = lib
            .include_dirs
            .iter()
            .map(|dir| config.path().join(dir))
            .collect();

        let (sources, mut link) = if lib.lapack {
            let assembled = session.assemble(BundledSources {
                base: config.path(),
                wrapper: &lib.sources,
                fallback: &lib.fallback_sources,
            })?;
            (assembled.sources, assembled.link)
        } else {
            if !lib.fallback_sources.is_empty() {
                return Err(ConfigureError::InvalidTarget {
                    package: config.qualified_name(),
                    kind: TargetKind::Library,
                    name: lib.name.clone(),
                    reason: "fallback-sources requires `lapack = true`".to_string(),
                });
            }
            (
                SourceSet::from_patterns(config.path(), &lib.sources),
                LinkSettings::default(),
            )
        };

        link.include_dirs = own_include_dirs
            .into_iter()
            .chain(link.include_dirs)
            .collect();
        config.add_library(&lib.name, sources, link)?;
    }

    for ext in &manifest.extensions {
        config.add_extension(
            &ext.name,
            ext.sources.iter().map(PathBuf::from).collect(),
            ext.include_dirs.iter().map(PathBuf::from).collect(),
            ext.library.clone(),
        )?;
    }

    for child in &manifest.package.subpackages {
        config.add_subpackage(child);
    }

    Ok(config)
}

/// Configure the whole tree rooted at the manifest at `manifest_path`.
pub fn configure_root(
    manifest_path: &Path,
    session: &ConfigureSession<'_>,
) -> Result<SubpackageNode, ConfigureError> {
    let manifest = Manifest::load(manifest_path)?;
    let config = Configuration::root(manifest.name(), manifest.manifest_dir.clone())
        .with_array_include_dirs(session.array_include_dirs().iter().cloned());

    let config = apply_manifest(config, &manifest, session)?;
    compose(config, session, &ManifestResolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::link::{LibraryInfo, LinkProfile};
    use crate::ops::link_decision::LinkDecisionResolver;
    use crate::test_support::{MockEnv, MockMetadataSource, ProjectFixture};
    use tempfile::TempDir;

    const VAR: &str = "NIPY_EXTERNAL_LAPACK";

    fn leaf(
        name: &'static str,
    ) -> impl Fn(&str, &Path, &ConfigureSession<'_>) -> Result<SubpackageNode, ConfigureError> {
        move |parent: &str, parent_path: &Path, _session: &ConfigureSession<'_>| {
            Ok(Configuration::new(name, parent, parent_path).into_node(Vec::new()))
        }
    }

    fn duplicate_extensions(
        parent: &str,
        parent_path: &Path,
        session: &ConfigureSession<'_>,
    ) -> Result<SubpackageNode, ConfigureError> {
        let mut config = Configuration::new("bad", parent, parent_path)
            .with_array_include_dirs(session.array_include_dirs().iter().cloned());
        config.add_extension("dup", vec!["a.pyx".into()], Vec::new(), None)?;
        config.add_extension("dup", vec!["b.pyx".into()], Vec::new(), None)?;
        Ok(config.into_node(Vec::new()))
    }

    fn stray(
        parent: &str,
        _parent_path: &Path,
        _session: &ConfigureSession<'_>,
    ) -> Result<SubpackageNode, ConfigureError> {
        Ok(Configuration::new("stray", parent, "/elsewhere").into_node(Vec::new()))
    }

    #[test]
    fn test_three_children_in_order() {
        let tmp = TempDir::new().unwrap();
        let env = MockEnv::new();
        let source = MockMetadataSource::new();
        let resolver = LinkDecisionResolver::new(tmp.path().join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source);

        let mut table = TableResolver::new();
        table.insert("nipy.glm", leaf("glm"));
        table.insert("nipy.group", leaf("group"));
        table.insert("nipy.utils", leaf("utils"));

        let mut root = Configuration::root("nipy", "/src/nipy");
        for name in ["glm", "group", "utils"] {
            root.add_subpackage(name);
        }

        let node = compose(root, &session, &table).unwrap();

        let names: Vec<_> = node.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["glm", "group", "utils"]);
        for child in &node.children {
            assert_eq!(child.parent_path, PathBuf::from("/src/nipy"));
            assert_eq!(child.path, PathBuf::from("/src/nipy").join(&child.name));
            assert!(child.path.starts_with(&node.path));
        }
        assert_eq!(node.children[1].package, "nipy.group");
    }

    #[test]
    fn test_failing_child_aborts() {
        let tmp = TempDir::new().unwrap();
        let env = MockEnv::new();
        let source = MockMetadataSource::new();
        let resolver = LinkDecisionResolver::new(tmp.path().join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source)
            .with_array_include_dirs(vec![PathBuf::from("/numpy/include")]);

        let mut table = TableResolver::new();
        table.insert("nipy.glm", leaf("glm"));
        table.insert("nipy.bad", duplicate_extensions);

        let mut root = Configuration::root("nipy", "/src/nipy");
        root.add_subpackage("glm");
        root.add_subpackage("bad");

        let err = compose(root, &session, &table).unwrap_err();
        assert_eq!(err.composition_path(), vec!["nipy.bad"]);
        assert!(matches!(
            err.root_cause(),
            ConfigureError::DuplicateTargetName { .. }
        ));
    }

    #[test]
    fn test_unknown_child() {
        let tmp = TempDir::new().unwrap();
        let env = MockEnv::new();
        let source = MockMetadataSource::new();
        let resolver = LinkDecisionResolver::new(tmp.path().join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source);

        let mut root = Configuration::root("nipy", "/src/nipy");
        root.add_subpackage("missing");

        let err = compose(root, &session, &TableResolver::new()).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ConfigureError::UnknownSubpackage { .. }
        ));
    }

    #[test]
    fn test_child_with_wrong_parent_path_rejected() {
        let tmp = TempDir::new().unwrap();
        let env = MockEnv::new();
        let source = MockMetadataSource::new();
        let resolver = LinkDecisionResolver::new(tmp.path().join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source);

        let mut table = TableResolver::new();
        table.insert("nipy.stray", stray);

        let mut root = Configuration::root("nipy", "/src/nipy");
        root.add_subpackage("stray");

        let err = compose(root, &session, &table).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ConfigureError::MisplacedSubpackage { .. }
        ));
    }

    #[test]
    fn test_manifest_tree_internal() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::nipy_like().write(tmp.path());

        let env = MockEnv::new();
        let source = MockMetadataSource::new();
        let resolver = LinkDecisionResolver::new(project.join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source)
            .with_array_include_dirs(vec![PathBuf::from("/numpy/include")]);

        let root = configure_root(&project.join(MANIFEST_NAME), &session).unwrap();

        assert_eq!(root.package, "nipy");
        let labs = root.find("nipy.labs").unwrap();
        let cstat = labs.library("cstat").unwrap();
        assert_eq!(cstat.sources.len(), 3);
        assert_eq!(
            cstat.sources.entries()[2],
            project.join("labs").join("lib/lapack_lite/*.c")
        );
        assert!(cstat.libraries.is_empty());

        // `tests` has no manifest: empty node
        let tests = root.find("nipy.labs.tests").unwrap();
        assert!(tests.libraries.is_empty() && tests.extensions.is_empty());

        let stats = root.find("nipy.algorithms.statistics").unwrap();
        let quantile = stats.extension("_quantile").unwrap();
        assert_eq!(quantile.include_dirs[0], PathBuf::from("/numpy/include"));
        assert_eq!(quantile.implementation_sources().len(), 1);

        assert!(source.queries().is_empty());
    }

    #[test]
    fn test_manifest_tree_external() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::nipy_like().write(tmp.path());

        let env = MockEnv::new().with(VAR, "1");
        let source = MockMetadataSource::new().with_profile(
            LinkProfile::Optimized,
            LibraryInfo::with_libraries(["blas", "lapack"])
                .with_library_dirs(["/usr/lib"])
                .with_include_dirs(["/usr/include/lapack"]),
        );
        let resolver = LinkDecisionResolver::new(project.join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source)
            .with_array_include_dirs(vec![PathBuf::from("/numpy/include")]);

        let root = configure_root(&project.join(MANIFEST_NAME), &session).unwrap();
        let cstat = root.find("nipy.labs").unwrap().library("cstat").unwrap();

        assert_eq!(cstat.libraries, vec!["blas", "lapack"]);
        assert_eq!(cstat.sources.len(), 2);
        assert!(cstat
            .include_dirs
            .contains(&PathBuf::from("/usr/include/lapack")));
    }

    #[test]
    fn test_manifest_tree_external_missing_backend() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::nipy_like().write(tmp.path());
        std::fs::write(project.join("setup.cfg"), "[lapack]\nexternal = true\n").unwrap();

        let env = MockEnv::new();
        let source = MockMetadataSource::new();
        let resolver = LinkDecisionResolver::new(project.join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source)
            .with_array_include_dirs(vec![PathBuf::from("/numpy/include")]);

        let err = configure_root(&project.join(MANIFEST_NAME), &session).unwrap_err();
        assert_eq!(err.composition_path(), vec!["nipy.labs"]);
        assert!(matches!(
            err.root_cause(),
            ConfigureError::ExternalBackendUnavailable { .. }
        ));
    }

    #[test]
    fn test_manifest_name_must_match_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(MANIFEST_NAME),
            "[package]\nname = \"root\"\nsubpackages = [\"child\"]\n",
        )
        .unwrap();
        std::fs::create_dir(tmp.path().join("child")).unwrap();
        std::fs::write(
            tmp.path().join("child").join(MANIFEST_NAME),
            "[package]\nname = \"other\"\n",
        )
        .unwrap();

        let env = MockEnv::new();
        let source = MockMetadataSource::new();
        let resolver = LinkDecisionResolver::new(tmp.path().join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source);

        let err = configure_root(&tmp.path().join(MANIFEST_NAME), &session).unwrap_err();
        assert!(matches!(err.root_cause(), ConfigureError::Manifest { .. }));
    }

    #[test]
    fn test_fallback_without_lapack_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(MANIFEST_NAME),
            r#"
[package]
name = "root"

[[library]]
name = "plain"
sources = ["src/*.c"]
fallback-sources = ["lite/*.c"]
"#,
        )
        .unwrap();

        let env = MockEnv::new();
        let source = MockMetadataSource::new();
        let resolver = LinkDecisionResolver::new(tmp.path().join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source);

        let err = configure_root(&tmp.path().join(MANIFEST_NAME), &session).unwrap_err();
        assert!(matches!(err, ConfigureError::InvalidTarget { .. }));
    }

    #[test]
    fn test_child_extension_links_enclosing_library() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new("nipy")
            .with_manifest(
                "",
                r#"[package]
name = "nipy"
subpackages = ["labs"]

[[library]]
name = "cstat"
sources = ["lib/fff/*.c"]
"#,
            )
            .with_manifest(
                "labs",
                r#"[package]
name = "labs"

[[extension]]
name = "linalg"
sources = ["linalg.pyx"]
library = "cstat"
"#,
            )
            .write(tmp.path());

        let env = MockEnv::new();
        let source = MockMetadataSource::new();
        let resolver = LinkDecisionResolver::new(project.join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source)
            .with_array_include_dirs(vec![PathBuf::from("/numpy/include")]);

        let root = configure_root(&project.join(MANIFEST_NAME), &session).unwrap();

        assert!(root.library("cstat").is_some());
        let labs = root.find("nipy.labs").unwrap();
        assert!(labs.libraries.is_empty());
        assert_eq!(
            labs.extension("linalg").unwrap().library.as_deref(),
            Some("cstat")
        );
    }

    #[test]
    fn test_extension_without_array_headers_fails() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::nipy_like().write(tmp.path());

        let env = MockEnv::new();
        let source = MockMetadataSource::new();
        let resolver = LinkDecisionResolver::new(project.join("setup.cfg"), VAR, &env);
        let session = ConfigureSession::new(resolver, &source);

        let err = configure_root(&project.join(MANIFEST_NAME), &session).unwrap_err();
        assert_eq!(
            err.composition_path(),
            vec!["nipy.algorithms", "nipy.algorithms.statistics"]
        );
        match err.root_cause() {
            ConfigureError::MissingArrayHeaders { package, name } => {
                assert_eq!(package, "nipy.algorithms.statistics");
                assert_eq!(name, "intvol");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
