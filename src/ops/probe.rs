//! Probing for an installed optimized LAPACK backend.
//!
//! The probe asks a [`LibraryMetadataSource`] for the optimized profile
//! first, and falls back to the plain profile when the optimized one names
//! no libraries. Platforms disagree on which profile carries the library
//! list, so both are consulted in a fixed order.

use std::collections::HashMap;

use crate::core::link::{LibraryInfo, LinkProfile};
use crate::util::config::ProbeConfig;

/// Something that can report linkage metadata for a profile.
pub trait LibraryMetadataSource {
    /// Metadata for `profile`, empty if nothing is installed.
    fn query(&self, profile: LinkProfile) -> LibraryInfo;
}

/// Queries a metadata source in preference order.
pub struct LibraryInfoProbe<'a> {
    source: &'a dyn LibraryMetadataSource,
}

impl<'a> LibraryInfoProbe<'a> {
    pub fn new(source: &'a dyn LibraryMetadataSource) -> Self {
        LibraryInfoProbe { source }
    }

    pub fn probe(&self) -> LibraryInfo {
        let optimized = self.source.query(LinkProfile::Optimized);
        if optimized.has_libraries() {
            tracing::debug!("{} profile: {}", LinkProfile::Optimized, optimized);
            return optimized;
        }

        let plain = self.source.query(LinkProfile::Plain);
        tracing::debug!(
            "{} profile lists no libraries, {} profile: {}",
            LinkProfile::Optimized,
            LinkProfile::Plain,
            plain
        );
        plain
    }
}

/// Metadata from pkg-config.
///
/// Each profile maps to an ordered list of pkg-config package names; the
/// first one that probes successfully supplies the profile.
#[derive(Debug, Clone)]
pub struct PkgConfigSource {
    optimized: Vec<String>,
    plain: Vec<String>,
}

impl PkgConfigSource {
    pub fn new(optimized: Vec<String>, plain: Vec<String>) -> Self {
        PkgConfigSource { optimized, plain }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.optimized_candidates(), config.plain_candidates())
    }

    fn candidates(&self, profile: LinkProfile) -> &[String] {
        match profile {
            LinkProfile::Optimized => &self.optimized,
            LinkProfile::Plain => &self.plain,
        }
    }
}

impl LibraryMetadataSource for PkgConfigSource {
    fn query(&self, profile: LinkProfile) -> LibraryInfo {
        for package in self.candidates(profile) {
            let result = pkg_config::Config::new()
                .cargo_metadata(false)
                .env_metadata(false)
                .probe(package);

            match result {
                Ok(library) => {
                    tracing::debug!("pkg-config found `{}` for {}", package, profile);
                    return library_info_from_pkg_config(package, &library);
                }
                Err(e) => {
                    tracing::debug!("pkg-config `{}` not usable for {}: {}", package, profile, e);
                }
            }
        }
        LibraryInfo::default()
    }
}

fn library_info_from_pkg_config(package: &str, library: &pkg_config::Library) -> LibraryInfo {
    let mut define_macros: Vec<(String, Option<String>)> = library
        .defines
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    // pkg-config hands defines back in a HashMap
    define_macros.sort();

    LibraryInfo {
        library_dirs: library.link_paths.clone(),
        libraries: library.libs.clone(),
        include_dirs: library.include_paths.clone(),
        define_macros,
        source: Some(package.to_string()),
    }
}

/// Metadata pinned up front, reported for both profiles.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    profiles: HashMap<LinkProfile, LibraryInfo>,
}

impl StaticSource {
    pub fn new() -> Self {
        StaticSource::default()
    }

    /// Report `info` for every profile.
    pub fn all(info: LibraryInfo) -> Self {
        StaticSource::new()
            .with_profile(LinkProfile::Optimized, info.clone())
            .with_profile(LinkProfile::Plain, info)
    }

    pub fn with_profile(mut self, profile: LinkProfile, info: LibraryInfo) -> Self {
        self.profiles.insert(profile, info);
        self
    }
}

impl LibraryMetadataSource for StaticSource {
    fn query(&self, profile: LinkProfile) -> LibraryInfo {
        self.profiles.get(&profile).cloned().unwrap_or_default()
    }
}

/// The metadata source selected by configuration.
pub fn source_from_config(config: &ProbeConfig) -> Box<dyn LibraryMetadataSource> {
    match config.static_info {
        Some(ref pinned) => Box::new(StaticSource::all(pinned.to_library_info())),
        None => Box::new(PkgConfigSource::from_config(config)),
    }
}
