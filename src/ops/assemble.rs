//! Assembly of native library sources and link settings.
//!
//! Internal linking compiles the bundled fallback sources after the wrapper
//! sources and links nothing extra. External linking compiles only the
//! wrapper sources and takes library and include directories from the probe
//! result, which must then be present.

use std::path::Path;

use crate::core::link::{LibraryInfo, LinkDecision};
use crate::core::target::{LinkSettings, SourceSet};
use crate::ops::errors::ConfigureError;

/// Source patterns of a library conditioned on the link decision.
#[derive(Debug, Clone, Copy)]
pub struct BundledSources<'a> {
    /// Directory the patterns are relative to
    pub base: &'a Path,

    /// Wrapper sources, always compiled
    pub wrapper: &'a [String],

    /// Fallback implementation sources, compiled only when linking internally
    pub fallback: &'a [String],
}

/// Names shown to the operator when a decision needs explaining.
#[derive(Debug, Clone, Copy)]
pub struct DecisionSources<'a> {
    pub env_var: &'a str,
    pub setup_file: &'a Path,
}

/// Result of assembly: the source set plus link settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledSources {
    pub sources: SourceSet,
    pub link: LinkSettings,
}

/// Choose sources and link settings for a library.
///
/// `info` is `None` when the decision is internal and no probe ran.
pub fn assemble(
    decision: &LinkDecision,
    info: Option<&LibraryInfo>,
    bundled: BundledSources<'_>,
    names: DecisionSources<'_>,
) -> Result<AssembledSources, ConfigureError> {
    let mut sources = SourceSet::from_patterns(bundled.base, bundled.wrapper);

    let link = if decision.use_external {
        let info = match info {
            Some(info) if info.is_present() => info,
            _ => {
                return Err(ConfigureError::ExternalBackendUnavailable {
                    env_var: names.env_var.to_string(),
                    setup_file: names.setup_file.display().to_string(),
                })
            }
        };

        tracing::info!("Linking with system LAPACK");
        LinkSettings {
            library_dirs: info.library_dirs.clone(),
            libraries: info.libraries.clone(),
            include_dirs: info.include_dirs.clone(),
            extra_info: info.clone(),
        }
    } else {
        tracing::warn!(
            "Building with (slow) LAPACK lite distribution: set {} or use {} to enable linking to an optimized BLAS/LAPACK",
            names.env_var,
            names.setup_file.display()
        );
        sources.extend_from(bundled.base, bundled.fallback);
        LinkSettings {
            extra_info: info.cloned().unwrap_or_default(),
            ..Default::default()
        }
    };

    tracing::info!("LAPACK build options:");
    tracing::info!("library_dirs: {:?}", link.library_dirs);
    tracing::info!("libraries: {:?}", link.libraries);
    tracing::info!("lapack_info: {}", link.extra_info);

    Ok(AssembledSources { sources, link })
}
