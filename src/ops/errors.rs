//! Configuration error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::target::TargetKind;
use crate::util::diagnostic::Diagnostic;

/// Fatal error during a configuration run.
///
/// Soft lookup misses (absent setup file, section or key) never surface
/// here; the link decision resolver falls through to its next tier instead.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigureError {
    #[error("external optimized backend requested but not found")]
    #[diagnostic(
        code(extconf::link::backend_unavailable),
        help("install an optimized BLAS/LAPACK with pkg-config metadata, or disable external linking")
    )]
    ExternalBackendUnavailable { env_var: String, setup_file: String },

    #[error("duplicate {kind} name `{name}` in subpackage `{package}`")]
    #[diagnostic(code(extconf::target::duplicate))]
    DuplicateTargetName {
        package: String,
        kind: TargetKind,
        name: String,
    },

    #[error("invalid {kind} `{name}` in subpackage `{package}`: {reason}")]
    #[diagnostic(code(extconf::target::invalid))]
    InvalidTarget {
        package: String,
        kind: TargetKind,
        name: String,
        reason: String,
    },

    #[error("extension `{name}` in subpackage `{package}` has no array-interface include directories")]
    #[diagnostic(
        code(extconf::target::missing_array_headers),
        help("set `[array] include-dirs` in .extconf/config.toml or the EXTCONF_ARRAY_INCLUDE variable")
    )]
    MissingArrayHeaders { package: String, name: String },

    #[error("failed to configure subpackage `{child}`")]
    #[diagnostic(code(extconf::compose::child_failed))]
    ChildComposition {
        child: String,
        #[source]
        source: Box<ConfigureError>,
    },

    #[error("subpackage `{package}` is not declared by any resolver")]
    #[diagnostic(code(extconf::compose::unknown_subpackage))]
    UnknownSubpackage { package: String },

    #[error("subpackage `{package}` configured under {}, expected under {}", .found.display(), .expected.display())]
    #[diagnostic(code(extconf::compose::misplaced_subpackage))]
    MisplacedSubpackage {
        package: String,
        expected: PathBuf,
        found: PathBuf,
    },

    #[error("invalid manifest {}: {message}", .path.display())]
    #[diagnostic(code(extconf::manifest::invalid))]
    Manifest { path: PathBuf, message: String },
}

impl ConfigureError {
    /// The innermost error, looking through child composition wrappers.
    pub fn root_cause(&self) -> &ConfigureError {
        let mut current = self;
        while let ConfigureError::ChildComposition { source, .. } = current {
            current = source;
        }
        current
    }

    /// Qualified names of the subpackages the error passed through, outermost first.
    pub fn composition_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let ConfigureError::ChildComposition { child, source } = current {
            path.push(child.as_str());
            current = source;
        }
        path
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ConfigureError::ExternalBackendUnavailable {
                env_var,
                setup_file,
            } => Diagnostic::error("external optimized backend requested but not found")
                .with_context("no optimized or plain LAPACK metadata was reported")
                .with_suggestion("Install OpenBLAS or another LAPACK with a pkg-config file")
                .with_suggestion("Pin the backend in `[probe.static]` of .extconf/config.toml")
                .with_suggestion(format!(
                    "Build the bundled fallback: set {}=0 or `external = false` under [lapack] in {}",
                    env_var, setup_file
                )),

            ConfigureError::DuplicateTargetName {
                package,
                kind,
                name,
            } => Diagnostic::error(format!("duplicate {} name `{}`", kind, name))
                .with_context(format!("in subpackage `{}`", package))
                .with_suggestion(format!("Rename one of the `{}` {} targets", name, kind)),

            ConfigureError::InvalidTarget {
                package,
                kind,
                name,
                reason,
            } => Diagnostic::error(format!("invalid {} `{}`", kind, name))
                .with_context(format!("in subpackage `{}`", package))
                .with_context(reason.clone()),

            ConfigureError::MissingArrayHeaders { package, name } => {
                Diagnostic::error(format!("extension `{}` cannot find the array headers", name))
                    .with_context(format!("in subpackage `{}`", package))
                    .with_context("no array-interface include directories are configured")
                    .with_suggestion("Set `include-dirs` under [array] in .extconf/config.toml")
                    .with_suggestion("Or point EXTCONF_ARRAY_INCLUDE at the array headers")
            }

            ConfigureError::ChildComposition { .. } => {
                let mut diag = self.root_cause().to_diagnostic();
                diag = diag.with_context(format!(
                    "while configuring {}",
                    self.composition_path().join(" -> ")
                ));
                diag
            }

            ConfigureError::UnknownSubpackage { package } => {
                Diagnostic::error(format!("unknown subpackage `{}`", package))
                    .with_suggestion("Check the `subpackages` list of the parent package")
            }

            ConfigureError::MisplacedSubpackage {
                package,
                expected,
                found,
            } => Diagnostic::error(format!("subpackage `{}` configured in the wrong place", package))
                .with_context(format!("expected parent directory {}", expected.display()))
                .with_context(format!("found {}", found.display())),

            ConfigureError::Manifest { path, message } => {
                Diagnostic::error(format!("invalid manifest: {}", message))
                    .with_location(path.clone())
            }
        }
    }
}
