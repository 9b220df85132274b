//! Per-run state of a configuration invocation.
//!
//! The link decision and the probe result are each computed at most once
//! per run and shared by every subpackage that needs them.

use std::cell::OnceCell;
use std::path::PathBuf;

use crate::core::link::{LibraryInfo, LinkDecision};
use crate::ops::assemble::{self, AssembledSources, BundledSources, DecisionSources};
use crate::ops::errors::ConfigureError;
use crate::ops::link_decision::LinkDecisionResolver;
use crate::ops::probe::{LibraryInfoProbe, LibraryMetadataSource};

/// Cached inputs shared across a configuration run.
pub struct ConfigureSession<'a> {
    resolver: LinkDecisionResolver<'a>,
    source: &'a dyn LibraryMetadataSource,
    array_include_dirs: Vec<PathBuf>,
    decision: OnceCell<LinkDecision>,
    library_info: OnceCell<LibraryInfo>,
}

impl<'a> ConfigureSession<'a> {
    pub fn new(resolver: LinkDecisionResolver<'a>, source: &'a dyn LibraryMetadataSource) -> Self {
        ConfigureSession {
            resolver,
            source,
            array_include_dirs: Vec::new(),
            decision: OnceCell::new(),
            library_info: OnceCell::new(),
        }
    }

    /// Set the array-interface include directories for every extension.
    pub fn with_array_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.array_include_dirs = dirs;
        self
    }

    pub fn array_include_dirs(&self) -> &[PathBuf] {
        &self.array_include_dirs
    }

    /// The link decision, resolved on first use.
    pub fn link_decision(&self) -> LinkDecision {
        *self.decision.get_or_init(|| self.resolver.resolve())
    }

    /// Backend metadata, probed on first use.
    ///
    /// `None` when linking internally: the probe is never run then.
    pub fn library_info(&self) -> Option<&LibraryInfo> {
        if !self.link_decision().use_external {
            return None;
        }
        Some(
            self.library_info
                .get_or_init(|| LibraryInfoProbe::new(self.source).probe()),
        )
    }

    /// Probe result if a probe already ran in this session.
    pub fn probed(&self) -> Option<&LibraryInfo> {
        self.library_info.get()
    }

    /// Assemble a LAPACK-conditioned library's sources and link settings.
    pub fn assemble(&self, bundled: BundledSources<'_>) -> Result<AssembledSources, ConfigureError> {
        let decision = self.link_decision();
        assemble::assemble(&decision, self.library_info(), bundled, self.decision_sources())
    }

    pub fn decision_sources(&self) -> DecisionSources<'_> {
        DecisionSources {
            env_var: self.resolver.env_var(),
            setup_file: self.resolver.setup_file(),
        }
    }
}
