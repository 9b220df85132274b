//! High-level operations.
//!
//! This module contains the steps of a configuration run, from the link
//! decision through subpackage composition.

pub mod assemble;
pub mod build_info;
pub mod compose;
pub mod errors;
pub mod link_decision;
pub mod probe;
pub mod session;

pub use assemble::{assemble, AssembledSources, BundledSources, DecisionSources};
pub use build_info::BuildInfo;
pub use compose::{
    compose, configure_root, ConfigureSubpackage, ManifestResolver, SubpackageResolver,
    TableResolver,
};
pub use errors::ConfigureError;
pub use link_decision::LinkDecisionResolver;
pub use probe::{
    source_from_config, LibraryInfoProbe, LibraryMetadataSource, PkgConfigSource, StaticSource,
};
pub use session::ConfigureSession;
