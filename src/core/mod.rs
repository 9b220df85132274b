//! Core data structures for extconf.
//!
//! This module contains the foundational types used throughout extconf:
//! - Link decisions and backend metadata
//! - Native library and extension targets
//! - Subpackage configurations and the composed tree
//! - Extconf.toml manifests

pub mod link;
pub mod manifest;
pub mod subpackage;
pub mod target;

pub use link::{LibraryInfo, LinkDecision, LinkOrigin, LinkProfile};
pub use manifest::{Manifest, MANIFEST_NAME};
pub use subpackage::{Configuration, SubpackageNode};
pub use target::{ExtensionTarget, LinkSettings, NativeLibraryTarget, SourceSet, TargetKind};
