//! extconf - build configuration for native extension packages
//!
//! This crate decides whether a package links an external optimized
//! BLAS/LAPACK or builds a bundled fallback, probes the installed backend,
//! and composes the tree of subpackages with their native libraries and
//! extension modules.

pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for extconf unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock environments, mock metadata sources
/// and on-disk project fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{
    link::{LibraryInfo, LinkDecision},
    manifest::Manifest,
    subpackage::{Configuration, SubpackageNode},
};

pub use ops::{ConfigureError, ConfigureSession};
pub use util::context::GlobalContext;
