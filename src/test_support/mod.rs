//! Test utilities and mocks for extconf unit tests.
//!
//! This module provides mock implementations of the two seams a
//! configuration run reads from the outside world: the process environment
//! and the backend metadata source. Both record what was asked of them so
//! tests can assert on lookup counts and order.
//!
//! # Example
//!
//! ```rust,ignore
//! use extconf::test_support::{MockEnv, MockMetadataSource};
//!
//! #[test]
//! fn test_example() {
//!     let env = MockEnv::new().with("NIPY_EXTERNAL_LAPACK", "1");
//!     let source = MockMetadataSource::new()
//!         .with_profile(LinkProfile::Optimized, LibraryInfo::with_libraries(["openblas"]));
//!
//!     // Build a session from them...
//! }
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::collections::HashMap;

use crate::core::link::{LibraryInfo, LinkProfile};
use crate::ops::probe::LibraryMetadataSource;
use crate::util::context::Env;

// Re-export fixtures for convenience
pub use fixtures::*;

/// Mock environment with recorded lookups.
#[derive(Debug, Default)]
pub struct MockEnv {
    vars: HashMap<String, String>,
    lookups: RefCell<Vec<String>>,
}

impl MockEnv {
    /// Create an environment with no variables set.
    pub fn new() -> Self {
        MockEnv::default()
    }

    /// Set a variable.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Names looked up so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.borrow().clone()
    }
}

impl Env for MockEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.lookups.borrow_mut().push(key.to_string());
        self.vars.get(key).cloned()
    }
}

/// Mock metadata source with recorded queries.
///
/// Profiles without an entry report empty metadata, as when nothing is
/// installed.
#[derive(Debug, Default)]
pub struct MockMetadataSource {
    profiles: HashMap<LinkProfile, LibraryInfo>,
    queries: RefCell<Vec<LinkProfile>>,
}

impl MockMetadataSource {
    /// Create a source reporting nothing installed.
    pub fn new() -> Self {
        MockMetadataSource::default()
    }

    /// Report `info` for `profile`.
    pub fn with_profile(mut self, profile: LinkProfile, info: LibraryInfo) -> Self {
        self.profiles.insert(profile, info);
        self
    }

    /// Profiles queried so far, in order.
    pub fn queries(&self) -> Vec<LinkProfile> {
        self.queries.borrow().clone()
    }
}

impl LibraryMetadataSource for MockMetadataSource {
    fn query(&self, profile: LinkProfile) -> LibraryInfo {
        self.queries.borrow_mut().push(profile);
        self.profiles.get(&profile).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_env_records_lookups() {
        let env = MockEnv::new().with("A", "1");

        assert_eq!(env.var("A").as_deref(), Some("1"));
        assert_eq!(env.var("B"), None);
        assert_eq!(env.lookups(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_mock_source_defaults_to_empty() {
        let source = MockMetadataSource::new();

        assert!(!source.query(LinkProfile::Plain).is_present());
        assert_eq!(source.queries(), vec![LinkProfile::Plain]);
    }
}
