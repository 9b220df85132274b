//! Tiered lookup of the LAPACK link decision.
//!
//! Order of precedence (highest to lowest):
//! 1. `[lapack] external` in the project's setup file (INI)
//! 2. The designated environment variable
//! 3. Internal linking against the bundled fallback
//!
//! Each tier yields `Some(value)` or `None`; the first `Some` wins. A present
//! but empty value is a hit and means external. A missing or unreadable setup
//! file is an ordinary miss, not an error.

use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};

use crate::core::link::{LinkDecision, LinkOrigin};
use crate::util::config::Config;
use crate::util::context::Env;

/// INI section holding the link setting.
pub const SETUP_SECTION: &str = "lapack";

/// INI key holding the link setting.
pub const SETUP_KEY: &str = "external";

/// Resolves whether to link an external optimized backend.
pub struct LinkDecisionResolver<'a> {
    setup_file: PathBuf,
    env_var: String,
    env: &'a dyn Env,
}

impl<'a> LinkDecisionResolver<'a> {
    pub fn new(setup_file: impl Into<PathBuf>, env_var: impl Into<String>, env: &'a dyn Env) -> Self {
        LinkDecisionResolver {
            setup_file: setup_file.into(),
            env_var: env_var.into(),
            env,
        }
    }

    /// Resolver for a project, using the configured file and variable names.
    pub fn from_config(project_root: &Path, config: &Config, env: &'a dyn Env) -> Self {
        Self::new(
            project_root.join(config.lapack.setup_file()),
            config.lapack.env_var(),
            env,
        )
    }

    pub fn setup_file(&self) -> &Path {
        &self.setup_file
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Run the lookup tiers in order.
    pub fn resolve(&self) -> LinkDecision {
        let decision = self
            .from_setup_file()
            .map(|value| (value, LinkOrigin::ConfigFile))
            .or_else(|| {
                self.from_env()
                    .map(|value| (value, LinkOrigin::EnvironmentVariable))
            })
            .map(|(value, origin)| LinkDecision::from_value(&value, origin))
            .unwrap_or_else(LinkDecision::default_internal);

        tracing::debug!(
            "link decision: external={} (from {})",
            decision.use_external,
            decision.origin
        );
        decision
    }

    fn from_setup_file(&self) -> Option<String> {
        // Values are taken verbatim: no quote stripping, no escapes
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = match Ini::load_from_file_opt(&self.setup_file, options) {
            Ok(ini) => ini,
            Err(e) => {
                tracing::debug!("setup file {} not used: {}", self.setup_file.display(), e);
                return None;
            }
        };

        // Option names are case-insensitive, section names are not
        let value = ini.section(Some(SETUP_SECTION)).and_then(|section| {
            section
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(SETUP_KEY))
                .map(|(_, value)| value.trim().to_string())
        });

        if value.is_none() {
            tracing::debug!(
                "no [{}] {} in {}",
                SETUP_SECTION,
                SETUP_KEY,
                self.setup_file.display()
            );
        }
        value
    }

    fn from_env(&self) -> Option<String> {
        self.env
            .var(&self.env_var)
            .map(|value| value.trim().to_string())
    }
}
