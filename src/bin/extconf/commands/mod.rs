//! Command implementations

pub mod completions;
pub mod configure;
pub mod decision;
pub mod probe;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use extconf::ops::{ConfigureSession, LibraryMetadataSource, LinkDecisionResolver};
use extconf::util::config::ARRAY_INCLUDE_ENV;
use extconf::util::diagnostic::suggestions;
use extconf::util::{Config, Env, GlobalContext};

/// The project a command operates on.
pub struct Project {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub config: Config,
}

impl Project {
    /// Locate the project from `--manifest-path` or by searching upward.
    pub fn locate(ctx: &GlobalContext, manifest_path: Option<&Path>) -> Result<Self> {
        let manifest_path = match manifest_path {
            Some(path) if path.is_file() => ctx.cwd().join(path),
            Some(path) => {
                return Err(anyhow!(
                    "manifest `{}` does not exist\n{}",
                    path.display(),
                    suggestions::NO_MANIFEST
                ))
            }
            None => ctx
                .find_manifest()
                .map_err(|e| anyhow!("{}\n{}", e, suggestions::NO_MANIFEST))?,
        };

        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| ctx.cwd().to_path_buf());
        let config = ctx.load_config(&root);
        tracing::debug!("project root: {}", root.display());

        Ok(Project {
            root,
            manifest_path,
            config,
        })
    }

    pub fn resolver<'a>(&self, env: &'a dyn Env) -> LinkDecisionResolver<'a> {
        LinkDecisionResolver::from_config(&self.root, &self.config, env)
    }

    /// A fresh configuration session for this project.
    pub fn session<'a>(
        &self,
        env: &'a dyn Env,
        source: &'a dyn LibraryMetadataSource,
    ) -> ConfigureSession<'a> {
        let array_include_dirs = self
            .config
            .array
            .resolve_include_dirs(env.var(ARRAY_INCLUDE_ENV).as_deref());

        ConfigureSession::new(self.resolver(env), source).with_array_include_dirs(array_include_dirs)
    }
}
