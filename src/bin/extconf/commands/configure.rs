//! `extconf configure` command

use anyhow::{Context, Result};

use crate::cli::ConfigureArgs;
use crate::commands::Project;
use extconf::ops::{configure_root, source_from_config, BuildInfo};
use extconf::util::{GlobalContext, ProcessEnv};

pub fn execute(args: ConfigureArgs, ctx: &GlobalContext) -> Result<()> {
    let project = Project::locate(ctx, args.manifest_path.as_deref())?;

    let env = ProcessEnv;
    let source = source_from_config(&project.config.probe);
    let session = project.session(&env, source.as_ref());

    let root = configure_root(&project.manifest_path, &session)?;

    let mapping = root
        .to_mapping()
        .context("failed to build configuration mapping")?;
    let json = if args.compact {
        serde_json::to_string(&mapping)?
    } else {
        serde_json::to_string_pretty(&mapping)?
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Wrote configuration to {}", path.display());
        }
        None => println!("{}", json),
    }

    if let Some(ref path) = args.build_info {
        BuildInfo::collect(&session, &root).write(path)?;
    }

    Ok(())
}
