//! `extconf probe` command

use anyhow::Result;

use crate::cli::ProbeArgs;
use crate::commands::Project;
use extconf::ops::{source_from_config, LibraryInfoProbe};
use extconf::util::diagnostic::{emit, Diagnostic};
use extconf::util::{GlobalContext, ProcessEnv};

pub fn execute(args: ProbeArgs, ctx: &GlobalContext) -> Result<()> {
    let project = Project::locate(ctx, args.manifest_path.as_deref())?;

    let env = ProcessEnv;
    let source = source_from_config(&project.config.probe);

    let info = if args.force {
        Some(LibraryInfoProbe::new(source.as_ref()).probe())
    } else {
        let session = project.session(&env, source.as_ref());
        session.library_info().cloned()
    };

    match info {
        Some(info) => {
            if !info.is_present() {
                let warning = Diagnostic::warning("no LAPACK backend metadata was reported")
                    .with_context(format!(
                        "queried {} and {}",
                        project.config.probe.optimized_candidates().join(", "),
                        project.config.probe.plain_candidates().join(", ")
                    ))
                    .with_suggestion("Pin the backend in `[probe.static]` of .extconf/config.toml");
                emit(&warning, ctx.color());
            }
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        None => {
            tracing::info!("Linking internally, no probe run (use --force to probe anyway)");
        }
    }

    Ok(())
}
