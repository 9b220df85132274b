//! `extconf decision` command

use anyhow::Result;

use crate::cli::DecisionArgs;
use crate::commands::Project;
use extconf::core::LinkOrigin;
use extconf::util::diagnostic::{emit, Diagnostic};
use extconf::util::{GlobalContext, ProcessEnv};

pub fn execute(args: DecisionArgs, ctx: &GlobalContext) -> Result<()> {
    let project = Project::locate(ctx, args.manifest_path.as_deref())?;

    let env = ProcessEnv;
    let resolver = project.resolver(&env);
    let decision = resolver.resolve();

    let linkage = if decision.use_external {
        "external"
    } else {
        "internal"
    };
    println!("{} (from {})", linkage, decision.origin);

    if decision.origin == LinkOrigin::Default {
        let note = Diagnostic::note("no link setting found, building the bundled fallback")
            .with_suggestion(format!(
                "Set `external` under [lapack] in {}",
                resolver.setup_file().display()
            ))
            .with_suggestion(format!("Or set {}=1", resolver.env_var()));
        emit(&note, ctx.color());
    }

    if ctx.is_verbose() {
        println!("  setup file: {}", resolver.setup_file().display());
        println!("  env var: {}", resolver.env_var());
    }

    Ok(())
}
