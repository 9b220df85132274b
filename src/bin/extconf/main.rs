//! extconf CLI - build configuration for native extension packages

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigureArgs};
use extconf::ops::ConfigureError;
use extconf::util::diagnostic::{self, suggestions};
use extconf::util::GlobalContext;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        match e.downcast_ref::<ConfigureError>() {
            Some(err) => {
                diagnostic::emit(&err.to_diagnostic(), color);
                if matches!(
                    err.root_cause(),
                    ConfigureError::ExternalBackendUnavailable { .. }
                ) {
                    eprintln!("{}", suggestions::NO_BACKEND);
                }
            }
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging; stdout is reserved for command output
    let filter = if cli.verbose {
        EnvFilter::new("extconf=debug")
    } else {
        EnvFilter::new("extconf=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);
    ctx.set_color(!cli.no_color);

    // Execute command
    match cli.command {
        None => commands::configure::execute(ConfigureArgs::default(), &ctx),
        Some(Commands::Configure(args)) => commands::configure::execute(args, &ctx),
        Some(Commands::Decision(args)) => commands::decision::execute(args, &ctx),
        Some(Commands::Probe(args)) => commands::probe::execute(args, &ctx),
        Some(Commands::Completions(args)) => commands::completions::execute(args),
    }
}
