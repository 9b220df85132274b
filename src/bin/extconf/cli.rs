//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// extconf - decide LAPACK linkage and compose extension build configuration
#[derive(Parser)]
#[command(name = "extconf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Defaults to `configure` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compose the package tree and print its configuration
    Configure(ConfigureArgs),

    /// Show the LAPACK link decision and where it came from
    Decision(DecisionArgs),

    /// Show the installed LAPACK backend metadata
    Probe(ProbeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Default)]
pub struct ConfigureArgs {
    /// Path to the root Extconf.toml
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Write the configuration to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write a build-info record to this path
    #[arg(long)]
    pub build_info: Option<PathBuf>,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args)]
pub struct DecisionArgs {
    /// Path to the root Extconf.toml
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ProbeArgs {
    /// Path to the root Extconf.toml
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Probe even when the link decision is internal
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
