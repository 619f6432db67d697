//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Slipway - build and release orchestration for versioned packages
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the current package, one build per variant
    Build(BuildArgs),

    /// Verify, install and tag a release of the current package
    Release(ReleaseArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Remove build directories before building
    #[arg(long)]
    pub clean: bool,

    /// Install the build into the local packages path
    #[arg(short, long)]
    pub install: bool,

    /// Install destination (overrides the configured path)
    #[arg(long, value_name = "PATH")]
    pub install_path: Option<PathBuf>,

    /// Write per-variant activation scripts instead of building
    #[arg(long = "scripts", conflicts_with = "install")]
    pub scripts: bool,

    /// Print the planned build units as JSON without building
    #[arg(long)]
    pub plan: bool,
}

#[derive(Args)]
pub struct ReleaseArgs {
    /// Tag message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Release destination (overrides the configured path)
    #[arg(long, value_name = "PATH")]
    pub install_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
