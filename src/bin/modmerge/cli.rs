//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Modmerge - merge multiple go.mod manifests into one
#[derive(Parser)]
#[command(name = "modmerge")]
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
    /// Merge go.mod files and print the result to stdout
    Merge(MergeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct MergeArgs {
    /// go.mod files to merge, in order (repeats are read once)
    pub files: Vec<PathBuf>,

    /// Module path for the merged manifest
    #[arg(short, long)]
    pub module: Option<String>,

    /// Go version for the merged manifest (overrides the inputs)
    #[arg(short, long)]
    pub go: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
