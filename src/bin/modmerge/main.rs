//! Modmerge CLI - merge go.mod manifests into one module file

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use modmerge::MergeError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging (stderr, so stdout stays the merged manifest)
    let filter = if cli.verbose {
        EnvFilter::new("modmerge=debug")
    } else {
        EnvFilter::new("modmerge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Merge(args) => commands::merge::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Bad arguments exit 1; failures while merging (read, parse, conflict,
/// rejected override) exit 2.
fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<MergeError>().is_some() {
        2
    } else {
        1
    }
}
