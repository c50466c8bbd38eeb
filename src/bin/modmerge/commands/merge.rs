//! `modmerge merge` command

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::cli::MergeArgs;
use modmerge::ops::merge::{merge_files, MergeOptions};

pub fn execute(args: MergeArgs) -> Result<()> {
    let inputs = collect_inputs(&args.files)?;

    let opts = MergeOptions {
        module_path: args.module,
        go_version: args.go,
    };

    let merged = merge_files(&inputs, &opts)?;

    print!("{}", modmerge::format(&merged));
    Ok(())
}

/// Validate the input paths: each must exist and must not be a directory.
/// Repeated arguments are dropped, keeping first-seen order, so passing the
/// same file twice does not conflict with itself.
fn collect_inputs(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs: Vec<PathBuf> = Vec::with_capacity(files.len());
    for file in files {
        if inputs.contains(file) {
            tracing::debug!("skipping repeated input {}", file.display());
            continue;
        }
        let meta = std::fs::metadata(file)
            .with_context(|| format!("cannot read `{}`", file.display()))?;
        if meta.is_dir() {
            bail!(
                "`{}` is a directory, expected a go.mod file",
                file.display()
            );
        }
        inputs.push(file.clone());
    }
    Ok(inputs)
}
