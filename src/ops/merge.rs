//! The merge operation: fold several parsed manifests into one.
//!
//! A run owns a single target manifest for its whole lifetime. The target
//! starts empty, is seeded with the caller's overrides, absorbs each input
//! in order, and is finalized exactly once. Inputs are folded fail-fast: the
//! first read, parse, or conflict error aborts the run with no partial
//! result.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::core::modfile::{ConflictError, ModFile};
use crate::core::parse::{self, ParseError};
use crate::core::version;

/// Overrides applied to the merged manifest.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Module identity for the output. Identity lines in the inputs never
    /// set it; without an override the output carries no identity.
    pub module_path: Option<String>,
    /// Go version for the output, winning over any input-declared version.
    pub go_version: Option<String>,
}

/// Error from a merge run.
#[derive(Debug, Error, Diagnostic)]
pub enum MergeError {
    #[error("failed to read `{path}`")]
    #[diagnostic(code(modmerge::merge::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Conflict(#[from] ConflictError),

    #[error("invalid go version `{version}`: must match a version like 1.23")]
    #[diagnostic(
        code(modmerge::merge::invalid_go_version),
        help("pass the bare language version, as in `--go 1.23`")
    )]
    InvalidGoVersion { version: String },
}

/// Incrementally merges manifests into one exclusively-owned target.
///
/// Feed each input to [`Merger::merge`] in the order it should apply, then
/// call [`Merger::finish`] to collapse and sort the result. A merger is
/// consumed by `finish` and never reused across runs.
#[derive(Debug)]
pub struct Merger {
    target: ModFile,
    go_override: Option<String>,
}

impl Merger {
    /// Create the target manifest, applying and validating the overrides.
    pub fn new(opts: &MergeOptions) -> Result<Self, MergeError> {
        let mut target = ModFile::new();
        if let Some(path) = &opts.module_path {
            target.set_module(path.clone());
        }
        if let Some(ver) = &opts.go_version {
            if !version::is_valid_go_version(ver) {
                return Err(MergeError::InvalidGoVersion {
                    version: ver.clone(),
                });
            }
        }
        Ok(Merger {
            target,
            go_override: opts.go_version.clone(),
        })
    }

    /// Fold one parsed manifest into the target.
    ///
    /// Requirements and retractions accumulate verbatim, exclusions and
    /// replacements must not collide with anything already inserted, and a
    /// declared go version overwrites the running value. The source's own
    /// identity line is ignored.
    pub fn merge(&mut self, source: &ModFile) -> Result<(), MergeError> {
        for req in &source.require {
            self.target
                .add_require(req.path.clone(), req.version.clone(), req.indirect);
        }
        for exc in &source.exclude {
            self.target.add_exclude(exc.path.clone(), exc.version.clone())?;
        }
        for rep in &source.replace {
            self.target.add_replace(rep.clone())?;
        }
        for ret in &source.retract {
            self.target.add_retract(ret.interval.clone(), ret.rationale.clone());
        }
        if let Some(go) = &source.go {
            self.target.set_go(go.clone());
        }
        Ok(())
    }

    /// Finalize the target: reapply the go override, collapse requirements
    /// to their highest versions, and order every block canonically.
    pub fn finish(mut self) -> ModFile {
        if let Some(go) = self.go_override.take() {
            self.target.set_go(go);
        }
        self.target.cleanup();
        self.target.sort_blocks();
        self.target
    }
}

/// Read, parse, and merge every input in the order given.
pub fn merge_files<P: AsRef<Path>>(
    paths: &[P],
    opts: &MergeOptions,
) -> Result<ModFile, MergeError> {
    let mut merger = Merger::new(opts)?;
    for path in paths {
        let path = path.as_ref();
        tracing::debug!("merging {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| MergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = parse::parse(&path.display().to_string(), &content)?;
        merger.merge(&source)?;
    }
    Ok(merger.finish())
}
