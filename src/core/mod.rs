//! Core data structures for modmerge.
//!
//! This module contains the manifest model shared by the parser, the
//! formatter, and the merge engine:
//! - Structured manifests (ModFile and its directive blocks)
//! - go.mod text parsing and canonical rendering
//! - Module-version ordering and go-version validation

pub mod format;
pub mod modfile;
pub mod parse;
pub mod version;

pub use format::format;
pub use modfile::{
    ConflictError, Exclude, ModFile, Replace, ReplaceTarget, Require, Retract, VersionInterval,
};
pub use parse::{parse, ParseError, ParseErrorKind};
