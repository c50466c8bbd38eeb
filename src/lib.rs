//! Modmerge - merge multiple go.mod manifests into one
//!
//! This crate provides the core library functionality for modmerge:
//! the structured manifest model, the go.mod parser and canonical
//! formatter, and the merge engine that reconciles directives from
//! several manifests into a single consolidated module file.

pub mod core;
pub mod ops;

pub use crate::core::{
    format::format,
    modfile::{ConflictError, ModFile, Replace, ReplaceTarget, Require, Retract, VersionInterval},
    parse::{parse, ParseError},
};

pub use crate::ops::merge::{merge_files, MergeError, MergeOptions, Merger};
