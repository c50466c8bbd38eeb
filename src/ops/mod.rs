//! High-level operations.
//!
//! This module contains the implementation of modmerge commands.

pub mod merge;

pub use merge::{merge_files, MergeError, MergeOptions, Merger};
