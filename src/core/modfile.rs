//! Structured go.mod manifests.
//!
//! `ModFile` is the in-memory form of one manifest. Its mutation methods
//! carry the contract the merge engine relies on: identity and go statements
//! overwrite, exclusions and replacements reject duplicate keys, and
//! requirements and retractions accumulate until [`ModFile::cleanup`] and
//! [`ModFile::sort_blocks`] put the file into canonical shape.

use std::cmp::Ordering;
use std::fmt;

use miette::Diagnostic;

use crate::core::version;

/// A required dependency: module path, selected version, indirect marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub path: String,
    pub version: String,
    /// Set when the requirement carried an `// indirect` comment.
    pub indirect: bool,
}

/// A forbidden (path, version) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclude {
    pub path: String,
    pub version: String,
}

/// Substitution of one module source for another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old_path: String,
    /// `None` replaces every version of `old_path`.
    pub old_version: Option<String>,
    pub new: ReplaceTarget,
}

/// Destination of a replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
    /// Another module at a pinned version.
    Module { path: String, version: String },
    /// A local directory tree, used as-is without a version.
    Directory { path: String },
}

/// Withdrawal notice for published versions of the module itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retract {
    pub interval: VersionInterval,
    /// Free-text rationale; empty when none was given. May span lines.
    pub rationale: String,
}

/// Closed version interval. A single retracted version is the degenerate
/// interval with `low == high`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInterval {
    pub low: String,
    pub high: String,
}

impl VersionInterval {
    /// Interval covering exactly one version.
    pub fn single(version: impl Into<String>) -> Self {
        let v = version.into();
        VersionInterval {
            low: v.clone(),
            high: v,
        }
    }

    pub fn is_single(&self) -> bool {
        self.low == self.high
    }
}

impl fmt::Display for VersionInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.high)
        } else {
            write!(f, "[{}, {}]", self.low, self.high)
        }
    }
}

impl Replace {
    /// The source key as it reads in the directive, with the version when
    /// the replacement is pinned to one.
    pub fn source(&self) -> String {
        match &self.old_version {
            Some(v) => format!("{} {}", self.old_path, v),
            None => self.old_path.clone(),
        }
    }
}

impl fmt::Display for ReplaceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceTarget::Module { path, version } => write!(f, "{} {}", path, version),
            ReplaceTarget::Directory { path } => write!(f, "{}", path),
        }
    }
}

/// A directive insert that would violate the manifest's key invariants.
///
/// `Display` and `Error` are hand-written because thiserror would treat the
/// `source` field of `DuplicateReplace` as the error's source, and it is a
/// plain `String` key, not a nested error.
#[derive(Debug, Diagnostic)]
pub enum ConflictError {
    #[diagnostic(
        code(modmerge::modfile::duplicate_exclude),
        help("drop the repeated exclude directive from one of the inputs")
    )]
    DuplicateExclude { path: String, version: String },

    #[diagnostic(
        code(modmerge::modfile::duplicate_replace),
        help("keep a single replace directive per source module and version")
    )]
    DuplicateReplace { source: String, existing: String },
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictError::DuplicateExclude { path, version } => {
                write!(f, "duplicate exclude of {path} {version}")
            }
            ConflictError::DuplicateReplace { source, existing } => {
                write!(f, "duplicate replace of {source}: already replaced by `{existing}`")
            }
        }
    }
}

impl std::error::Error for ConflictError {}

/// One structured manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModFile {
    /// Module identity (`module` directive).
    pub module: Option<String>,
    /// Language version (`go` directive).
    pub go: Option<String>,
    pub require: Vec<Require>,
    pub exclude: Vec<Exclude>,
    pub replace: Vec<Replace>,
    pub retract: Vec<Retract>,
}

impl ModFile {
    pub fn new() -> Self {
        ModFile::default()
    }

    /// True when the manifest holds no statements at all.
    pub fn is_empty(&self) -> bool {
        self.module.is_none()
            && self.go.is_none()
            && self.require.is_empty()
            && self.exclude.is_empty()
            && self.replace.is_empty()
            && self.retract.is_empty()
    }

    /// Set the module identity. A later write overwrites an earlier one.
    pub fn set_module(&mut self, path: impl Into<String>) {
        self.module = Some(path.into());
    }

    /// Set the go language version. A later write overwrites an earlier one.
    pub fn set_go(&mut self, version: impl Into<String>) {
        self.go = Some(version.into());
    }

    /// Append a requirement. Several entries for one path are allowed here;
    /// [`ModFile::cleanup`] collapses them.
    pub fn add_require(
        &mut self,
        path: impl Into<String>,
        version: impl Into<String>,
        indirect: bool,
    ) {
        self.require.push(Require {
            path: path.into(),
            version: version.into(),
            indirect,
        });
    }

    /// Insert an exclusion. The exclude block is a set keyed by the full
    /// (path, version) pair: an exact duplicate is an error, while the same
    /// path at another version is an independent entry.
    pub fn add_exclude(
        &mut self,
        path: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<(), ConflictError> {
        let path = path.into();
        let version = version.into();
        if self
            .exclude
            .iter()
            .any(|x| x.path == path && x.version == version)
        {
            return Err(ConflictError::DuplicateExclude { path, version });
        }
        self.exclude.push(Exclude { path, version });
        Ok(())
    }

    /// Insert a replacement, keyed by its (old path, old version) source.
    /// A second replacement for a source already present is an error even
    /// when the destination is identical.
    pub fn add_replace(&mut self, replace: Replace) -> Result<(), ConflictError> {
        if let Some(existing) = self
            .replace
            .iter()
            .find(|r| r.old_path == replace.old_path && r.old_version == replace.old_version)
        {
            return Err(ConflictError::DuplicateReplace {
                source: replace.source(),
                existing: existing.new.to_string(),
            });
        }
        self.replace.push(replace);
        Ok(())
    }

    /// Append a retraction. Retractions are never deduplicated; overlapping
    /// intervals from different histories all stand.
    pub fn add_retract(&mut self, interval: VersionInterval, rationale: impl Into<String>) {
        self.retract.push(Retract {
            interval,
            rationale: rationale.into(),
        });
    }

    /// Collapse accumulated requirements to one entry per module path, at
    /// the highest version observed. When the winning version occurs more
    /// than once the entry stays direct unless every occurrence was
    /// indirect.
    pub fn cleanup(&mut self) {
        let mut kept: Vec<Require> = Vec::with_capacity(self.require.len());
        for req in self.require.drain(..) {
            if let Some(pos) = kept.iter().position(|k| k.path == req.path) {
                match version::compare(&req.version, &kept[pos].version) {
                    Ordering::Greater => kept[pos] = req,
                    Ordering::Equal => kept[pos].indirect = kept[pos].indirect && req.indirect,
                    Ordering::Less => {}
                }
            } else {
                kept.push(req);
            }
        }
        self.require = kept;
    }

    /// Order every block canonically so the rendered output never depends
    /// on input order: require and exclude by path then version, replace by
    /// source key with unversioned sources first, retract by descending
    /// interval.
    pub fn sort_blocks(&mut self) {
        self.require.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| version::compare(&a.version, &b.version))
        });
        self.exclude.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| version::compare(&a.version, &b.version))
        });
        self.replace.sort_by(|a, b| {
            a.old_path
                .cmp(&b.old_path)
                .then_with(|| match (&a.old_version, &b.old_version) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(va), Some(vb)) => version::compare(va, vb),
                })
        });
        self.retract.sort_by(|a, b| {
            version::compare(&b.interval.high, &a.interval.high)
                .then_with(|| version::compare(&b.interval.low, &a.interval.low))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_module_overwrites() {
        let mut f = ModFile::new();
        f.set_module("example.com/a");
        f.set_module("example.com/b");
        assert_eq!(f.module.as_deref(), Some("example.com/b"));
    }

    #[test]
    fn test_set_go_overwrites() {
        let mut f = ModFile::new();
        f.set_go("1.20");
        f.set_go("1.21");
        assert_eq!(f.go.as_deref(), Some("1.21"));
    }

    #[test]
    fn test_is_empty() {
        let mut f = ModFile::new();
        assert!(f.is_empty());
        f.set_go("1.21");
        assert!(!f.is_empty());
    }

    #[test]
    fn test_add_exclude_rejects_exact_duplicate() {
        let mut f = ModFile::new();
        f.add_exclude("example.com/x", "v1.0.0").unwrap();
        let err = f.add_exclude("example.com/x", "v1.0.0").unwrap_err();
        assert!(matches!(err, ConflictError::DuplicateExclude { .. }));
        assert!(err.to_string().contains("example.com/x v1.0.0"));
    }

    #[test]
    fn test_add_exclude_same_path_other_version() {
        let mut f = ModFile::new();
        f.add_exclude("example.com/x", "v1.0.0").unwrap();
        f.add_exclude("example.com/x", "v1.1.0").unwrap();
        assert_eq!(f.exclude.len(), 2);
    }

    #[test]
    fn test_add_replace_rejects_duplicate_source() {
        let mut f = ModFile::new();
        f.add_replace(Replace {
            old_path: "example.com/x".into(),
            old_version: None,
            new: ReplaceTarget::Directory {
                path: "../local".into(),
            },
        })
        .unwrap();
        let err = f
            .add_replace(Replace {
                old_path: "example.com/x".into(),
                old_version: None,
                new: ReplaceTarget::Module {
                    path: "example.com/y".into(),
                    version: "v1.0.0".into(),
                },
            })
            .unwrap_err();
        assert!(err.to_string().contains("duplicate replace"));
        assert!(err.to_string().contains("../local"));
    }

    #[test]
    fn test_add_replace_rejects_identical_duplicate() {
        let rep = Replace {
            old_path: "example.com/x".into(),
            old_version: Some("v1.0.0".into()),
            new: ReplaceTarget::Module {
                path: "example.com/y".into(),
                version: "v2.0.0".into(),
            },
        };
        let mut f = ModFile::new();
        f.add_replace(rep.clone()).unwrap();
        assert!(f.add_replace(rep).is_err());
    }

    #[test]
    fn test_add_replace_versioned_and_wildcard_coexist() {
        let mut f = ModFile::new();
        f.add_replace(Replace {
            old_path: "example.com/x".into(),
            old_version: None,
            new: ReplaceTarget::Directory {
                path: "../local".into(),
            },
        })
        .unwrap();
        f.add_replace(Replace {
            old_path: "example.com/x".into(),
            old_version: Some("v1.0.0".into()),
            new: ReplaceTarget::Module {
                path: "example.com/y".into(),
                version: "v1.0.0".into(),
            },
        })
        .unwrap();
        assert_eq!(f.replace.len(), 2);
    }

    #[test]
    fn test_add_retract_accumulates() {
        let mut f = ModFile::new();
        f.add_retract(VersionInterval::single("v1.0.0"), "bad build");
        f.add_retract(VersionInterval::single("v1.0.0"), "bad build");
        assert_eq!(f.retract.len(), 2);
    }

    #[test]
    fn test_cleanup_keeps_highest_version() {
        let mut f = ModFile::new();
        f.add_require("example.com/x", "v1.0.0", false);
        f.add_require("example.com/x", "v2.0.0", false);
        f.add_require("example.com/x", "v1.5.0", false);
        f.cleanup();
        assert_eq!(f.require.len(), 1);
        assert_eq!(f.require[0].version, "v2.0.0");
    }

    #[test]
    fn test_cleanup_direct_beats_indirect_at_equal_version() {
        let mut f = ModFile::new();
        f.add_require("example.com/x", "v1.0.0", true);
        f.add_require("example.com/x", "v1.0.0", false);
        f.cleanup();
        assert!(!f.require[0].indirect);
    }

    #[test]
    fn test_cleanup_keeps_indirect_when_all_indirect() {
        let mut f = ModFile::new();
        f.add_require("example.com/x", "v1.0.0", true);
        f.add_require("example.com/x", "v1.0.0", true);
        f.cleanup();
        assert!(f.require[0].indirect);
    }

    #[test]
    fn test_cleanup_winner_flag_at_distinct_versions() {
        let mut f = ModFile::new();
        f.add_require("example.com/x", "v1.0.0", false);
        f.add_require("example.com/x", "v2.0.0", true);
        f.cleanup();
        assert_eq!(f.require[0].version, "v2.0.0");
        assert!(f.require[0].indirect);
    }

    #[test]
    fn test_cleanup_paths_independent() {
        let mut f = ModFile::new();
        f.add_require("example.com/a", "v1.0.0", false);
        f.add_require("example.com/b", "v1.0.0", false);
        f.cleanup();
        assert_eq!(f.require.len(), 2);
    }

    #[test]
    fn test_sort_blocks_require_semver_aware() {
        let mut f = ModFile::new();
        f.add_require("example.com/b", "v1.0.0", false);
        f.add_require("example.com/a", "v1.10.0", false);
        f.add_require("example.com/a", "v1.9.0", false);
        f.sort_blocks();
        assert_eq!(f.require[0].path, "example.com/a");
        assert_eq!(f.require[0].version, "v1.9.0");
        assert_eq!(f.require[1].version, "v1.10.0");
        assert_eq!(f.require[2].path, "example.com/b");
    }

    #[test]
    fn test_sort_blocks_replace_wildcard_first() {
        let mut f = ModFile::new();
        f.add_replace(Replace {
            old_path: "example.com/x".into(),
            old_version: Some("v1.0.0".into()),
            new: ReplaceTarget::Directory {
                path: "../one".into(),
            },
        })
        .unwrap();
        f.add_replace(Replace {
            old_path: "example.com/x".into(),
            old_version: None,
            new: ReplaceTarget::Directory {
                path: "../all".into(),
            },
        })
        .unwrap();
        f.sort_blocks();
        assert_eq!(f.replace[0].old_version, None);
    }

    #[test]
    fn test_sort_blocks_retract_descending() {
        let mut f = ModFile::new();
        f.add_retract(VersionInterval::single("v1.0.0"), "");
        f.add_retract(
            VersionInterval {
                low: "v1.5.0".into(),
                high: "v2.0.0".into(),
            },
            "",
        );
        f.sort_blocks();
        assert_eq!(f.retract[0].interval.high, "v2.0.0");
        assert_eq!(f.retract[1].interval.high, "v1.0.0");
    }

    #[test]
    fn test_interval_display() {
        assert_eq!(VersionInterval::single("v1.0.0").to_string(), "v1.0.0");
        let iv = VersionInterval {
            low: "v1.0.0".into(),
            high: "v1.5.0".into(),
        };
        assert_eq!(iv.to_string(), "[v1.0.0, v1.5.0]");
    }
}
