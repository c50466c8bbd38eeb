//! Module-version and go-version handling.
//!
//! go.mod versions are `v`-prefixed semantic versions (`v1.2.3`, optionally
//! with pre-release or build suffixes). The ordering defined here backs the
//! max-version-wins requirement collapse and the canonical block sort.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

/// Pattern for the `go` directive: `1.21`, `1.21.3`, `1.22rc1`.
static GO_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[1-9][0-9]*\.(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))?([a-z][a-z0-9]*)?$").unwrap()
});

/// Parse a module version into its semver form, if it has one.
pub fn parse_module_version(v: &str) -> Option<Version> {
    v.strip_prefix('v')?.parse().ok()
}

/// Check that a string is a canonical module version (`v` plus full semver).
pub fn is_valid_module_version(v: &str) -> bool {
    parse_module_version(v).is_some()
}

/// Check that a string is a valid go language version.
pub fn is_valid_go_version(v: &str) -> bool {
    GO_VERSION_RE.is_match(v)
}

/// Total order over module version strings.
///
/// When both sides parse, semver ordering applies (so `v1.9.0` sorts below
/// `v1.10.0` and pre-releases below their release). An invalid version sorts
/// before any valid one; two invalid versions fall back to string order so
/// the result is still total.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_module_version(a), parse_module_version(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Light well-formedness check for module paths.
///
/// This is deliberately shallow: it rejects paths that would break the text
/// format or are plainly malformed, and leaves full import-path validation
/// to the tools that resolve modules.
pub fn check_module_path(path: &str) -> Result<(), &'static str> {
    if path.is_empty() {
        return Err("path is empty");
    }
    if path.chars().any(char::is_whitespace) {
        return Err("path contains whitespace");
    }
    if path.chars().any(char::is_control) {
        return Err("path contains control characters");
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err("path must not start or end with a slash");
    }
    if path.contains("//") {
        return Err("path contains a doubled slash");
    }
    Ok(())
}
