//! Path normalization helpers for in-archive paths
//!
//! LTAR archives store forward-slash separated relative paths. These helpers
//! canonicalize caller-supplied paths (which may use either separator and
//! carry leading or trailing separators) into that form.

/// Canonical in-archive path separator
pub const SEPARATOR: char = '/';

/// Normalize a raw path into canonical in-archive form
///
/// Converts backslashes to forward slashes and strips leading and trailing
/// separators. Interior empty segments are collapsed.
pub fn normalize(path: &str) -> String {
    let converted = path.replace('\\', "/");
    let mut out = String::with_capacity(converted.len());
    for segment in converted.split('/').filter(|s| !s.is_empty()) {
        if !out.is_empty() {
            out.push(SEPARATOR);
        }
        out.push_str(segment);
    }
    out
}

/// Strip a root prefix from an already-normalized path
///
/// The prefix is normalized with the same rules before comparison. Returns
/// the remainder without a leading separator, or the input unchanged when the
/// prefix does not match.
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    let prefix = normalize(prefix);
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix.as_str()) {
        Some(rest) => rest.strip_prefix(SEPARATOR).unwrap_or(rest),
        None => path,
    }
}

/// Split a normalized path into its ordered segments
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}
