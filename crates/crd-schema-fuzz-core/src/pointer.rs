//! JSON Pointer helpers (RFC 6901) shared by schema errors, pruned-field
//! reporting and diffs.
//!
//! Schema locations are rooted at `#` (`#/properties/spec/items`), data
//! locations at the empty string (`/spec/replicas/0`).

use std::borrow::Cow;

/// Escape a single path segment per RFC 6901.
///
/// - `~` → `~0`
/// - `/` → `~1`
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Build a JSON Pointer path by appending escaped segments to a parent path.
///
/// # Example
/// ```
/// use crd_schema_fuzz_core::pointer::build_path;
/// assert_eq!(build_path("#", &["properties", "a/b"]), "#/properties/a~1b");
/// assert_eq!(build_path("", &["spec", "name"]), "/spec/name");
/// ```
pub fn build_path(parent: &str, segments: &[&str]) -> String {
    let mut path = parent.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&escape_pointer_segment(segment));
    }
    path
}

/// Unescape a single path segment per RFC 6901.
///
/// Order matters: `~1` is unescaped first to avoid double-unescaping.
pub fn unescape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains("~0") || segment.contains("~1") {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Split a JSON Pointer into decoded segments, ignoring a leading `#`.
///
/// # Example
/// ```
/// use crd_schema_fuzz_core::pointer::split_path;
/// assert_eq!(split_path("/spec/a~1b"), vec!["spec", "a/b"]);
/// assert_eq!(split_path(""), Vec::<String>::new());
/// ```
pub fn split_path(path: &str) -> Vec<String> {
    let stripped = path.strip_prefix('#').unwrap_or(path);
    if stripped.is_empty() {
        return Vec::new();
    }

    let mut segments_iter = stripped.split('/');
    // "/a" splits into ["", "a"]; the leading empty segment is the root.
    if stripped.starts_with('/') {
        segments_iter.next();
    }

    segments_iter
        .map(|s| unescape_pointer_segment(s).into_owned())
        .collect()
}
