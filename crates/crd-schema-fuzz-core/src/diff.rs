//! Human-readable structural diff between a fuzzed value and its pruned copy.

use std::fmt;

use pretty_assertions::Comparison;
use serde_json::Value;

/// One JSON-patch operation turning the expected value into the actual one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// `add`, `remove` or `replace`.
    pub op: String,
    /// JSON pointer of the differing field.
    pub path: String,
}

/// The difference between two unequal values.
#[derive(Debug, Clone)]
pub struct Diff {
    pub entries: Vec<DiffEntry>,
    /// Line diff of both values' pretty `Debug` output.
    pub rendered: String,
}

impl Diff {
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    /// Whether any differing path has `field` as one of its segments.
    pub fn mentions(&self, field: &str) -> bool {
        self.paths()
            .any(|path| crate::pointer::split_path(path).iter().any(|s| s == field))
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} field(s) differ:", self.entries.len())?;
        for entry in &self.entries {
            writeln!(f, "  {} {}", entry.op, entry.path)?;
        }
        write!(f, "\n{}", self.rendered)
    }
}

/// Compare two values, returning `None` when they are structurally equal.
pub fn diff(expected: &Value, actual: &Value) -> Option<Diff> {
    if expected == actual {
        return None;
    }

    let patch = json_patch::diff(expected, actual);
    // Read the patch through its serialized form: `{"op": ..., "path": ...}`.
    let entries = serde_json::to_value(&patch)
        .ok()
        .and_then(|ops| ops.as_array().cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(|op| {
            Some(DiffEntry {
                op: op.get("op")?.as_str()?.to_string(),
                path: op.get("path")?.as_str()?.to_string(),
            })
        })
        .collect();

    Some(Diff {
        entries,
        rendered: Comparison::new(expected, actual).to_string(),
    })
}
