//! Structural pruning: drop every field of an unstructured object that its
//! structural schema does not declare.
//!
//! Semantics follow the API server:
//! - at the resource root and at `x-kubernetes-embedded-resource` nodes, a
//!   string `apiVersion`/`kind` and an object `metadata` are never pruned;
//! - `x-kubernetes-preserve-unknown-fields` keeps unknown keys of that node,
//!   while declared properties below it are still pruned;
//! - a key that is neither a declared property nor covered by
//!   `additionalProperties` is removed; objects without a schema lose every key;
//! - scalars are never removed on their own.
//!
//! Pruning is deterministic and idempotent.

use serde_json::Value;

use crate::pointer::build_path;
use crate::structural::{Additional, Structural};

/// Options for a pruning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOptions {
    /// Treat the top-level value as a resource: keep `apiVersion`, `kind`
    /// and `metadata` there even when the schema does not mention them.
    pub is_resource_root: bool,
    /// Collect the JSON pointers of removed fields.
    pub return_pruned: bool,
}

impl PruneOptions {
    /// Options used by the fuzz loop: resource root, unknown fields dropped.
    pub fn resource_root() -> Self {
        Self {
            is_resource_root: true,
            return_pruned: false,
        }
    }
}

/// Removes undeclared fields from a value in place.
///
/// Any `Fn(&mut Value, &Structural, &PruneOptions)` is a `Pruner`, so tests can
/// substitute stubs for [`StructuralPruner`].
pub trait Pruner {
    fn prune(&self, value: &mut Value, schema: &Structural, options: &PruneOptions);
}

/// The pruner backed by [`prune_with_options`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralPruner;

impl Pruner for StructuralPruner {
    fn prune(&self, value: &mut Value, schema: &Structural, options: &PruneOptions) {
        prune_with_options(value, schema, options);
    }
}

impl<F> Pruner for F
where
    F: Fn(&mut Value, &Structural, &PruneOptions),
{
    fn prune(&self, value: &mut Value, schema: &Structural, options: &PruneOptions) {
        self(value, schema, options)
    }
}

/// Prune `value` against `schema`.
pub fn prune(value: &mut Value, schema: &Structural, is_resource_root: bool) {
    prune_with_options(
        value,
        schema,
        &PruneOptions {
            is_resource_root,
            return_pruned: false,
        },
    );
}

/// Prune `value` against `schema`, returning the sorted JSON pointers of
/// removed fields when `options.return_pruned` is set (empty otherwise).
pub fn prune_with_options(
    value: &mut Value,
    schema: &Structural,
    options: &PruneOptions,
) -> Vec<String> {
    let mut pruned = PrunedFields {
        record: options.return_pruned,
        paths: Vec::new(),
    };
    prune_node(value, Some(schema), options.is_resource_root, "", &mut pruned);
    pruned.paths.sort();
    pruned.paths
}

struct PrunedFields {
    record: bool,
    paths: Vec<String>,
}

impl PrunedFields {
    fn child(&self, parent: &str, segment: &str) -> String {
        if self.record {
            build_path(parent, &[segment])
        } else {
            String::new()
        }
    }

    fn removed(&mut self, parent: &str, key: &str) {
        if self.record {
            self.paths.push(build_path(parent, &[key]));
        }
    }
}

fn prune_node(
    value: &mut Value,
    schema: Option<&Structural>,
    embedded: bool,
    path: &str,
    pruned: &mut PrunedFields,
) {
    if let Some(s) = schema {
        if s.extensions.preserve_unknown_fields {
            prune_preserving(value, s, embedded, path, pruned);
            return;
        }
    }

    match value {
        Value::Object(map) => {
            let Some(s) = schema else {
                for key in map.keys() {
                    pruned.removed(path, key);
                }
                map.clear();
                return;
            };

            let embedded = embedded || s.extensions.embedded_resource;
            let mut unknown = Vec::new();
            for (key, child) in map.iter_mut() {
                if embedded && is_type_or_object_meta(key, child) {
                    continue;
                }
                let child_path = pruned.child(path, key);
                if let Some(prop) = s.properties.get(key) {
                    prune_node(child, Some(prop), false, &child_path, pruned);
                    continue;
                }
                match s.additional() {
                    Additional::Typed(additional) => {
                        prune_node(child, Some(additional), false, &child_path, pruned)
                    }
                    Additional::Untyped => prune_node(child, None, false, &child_path, pruned),
                    Additional::Forbidden => unknown.push(key.clone()),
                }
            }

            for key in unknown {
                map.remove(&key);
                pruned.removed(path, &key);
            }
        }
        Value::Array(items) => {
            let item_schema = schema.and_then(|s| s.items.as_deref());
            for (i, item) in items.iter_mut().enumerate() {
                let child_path = pruned.child(path, &i.to_string());
                prune_node(item, item_schema, false, &child_path, pruned);
            }
        }
        _ => {}
    }
}

/// Walk a preserve-unknown-fields node: unknown keys stay, declared children
/// are still pruned by their own schema.
fn prune_preserving(
    value: &mut Value,
    s: &Structural,
    embedded: bool,
    path: &str,
    pruned: &mut PrunedFields,
) {
    match value {
        Value::Object(map) => {
            let embedded = embedded || s.extensions.embedded_resource;
            for (key, child) in map.iter_mut() {
                if embedded && is_type_or_object_meta(key, child) {
                    continue;
                }
                let child_path = pruned.child(path, key);
                if let Some(prop) = s.properties.get(key) {
                    prune_node(child, Some(prop), false, &child_path, pruned);
                } else if let Additional::Typed(additional) = s.additional() {
                    prune_node(child, Some(additional), false, &child_path, pruned);
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = s.items.as_deref() {
                for (i, item) in items.iter_mut().enumerate() {
                    let child_path = pruned.child(path, &i.to_string());
                    prune_node(item, Some(item_schema), false, &child_path, pruned);
                }
            }
        }
        _ => {}
    }
}

fn is_type_or_object_meta(key: &str, value: &Value) -> bool {
    match key {
        "apiVersion" | "kind" => value.is_string(),
        "metadata" => value.is_object(),
        _ => false,
    }
}
