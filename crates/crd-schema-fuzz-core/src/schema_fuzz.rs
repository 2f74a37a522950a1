//! Schema-driven value generation.
//!
//! The CLI has no compiled Rust types for a CRD, so it fuzzes values built
//! directly from the structural schema. Every generated value stays inside
//! what the schema declares, which makes pruning it a no-op; a discrepancy
//! therefore points at the pruner, not at the generator.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Number, Value};

use crate::fuzzer::Fuzzer;
use crate::gvk::GroupVersionKind;
use crate::meta::ObjectMeta;
use crate::scheme::DynObject;
use crate::structural::{Additional, Structural};

const TYPE_META_KEYS: [&str; 3] = ["apiVersion", "kind", "metadata"];

/// Generate a value for `schema`. With `is_resource_root` the top-level object
/// also gets random `apiVersion`, `kind` and `metadata`.
pub fn fuzz_value(schema: &Structural, fuzzer: &mut Fuzzer, is_resource_root: bool) -> Value {
    generate(schema, fuzzer, is_resource_root)
}

/// Generate a resource of kind `gvk`: like [`fuzz_value`] at the resource
/// root, with `apiVersion` and `kind` matching `gvk`.
pub fn fuzz_object(gvk: &GroupVersionKind, schema: &Structural, fuzzer: &mut Fuzzer) -> Value {
    let mut value = generate(schema, fuzzer, true);
    if let Value::Object(map) = &mut value {
        map.insert("apiVersion".into(), Value::String(gvk.api_version()));
        map.insert("kind".into(), Value::String(gvk.kind.clone()));
    }
    value
}

fn generate(schema: &Structural, fuzzer: &mut Fuzzer, embedded: bool) -> Value {
    if schema.nullable && fuzzer.gen_nil() {
        return Value::Null;
    }

    let scalar_enum: Vec<&Value> = schema
        .value_validation
        .enum_values
        .iter()
        .filter(|v| !v.is_object() && !v.is_array())
        .collect();
    if let Some(choice) = scalar_enum.choose(fuzzer.rng()) {
        return (*choice).clone();
    }

    if schema.extensions.int_or_string {
        return if fuzzer.rng().gen_bool(0.5) {
            Value::from(fuzzer.rng().gen::<i32>())
        } else {
            Value::String(fuzzer.gen_string())
        };
    }

    match effective_type(schema) {
        "object" => {
            let embedded = embedded || schema.extensions.embedded_resource;
            generate_object(schema, fuzzer, embedded)
        }
        "array" => generate_array(schema, fuzzer),
        "string" => Value::String(fuzzer.gen_string()),
        "integer" => Value::from(fuzzer.rng().gen::<i64>()),
        "number" => {
            Number::from_f64(fuzzer.rng().gen::<f64>()).map_or(Value::Null, Value::Number)
        }
        "boolean" => Value::Bool(fuzzer.rng().gen()),
        _ if schema.extensions.preserve_unknown_fields => fuzzer.gen_json(),
        _ => fuzzer.gen_scalar(),
    }
}

/// An untyped node that declares fields is an object.
fn effective_type(schema: &Structural) -> &str {
    if schema.r#type.is_empty()
        && (!schema.properties.is_empty() || schema.additional_properties.is_some())
    {
        "object"
    } else {
        &schema.r#type
    }
}

fn generate_object(schema: &Structural, fuzzer: &mut Fuzzer, embedded: bool) -> Value {
    let mut map = Map::new();

    if embedded {
        map.insert("apiVersion".into(), Value::String(fuzzer.gen_string()));
        map.insert("kind".into(), Value::String(fuzzer.gen_string()));
        let mut meta = ObjectMeta::default();
        fuzzer.fill(&mut meta);
        let meta = serde_json::to_value(&meta).unwrap_or_else(|_| Value::Object(Map::new()));
        map.insert("metadata".into(), meta);
    }

    for (name, prop) in &schema.properties {
        if embedded && TYPE_META_KEYS.contains(&name.as_str()) {
            continue;
        }
        if fuzzer.gen_nil() {
            continue;
        }
        if let Some(value) = fuzzer.descend(|f| generate(prop, f, false)) {
            map.insert(name.clone(), value);
        }
    }

    let additional = schema.additional();
    if additional != Additional::Forbidden && !fuzzer.gen_nil() {
        let len = fuzzer.gen_len();
        for _ in 0..len {
            let key = fuzzer.gen_string();
            if is_taken(schema, &map, &key) {
                continue;
            }
            // Values under `additionalProperties: true` have no schema, so
            // only scalars survive pruning there.
            let value = match additional {
                Additional::Typed(item) => fuzzer.descend(|f| generate(item, f, false)),
                _ => Some(fuzzer.gen_scalar()),
            };
            if let Some(value) = value {
                map.insert(key, value);
            }
        }
    }

    // Unknown keys under a typed additionalProperties would be pruned by it.
    let open = schema.extensions.preserve_unknown_fields
        && !matches!(additional, Additional::Typed(_));
    if open && !fuzzer.gen_nil() {
        let len = fuzzer.gen_len();
        for _ in 0..len {
            let key = fuzzer.gen_string();
            if is_taken(schema, &map, &key) || TYPE_META_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(value) = fuzzer.descend(Fuzzer::gen_json) {
                map.insert(key, value);
            }
        }
    }

    Value::Object(map)
}

fn is_taken(schema: &Structural, map: &Map<String, Value>, key: &str) -> bool {
    schema.properties.contains_key(key) || map.contains_key(key)
}

fn generate_array(schema: &Structural, fuzzer: &mut Fuzzer) -> Value {
    let bounds = &schema.value_validation;
    let len = if bounds.min_items.unwrap_or(0) == 0 && fuzzer.gen_nil() {
        0
    } else {
        fuzzer.gen_len_between(bounds.min_items, bounds.max_items)
    };

    let items = (0..len)
        .map(|_| {
            let item = match schema.items.as_deref() {
                Some(item_schema) => fuzzer.descend(|f| generate(item_schema, f, false)),
                None if schema.extensions.preserve_unknown_fields => {
                    fuzzer.descend(Fuzzer::gen_json)
                }
                // Objects without a schema are cleared by pruning.
                None => Some(fuzzer.gen_scalar()),
            };
            // Past the depth limit, fill with nulls to keep minItems honest.
            item.unwrap_or(Value::Null)
        })
        .collect();
    Value::Array(items)
}

/// An object of a CRD version with no compiled Rust type: its value is
/// generated from the version's structural schema.
#[derive(Debug, Clone)]
pub struct UnstructuredObject {
    gvk: GroupVersionKind,
    schema: Arc<Structural>,
    value: Value,
}

impl UnstructuredObject {
    pub fn new(gvk: GroupVersionKind, schema: Arc<Structural>) -> Self {
        let mut map = Map::new();
        map.insert("apiVersion".into(), Value::String(gvk.api_version()));
        map.insert("kind".into(), Value::String(gvk.kind.clone()));
        Self {
            gvk,
            schema,
            value: Value::Object(map),
        }
    }

    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl DynObject for UnstructuredObject {
    fn deep_copy(&self) -> Box<dyn DynObject> {
        Box::new(self.clone())
    }

    fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
        self.value = fuzz_object(&self.gvk, &self.schema, fuzzer);
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(self.value.clone())
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn kind(&self) -> Option<&GroupVersionKind> {
        Some(&self.gvk)
    }
}
