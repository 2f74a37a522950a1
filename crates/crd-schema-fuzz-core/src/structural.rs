//! Structural schema: the normalized form of a CRD's `openAPIV3Schema` that
//! pruning walks.
//!
//! A structural schema declares, for every position in an object, which
//! fields exist. Logical junctors (`allOf`, `anyOf`, `oneOf`, `not`) only
//! validate values and never declare fields, so they are not carried here.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::apiextensions::{JsonSchemaProps, JsonSchemaPropsOrArray, JsonSchemaPropsOrBool};
use crate::error::StructuralError;
use crate::pointer::build_path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structural {
    /// `type`; empty when unset (allowed with preserve-unknown-fields or int-or-string).
    pub r#type: String,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub nullable: bool,
    pub default: Option<Value>,
    pub items: Option<Box<Structural>>,
    pub properties: BTreeMap<String, Structural>,
    pub additional_properties: Option<StructuralOrBool>,
    pub extensions: Extensions,
    pub value_validation: ValueValidation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructuralOrBool {
    Bool(bool),
    Schema(Box<Structural>),
}

/// The `x-kubernetes-*` vendor extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    pub preserve_unknown_fields: bool,
    pub embedded_resource: bool,
    pub int_or_string: bool,
    pub list_type: Option<String>,
    pub list_map_keys: Vec<String>,
    pub map_type: Option<String>,
}

/// Value constraints consumed by the schema-driven generator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueValidation {
    pub enum_values: Vec<Value>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

/// How unknown keys of an object node are handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Additional<'a> {
    /// No `additionalProperties` (or `false`): unknown keys are pruned.
    Forbidden,
    /// `additionalProperties: true`: keys are kept, values pruned without a schema.
    Untyped,
    /// `additionalProperties: <schema>`.
    Typed(&'a Structural),
}

impl Structural {
    /// Build a structural schema from a CRD schema document.
    ///
    /// Fails on constructs a structural schema cannot express, naming the
    /// offending location as a JSON pointer rooted at `#`.
    pub fn new(props: &JsonSchemaProps) -> Result<Self, StructuralError> {
        build(props, "#")
    }

    pub(crate) fn additional(&self) -> Additional<'_> {
        match &self.additional_properties {
            None | Some(StructuralOrBool::Bool(false)) => Additional::Forbidden,
            Some(StructuralOrBool::Bool(true)) => Additional::Untyped,
            Some(StructuralOrBool::Schema(schema)) => Additional::Typed(schema),
        }
    }
}

fn build(props: &JsonSchemaProps, path: &str) -> Result<Structural, StructuralError> {
    reject_unsupported(props, path)?;

    let items = match &props.items {
        None => None,
        Some(JsonSchemaPropsOrArray::Schema(schema)) => {
            Some(Box::new(build(schema, &build_path(path, &["items"]))?))
        }
        Some(JsonSchemaPropsOrArray::Array(_)) => {
            return Err(error(
                build_path(path, &["items"]),
                "items must be a schema object and not an array",
            ));
        }
    };

    let mut properties = BTreeMap::new();
    for (name, prop) in &props.properties {
        let child = build(prop, &build_path(path, &["properties", name]))?;
        properties.insert(name.clone(), child);
    }

    let additional_properties = match &props.additional_properties {
        None => None,
        Some(JsonSchemaPropsOrBool::Bool(allowed)) => Some(StructuralOrBool::Bool(*allowed)),
        Some(JsonSchemaPropsOrBool::Schema(schema)) => {
            if !props.properties.is_empty() {
                return Err(error(
                    build_path(path, &["additionalProperties"]),
                    "additionalProperties and properties are mutually exclusive",
                ));
            }
            let child = build(schema, &build_path(path, &["additionalProperties"]))?;
            Some(StructuralOrBool::Schema(Box::new(child)))
        }
    };

    Ok(Structural {
        r#type: props.type_.clone().unwrap_or_default(),
        format: props.format.clone(),
        title: props.title.clone(),
        description: props.description.clone(),
        nullable: props.nullable,
        default: props.default.clone(),
        items,
        properties,
        additional_properties,
        extensions: Extensions {
            preserve_unknown_fields: props.x_preserve_unknown_fields.unwrap_or(false),
            embedded_resource: props.x_embedded_resource,
            int_or_string: props.x_int_or_string,
            list_type: props.x_list_type.clone(),
            list_map_keys: props.x_list_map_keys.clone(),
            map_type: props.x_map_type.clone(),
        },
        value_validation: ValueValidation {
            enum_values: props.enum_values.clone().unwrap_or_default(),
            min_items: props.min_items.and_then(|n| usize::try_from(n).ok()),
            max_items: props.max_items.and_then(|n| usize::try_from(n).ok()),
        },
    })
}

/// Keywords that have no place in a structural schema.
fn reject_unsupported(props: &JsonSchemaProps, path: &str) -> Result<(), StructuralError> {
    let present = [
        ("$ref", props.reference.is_some()),
        ("$schema", props.schema.is_some()),
        ("id", props.id.is_some()),
        ("definitions", !props.definitions.is_empty()),
        ("dependencies", !props.dependencies.is_empty()),
        ("patternProperties", !props.pattern_properties.is_empty()),
        ("additionalItems", props.additional_items.is_some()),
    ];

    match present.iter().find(|(_, set)| *set) {
        Some(&(keyword, _)) => Err(error(
            build_path(path, &[keyword]),
            &format!("{keyword} is not supported in structural schemas"),
        )),
        None => Ok(()),
    }
}

fn error(path: String, message: &str) -> StructuralError {
    StructuralError {
        path,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn structural(schema: Value) -> Result<Structural, StructuralError> {
        let props: JsonSchemaProps = serde_json::from_value(schema).unwrap();
        Structural::new(&props)
    }

    #[test]
    fn test_nested_properties_and_items() {
        let s = structural(json!({
            "type": "object",
            "properties": {
                "spec": {
                    "type": "object",
                    "properties": {
                        "ports": {
                            "type": "array",
                            "maxItems": 4,
                            "items": { "type": "integer" }
                        }
                    }
                }
            }
        }))
        .unwrap();

        let ports = &s.properties["spec"].properties["ports"];
        assert_eq!(ports.r#type, "array");
        assert_eq!(ports.items.as_ref().unwrap().r#type, "integer");
        assert_eq!(ports.value_validation.max_items, Some(4));
    }

    #[test]
    fn test_extensions_and_additional_properties() {
        let s = structural(json!({
            "type": "object",
            "x-kubernetes-preserve-unknown-fields": true,
            "additionalProperties": { "type": "string" },
            "x-kubernetes-map-type": "granular"
        }))
        .unwrap();

        assert!(s.extensions.preserve_unknown_fields);
        assert_eq!(s.extensions.map_type.as_deref(), Some("granular"));
        assert!(matches!(s.additional(), Additional::Typed(a) if a.r#type == "string"));
    }

    #[test]
    fn test_additional_properties_false_forbids() {
        let s = structural(json!({ "type": "object", "additionalProperties": false })).unwrap();
        assert_eq!(s.additional(), Additional::Forbidden);
        let s = structural(json!({ "type": "object", "additionalProperties": true })).unwrap();
        assert_eq!(s.additional(), Additional::Untyped);
    }

    #[test]
    fn test_items_array_rejected_with_path() {
        let err = structural(json!({
            "type": "object",
            "properties": {
                "pair": { "type": "array", "items": [{ "type": "string" }] }
            }
        }))
        .unwrap_err();
        assert_eq!(err.path, "#/properties/pair/items");
    }

    #[test]
    fn test_ref_rejected() {
        let err = structural(json!({
            "type": "object",
            "properties": { "spec": { "$ref": "#/definitions/spec" } }
        }))
        .unwrap_err();
        assert_eq!(err.path, "#/properties/spec/$ref");
        assert!(err.message.contains("not supported"));
    }

    #[test]
    fn test_properties_with_additional_schema_rejected() {
        let err = structural(json!({
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "additionalProperties": { "type": "string" }
        }))
        .unwrap_err();
        assert_eq!(err.path, "#/additionalProperties");
    }

    #[test]
    fn test_junctors_do_not_declare_fields() {
        let s = structural(json!({
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "anyOf": [{ "properties": { "b": { "type": "string" } } }]
        }))
        .unwrap();
        assert_eq!(s.properties.keys().collect::<Vec<_>>(), vec!["a"]);
    }
}
