//! CustomResourceDefinition documents in their wire versions, plus the
//! canonical form every wire version converts into.
//!
//! Only what the fuzz harness reads is modelled. Unknown fields in a document
//! are ignored, as the API server's lenient decoder does.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::gvk::GroupKind;

pub mod internal;
pub mod v1;
pub mod v1beta1;

/// API group of CustomResourceDefinition objects.
pub const GROUP: &str = "apiextensions.k8s.io";
/// Kind of CustomResourceDefinition objects.
pub const KIND: &str = "CustomResourceDefinition";

/// A decoded CRD in the wire version it was written in.
#[derive(Debug, Clone)]
pub enum VersionedCrd {
    V1(v1::CustomResourceDefinition),
    V1beta1(v1beta1::CustomResourceDefinition),
}

impl VersionedCrd {
    pub fn name(&self) -> &str {
        match self {
            Self::V1(crd) => &crd.metadata.name,
            Self::V1beta1(crd) => &crd.metadata.name,
        }
    }

    pub fn api_version(&self) -> &'static str {
        match self {
            Self::V1(_) => v1::API_VERSION,
            Self::V1beta1(_) => v1beta1::API_VERSION,
        }
    }

    pub fn group_kind(&self) -> GroupKind {
        let (group, names) = match self {
            Self::V1(crd) => (&crd.spec.group, &crd.spec.names),
            Self::V1beta1(crd) => (&crd.spec.group, &crd.spec.names),
        };
        GroupKind::new(group.clone(), names.kind.clone())
    }
}

/// `spec.names`, identical across wire versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomResourceDefinitionNames {
    pub plural: String,
    pub singular: String,
    pub kind: String,
    pub list_kind: String,
    pub short_names: Vec<String>,
    pub categories: Vec<String>,
}

/// Wrapper around a version's `openAPIV3Schema`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CustomResourceValidation {
    #[serde(rename = "openAPIV3Schema")]
    pub open_api_v3_schema: Option<JsonSchemaProps>,
}

/// An OpenAPI v3 schema as written inside a CRD.
///
/// Keywords a structural schema cannot carry (`$ref`, `definitions`,
/// `patternProperties`, ...) are still decoded so that
/// [`Structural::new`](crate::Structural::new) can reject them by path.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonSchemaProps {
    pub id: Option<String>,
    #[serde(rename = "$schema")]
    pub schema: Option<String>,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,

    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub nullable: bool,
    pub default: Option<Value>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    pub example: Option<Value>,

    pub required: Vec<String>,
    pub properties: BTreeMap<String, JsonSchemaProps>,
    pub additional_properties: Option<JsonSchemaPropsOrBool>,
    pub pattern_properties: BTreeMap<String, Value>,
    pub max_properties: Option<i64>,
    pub min_properties: Option<i64>,

    pub items: Option<JsonSchemaPropsOrArray>,
    pub additional_items: Option<Value>,
    pub max_items: Option<i64>,
    pub min_items: Option<i64>,
    pub unique_items: bool,

    pub maximum: Option<f64>,
    pub exclusive_maximum: bool,
    pub minimum: Option<f64>,
    pub exclusive_minimum: bool,
    pub multiple_of: Option<f64>,
    pub max_length: Option<i64>,
    pub min_length: Option<i64>,
    pub pattern: Option<String>,

    pub all_of: Vec<JsonSchemaProps>,
    pub one_of: Vec<JsonSchemaProps>,
    pub any_of: Vec<JsonSchemaProps>,
    pub not: Option<Box<JsonSchemaProps>>,

    pub definitions: BTreeMap<String, Value>,
    pub dependencies: BTreeMap<String, Value>,

    #[serde(rename = "x-kubernetes-preserve-unknown-fields")]
    pub x_preserve_unknown_fields: Option<bool>,
    #[serde(rename = "x-kubernetes-embedded-resource")]
    pub x_embedded_resource: bool,
    #[serde(rename = "x-kubernetes-int-or-string")]
    pub x_int_or_string: bool,
    #[serde(rename = "x-kubernetes-list-type")]
    pub x_list_type: Option<String>,
    #[serde(rename = "x-kubernetes-list-map-keys")]
    pub x_list_map_keys: Vec<String>,
    #[serde(rename = "x-kubernetes-map-type")]
    pub x_map_type: Option<String>,
}

/// `additionalProperties`: either a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum JsonSchemaPropsOrBool {
    Bool(bool),
    Schema(Box<JsonSchemaProps>),
}

/// `items`: either one schema or a tuple of schemas.
///
/// `Array` is listed first so a sequence is never read positionally into
/// the struct form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum JsonSchemaPropsOrArray {
    Array(Vec<JsonSchemaProps>),
    Schema(Box<JsonSchemaProps>),
}
