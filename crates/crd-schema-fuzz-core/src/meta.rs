//! Common Kubernetes object header types for typed objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::impl_fuzz;

/// `apiVersion` and `kind`.
///
/// Usually flattened into an object type with `#[serde(flatten)]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl_fuzz!(TypeMeta { api_version, kind });

/// The subset of `metadata` the harness carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl_fuzz!(ObjectMeta {
    name,
    generate_name,
    namespace,
    uid,
    resource_version,
    generation,
    labels,
    annotations,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fuzzer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_empty_meta_serializes_to_empty_object() {
        assert_eq!(serde_json::to_value(ObjectMeta::default()).unwrap(), json!({}));
        assert_eq!(serde_json::to_value(TypeMeta::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_fuzzed_meta_uses_camel_case_keys() {
        let mut meta = ObjectMeta::default();
        let mut fuzzer = Fuzzer::with_seed(21).nil_chance(0.0);
        while meta.generate_name.is_empty() || meta.resource_version.is_empty() {
            fuzzer.fill(&mut meta);
        }
        let value = serde_json::to_value(&meta).unwrap();
        assert!(value.get("generateName").is_some());
        assert!(value.get("resourceVersion").is_some());
        assert!(value.get("generation").is_some());
    }
}
