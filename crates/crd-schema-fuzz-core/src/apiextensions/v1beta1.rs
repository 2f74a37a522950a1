//! `apiextensions.k8s.io/v1beta1` CustomResourceDefinition.
//!
//! Differs from v1 in carrying a legacy single `spec.version` and a
//! top-level `spec.validation` schema shared by every version.

use serde::Deserialize;

use super::{CustomResourceDefinitionNames, CustomResourceValidation};
use crate::meta::ObjectMeta;

pub const API_VERSION: &str = "apiextensions.k8s.io/v1beta1";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomResourceDefinition {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: CustomResourceDefinitionSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomResourceDefinitionSpec {
    pub group: String,
    pub version: Option<String>,
    pub names: CustomResourceDefinitionNames,
    pub scope: String,
    pub validation: Option<CustomResourceValidation>,
    pub versions: Vec<CustomResourceDefinitionVersion>,
    /// Defaults to `true` in v1beta1 when unset.
    pub preserve_unknown_fields: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomResourceDefinitionVersion {
    pub name: String,
    pub served: bool,
    pub storage: bool,
    pub deprecated: bool,
    pub schema: Option<CustomResourceValidation>,
}
