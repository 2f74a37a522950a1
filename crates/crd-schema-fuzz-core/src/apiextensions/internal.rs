//! Canonical CustomResourceDefinition.
//!
//! Every wire version converts into this form before the fuzz sweep reads
//! it. Conversion from v1 is a field copy; v1beta1 folds the legacy
//! `spec.version` and top-level `spec.validation` into the versions list.

use super::{v1, v1beta1, CustomResourceDefinitionNames, JsonSchemaProps, VersionedCrd};
use crate::error::ConversionError;
use crate::gvk::GroupKind;

#[derive(Debug, Clone, PartialEq)]
pub struct CustomResourceDefinition {
    pub name: String,
    pub group: String,
    pub names: CustomResourceDefinitionNames,
    pub scope: String,
    pub preserve_unknown_fields: bool,
    /// Versions in declared order.
    pub versions: Vec<CustomResourceDefinitionVersion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomResourceDefinitionVersion {
    pub name: String,
    pub served: bool,
    pub storage: bool,
    pub deprecated: bool,
    pub schema: Option<JsonSchemaProps>,
}

impl CustomResourceDefinition {
    pub fn group_kind(&self) -> GroupKind {
        GroupKind::new(self.group.clone(), self.names.kind.clone())
    }

    pub fn version(&self, name: &str) -> Option<&CustomResourceDefinitionVersion> {
        self.versions.iter().find(|v| v.name == name)
    }

    /// The version marked `storage: true`, falling back to the first one.
    pub fn storage_version(&self) -> Option<&CustomResourceDefinitionVersion> {
        self.versions
            .iter()
            .find(|v| v.storage)
            .or_else(|| self.versions.first())
    }
}

impl TryFrom<&VersionedCrd> for CustomResourceDefinition {
    type Error = ConversionError;

    fn try_from(crd: &VersionedCrd) -> Result<Self, Self::Error> {
        match crd {
            VersionedCrd::V1(crd) => from_v1(crd),
            VersionedCrd::V1beta1(crd) => from_v1beta1(crd),
        }
    }
}

impl TryFrom<VersionedCrd> for CustomResourceDefinition {
    type Error = ConversionError;

    fn try_from(crd: VersionedCrd) -> Result<Self, Self::Error> {
        Self::try_from(&crd)
    }
}

fn from_v1(crd: &v1::CustomResourceDefinition) -> Result<CustomResourceDefinition, ConversionError> {
    if crd.spec.versions.is_empty() {
        return Err(ConversionError::NoVersions {
            name: crd.metadata.name.clone(),
        });
    }

    let versions = crd
        .spec
        .versions
        .iter()
        .map(|v| CustomResourceDefinitionVersion {
            name: v.name.clone(),
            served: v.served,
            storage: v.storage,
            deprecated: v.deprecated,
            schema: v.schema.as_ref().and_then(|s| s.open_api_v3_schema.clone()),
        })
        .collect();

    Ok(CustomResourceDefinition {
        name: crd.metadata.name.clone(),
        group: crd.spec.group.clone(),
        names: crd.spec.names.clone(),
        scope: crd.spec.scope.clone(),
        preserve_unknown_fields: crd.spec.preserve_unknown_fields,
        versions,
    })
}

fn from_v1beta1(
    crd: &v1beta1::CustomResourceDefinition,
) -> Result<CustomResourceDefinition, ConversionError> {
    let name = crd.metadata.name.clone();
    let shared_schema = crd
        .spec
        .validation
        .as_ref()
        .and_then(|s| s.open_api_v3_schema.clone());

    let per_version_schemas = crd
        .spec
        .versions
        .iter()
        .any(|v| v.schema.as_ref().is_some_and(|s| s.open_api_v3_schema.is_some()));
    if shared_schema.is_some() && per_version_schemas {
        return Err(ConversionError::ConflictingSchemas { name });
    }

    let versions: Vec<_> = if crd.spec.versions.is_empty() {
        crd.spec
            .version
            .iter()
            .map(|version| CustomResourceDefinitionVersion {
                name: version.clone(),
                served: true,
                storage: true,
                deprecated: false,
                schema: shared_schema.clone(),
            })
            .collect()
    } else {
        crd.spec
            .versions
            .iter()
            .map(|v| CustomResourceDefinitionVersion {
                name: v.name.clone(),
                served: v.served,
                storage: v.storage,
                deprecated: v.deprecated,
                schema: v
                    .schema
                    .as_ref()
                    .and_then(|s| s.open_api_v3_schema.clone())
                    .or_else(|| shared_schema.clone()),
            })
            .collect()
    };

    if versions.is_empty() {
        return Err(ConversionError::NoVersions { name });
    }

    Ok(CustomResourceDefinition {
        name,
        group: crd.spec.group.clone(),
        names: crd.spec.names.clone(),
        scope: crd.spec.scope.clone(),
        preserve_unknown_fields: crd.spec.preserve_unknown_fields.unwrap_or(true),
        versions,
    })
}
