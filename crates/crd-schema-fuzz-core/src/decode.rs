//! CRD decoder: YAML or JSON bytes to a [`VersionedCrd`].
//!
//! JSON is read through the YAML parser, so both formats share one path.
//! Multi-document streams are accepted; documents that are not a
//! CustomResourceDefinition are skipped.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::apiextensions::{v1, v1beta1, VersionedCrd, KIND};
use crate::error::DecodeError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TypeProbe {
    api_version: String,
    kind: String,
}

enum Decoded {
    Crd(VersionedCrd),
    Other { api_version: String, kind: String },
}

/// Read and decode the first CustomResourceDefinition in `path`.
pub fn decode_file(path: impl AsRef<Path>) -> Result<VersionedCrd, DecodeError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "read CRD input file");
    decode_slice(&data)
}

/// Decode the first CustomResourceDefinition in a YAML or JSON stream.
pub fn decode_slice(data: &[u8]) -> Result<VersionedCrd, DecodeError> {
    let mut skipped = None;
    for document in serde_yaml::Deserializer::from_slice(data) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        match decode_document(value)? {
            Decoded::Crd(crd) => return Ok(crd),
            Decoded::Other { api_version, kind } => {
                skipped.get_or_insert((api_version, kind));
            }
        }
    }

    Err(match skipped {
        Some((api_version, kind)) => DecodeError::UnsupportedKind { api_version, kind },
        None => DecodeError::Empty,
    })
}

/// Decode every CustomResourceDefinition in a multi-document stream.
pub fn decode_all(data: &[u8]) -> Result<Vec<VersionedCrd>, DecodeError> {
    let mut crds = Vec::new();
    for document in serde_yaml::Deserializer::from_slice(data) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        match decode_document(value)? {
            Decoded::Crd(crd) => crds.push(crd),
            Decoded::Other { api_version, kind } => {
                tracing::debug!(%api_version, %kind, "skipping non-CRD document");
            }
        }
    }
    Ok(crds)
}

fn decode_document(value: serde_yaml::Value) -> Result<Decoded, DecodeError> {
    let probe: TypeProbe = serde_yaml::from_value(value.clone())?;
    if probe.kind != KIND {
        return Ok(Decoded::Other {
            api_version: probe.api_version,
            kind: probe.kind,
        });
    }

    let crd = match probe.api_version.as_str() {
        v1::API_VERSION => VersionedCrd::V1(serde_yaml::from_value(value)?),
        v1beta1::API_VERSION => VersionedCrd::V1beta1(serde_yaml::from_value(value)?),
        _ => {
            return Ok(Decoded::Other {
                api_version: probe.api_version,
                kind: probe.kind,
            })
        }
    };

    check_identity(&crd)?;
    Ok(Decoded::Crd(crd))
}

fn check_identity(crd: &VersionedCrd) -> Result<(), DecodeError> {
    let gk = crd.group_kind();
    let missing = if gk.group.is_empty() {
        Some("spec.group")
    } else if gk.kind.is_empty() {
        Some("spec.names.kind")
    } else {
        None
    };

    match missing {
        Some(field) => Err(DecodeError::Invalid {
            name: crd.name().to_string(),
            message: format!("{field} is required"),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WIDGET_V1: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
    plural: widgets
  scope: Namespaced
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                name:
                  type: string
"#;

    #[test]
    fn test_decode_yaml_v1() {
        let crd = decode_slice(WIDGET_V1.as_bytes()).unwrap();
        assert_eq!(crd.api_version(), v1::API_VERSION);
        assert_eq!(crd.name(), "widgets.example.com");
        assert_eq!(crd.group_kind().to_string(), "Widget.example.com");

        let VersionedCrd::V1(crd) = crd else {
            panic!("expected a v1 CRD");
        };
        assert_eq!(crd.spec.versions.len(), 1);
        let schema = crd.spec.versions[0]
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .unwrap();
        assert_eq!(
            schema.properties["spec"].properties["name"].type_.as_deref(),
            Some("string")
        );
    }

    #[test]
    fn test_decode_json() {
        let json = serde_json::json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": { "name": "widgets.example.com" },
            "spec": {
                "group": "example.com",
                "names": { "kind": "Widget" },
                "versions": [{ "name": "v1" }]
            }
        });
        let crd = decode_slice(json.to_string().as_bytes()).unwrap();
        assert_eq!(crd.group_kind().kind, "Widget");
    }

    #[test]
    fn test_multi_document_skips_other_kinds() {
        let stream = format!(
            "---\napiVersion: v1\nkind: Namespace\nmetadata: {{ name: demo }}\n---{WIDGET_V1}"
        );
        let crd = decode_slice(stream.as_bytes()).unwrap();
        assert_eq!(crd.name(), "widgets.example.com");

        let all = decode_all(stream.as_bytes()).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_unsupported_kind() {
        let err = decode_slice(b"apiVersion: v1\nkind: ConfigMap\n").unwrap_err();
        match err {
            DecodeError::UnsupportedKind { api_version, kind } => {
                assert_eq!(api_version, "v1");
                assert_eq!(kind, "ConfigMap");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(decode_slice(b"").unwrap_err(), DecodeError::Empty));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = decode_slice(b"kind: [unclosed").unwrap_err();
        assert!(matches!(err, DecodeError::Yaml(_)));
    }

    #[test]
    fn test_missing_group_is_invalid() {
        let err = decode_slice(
            b"apiVersion: apiextensions.k8s.io/v1\nkind: CustomResourceDefinition\nmetadata: {name: x}\nspec:\n  names: {kind: Widget}\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("spec.group"), "{err}");
    }

    #[test]
    fn test_missing_file() {
        let err = decode_file("/nonexistent/crd.yaml").unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
    }
}
