//! Error types for decoding CRDs, building structural schemas and running fuzz sweeps.

use std::path::PathBuf;

use thiserror::Error;

use crate::gvk::GroupVersionKind;

/// Failure to turn raw bytes into a versioned CRD.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read CRD input file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode CRD data: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported object {api_version}, Kind={kind}: expected an apiextensions.k8s.io CustomResourceDefinition")]
    UnsupportedKind { api_version: String, kind: String },

    #[error("CRD input contains no CustomResourceDefinition document")]
    Empty,

    #[error("invalid CustomResourceDefinition {name:?}: {message}")]
    Invalid { name: String, message: String },
}

/// Failure to convert a versioned CRD into its canonical form.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("CustomResourceDefinition {name:?} declares no versions")]
    NoVersions { name: String },

    #[error("CustomResourceDefinition {name:?} sets both spec.validation and per-version schemas")]
    ConflictingSchemas { name: String },
}

/// A schema document that cannot be represented as a structural schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("structural schema error at {path}: {message}")]
pub struct StructuralError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemeError {
    #[error("no kind is registered for {0}")]
    NotRegistered(GroupVersionKind),

    #[error("{0} is already registered")]
    AlreadyRegistered(GroupVersionKind),
}

/// Input errors that stop a fuzz sweep before any version runs.
#[derive(Debug, Error)]
pub enum FuzzError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to convert CustomResourceDefinition to internal type: {0}")]
    Conversion(#[from] ConversionError),
}
