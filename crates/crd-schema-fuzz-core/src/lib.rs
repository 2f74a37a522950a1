//! # crd-schema-fuzz-core
//!
//! Checks that a CustomResourceDefinition's structural schema agrees with
//! the Rust types that model its resources.
//!
//! For every version of a CRD the harness looks up the type registered for
//! that version's GVK, fills it with random data many times and prunes each
//! fuzzed value against the version's structural schema. Pruning must not
//! change anything: a field the type serializes but the schema does not
//! declare would be silently dropped by the API server, and shows up here as
//! a discrepancy naming that field.
//!
//! ## Pipeline
//!
//! 1. **Decode** (`decode`): YAML/JSON bytes to a `VersionedCrd`.
//! 2. **Canonicalize** (`apiextensions::internal`): v1 and v1beta1 to one form.
//! 3. **Structural** (`structural`): each version's `openAPIV3Schema`.
//! 4. **Fuzz** (`fuzzer`, `schema_fuzz`): random values for the registered type.
//! 5. **Prune and compare** (`pruning`, `diff`, `runner`), recorded in a `Report`.
//!
//! ```no_run
//! use crd_schema_fuzz_core::{decode_file, fuzz, impl_fuzz, Fuzzer, GroupVersionKind, Report, Scheme};
//! use serde::Serialize;
//!
//! #[derive(Debug, Clone, Default, PartialEq, Serialize)]
//! struct Widget {
//!     spec: WidgetSpec,
//! }
//! impl_fuzz!(Widget { spec });
//!
//! #[derive(Debug, Clone, Default, PartialEq, Serialize)]
//! struct WidgetSpec {
//!     name: String,
//! }
//! impl_fuzz!(WidgetSpec { name });
//!
//! let crd = decode_file("widget-crd.yaml").unwrap();
//! let mut scheme = Scheme::new();
//! scheme.register::<Widget>(GroupVersionKind::new("example.com", "v1", "Widget")).unwrap();
//!
//! let mut report = Report::new();
//! fuzz(&mut report, &scheme, &mut Fuzzer::new(), &crd).unwrap();
//! report.assert_ok();
//! ```

pub mod apiextensions;
pub mod config;
pub mod decode;
pub mod diff;
pub mod error;
pub mod fuzzer;
pub mod gvk;
pub mod meta;
pub mod pointer;
pub mod pruning;
pub mod report;
pub mod runner;
pub mod schema_fuzz;
pub mod scheme;
pub mod structural;

pub use apiextensions::VersionedCrd;
pub use config::{FuzzOptions, DEFAULT_ITERATIONS};
pub use decode::{decode_all, decode_file, decode_slice};
pub use diff::{diff, Diff, DiffEntry};
pub use error::{ConversionError, DecodeError, FuzzError, SchemeError, StructuralError};
pub use fuzzer::{Fuzz, Fuzzer};
pub use gvk::{GroupKind, GroupVersionKind};
pub use pruning::{prune, prune_with_options, PruneOptions, Pruner, StructuralPruner};
pub use report::{Failure, FailureKind, Report, Summary};
pub use runner::{fuzz, fuzz_file, fuzz_with, object_n_times, object_n_times_with};
pub use schema_fuzz::{fuzz_object, fuzz_value, UnstructuredObject};
pub use scheme::{DynObject, Object, Scheme};
pub use structural::Structural;
