//! The fuzz-compare loop and the per-version CRD sweep built on it.
//!
//! Each iteration deep-copies an object, fills the copy with random data,
//! prunes a second copy of its unstructured form and compares the two. A
//! difference means the schema and the object type disagree about which
//! fields exist.

use std::path::Path;

use crate::apiextensions::internal::CustomResourceDefinition;
use crate::apiextensions::VersionedCrd;
use crate::config::FuzzOptions;
use crate::decode::decode_file;
use crate::diff::diff;
use crate::error::FuzzError;
use crate::fuzzer::Fuzzer;
use crate::pruning::{PruneOptions, Pruner, StructuralPruner};
use crate::report::Report;
use crate::scheme::{DynObject, Scheme};
use crate::structural::Structural;

/// Fuzz `obj` `iterations` times and check that the structural pruner leaves
/// every fuzzed value unchanged.
pub fn object_n_times(
    report: &mut Report,
    fuzzer: &mut Fuzzer,
    obj: &dyn DynObject,
    schema: &Structural,
    iterations: usize,
) {
    object_n_times_with(report, fuzzer, &StructuralPruner, obj, schema, iterations);
}

/// [`object_n_times`] with a caller-supplied pruner.
pub fn object_n_times_with<P: Pruner + ?Sized>(
    report: &mut Report,
    fuzzer: &mut Fuzzer,
    pruner: &P,
    obj: &dyn DynObject,
    schema: &Structural,
    iterations: usize,
) {
    tracing::info!(
        kind = %object_kind(obj, report),
        object = obj.type_name(),
        iterations,
        seed = fuzzer.seed(),
        "fuzzing object against structural schema"
    );

    let options = PruneOptions::resource_root();
    for i in 0..iterations {
        let mut fuzzed = obj.deep_copy();
        fuzzed.fuzz(fuzzer);

        let expected = match fuzzed.to_value() {
            Ok(value) => value,
            Err(err) => {
                let object = obj.type_name();
                report.iteration_failure(
                    i,
                    format!("failed to convert fuzzed {object} to unstructured: {err}"),
                );
                continue;
            }
        };

        let mut pruned = expected.clone();
        pruner.prune(&mut pruned, schema, &options);

        match diff(&expected, &pruned) {
            None => {
                tracing::trace!(iteration = i, "pruning left fuzzed object unchanged");
                report.pass();
            }
            Some(difference) => report.discrepancy(i, difference),
        }
    }
}

/// The kind being fuzzed: the object's own GVK, else the enclosing report
/// scope, else the Rust type name.
fn object_kind(obj: &dyn DynObject, report: &Report) -> String {
    if let Some(gvk) = obj.kind() {
        return gvk.to_string();
    }
    let scope = report.scope();
    if scope.is_empty() {
        obj.type_name().to_string()
    } else {
        scope
    }
}

/// Fuzz every version of `crd` against the type registered for it in
/// `scheme`, [`DEFAULT_ITERATIONS`](crate::config::DEFAULT_ITERATIONS) times
/// each, with the structural pruner.
pub fn fuzz(
    report: &mut Report,
    scheme: &Scheme,
    fuzzer: &mut Fuzzer,
    crd: &VersionedCrd,
) -> Result<(), FuzzError> {
    fuzz_with(
        report,
        scheme,
        fuzzer,
        &StructuralPruner,
        crd,
        &FuzzOptions::default(),
    )
}

/// Decode the CRD at `path` and [`fuzz`] it.
pub fn fuzz_file(
    report: &mut Report,
    scheme: &Scheme,
    fuzzer: &mut Fuzzer,
    path: impl AsRef<Path>,
) -> Result<(), FuzzError> {
    let crd = decode_file(path)?;
    fuzz(report, scheme, fuzzer, &crd)
}

/// Fuzz every version of `crd` with a caller-supplied pruner and options.
///
/// Each version runs in its own report scope named after its GVK. A version
/// whose kind is not registered or whose schema is missing or malformed fails
/// its own scope; the remaining versions still run. Only a CRD that cannot be
/// converted at all is returned as an error.
pub fn fuzz_with<P: Pruner + ?Sized>(
    report: &mut Report,
    scheme: &Scheme,
    fuzzer: &mut Fuzzer,
    pruner: &P,
    crd: &VersionedCrd,
    options: &FuzzOptions,
) -> Result<(), FuzzError> {
    let crd = CustomResourceDefinition::try_from(crd)?;
    if crd.preserve_unknown_fields {
        tracing::warn!(
            crd = %crd.name,
            "CustomResourceDefinition preserves unknown fields; fuzzing with unknown fields dropped"
        );
    }

    let group_kind = crd.group_kind();
    for version in &crd.versions {
        let gvk = group_kind.with_version(version.name.clone());
        report.run(gvk.to_string(), |report| {
            tracing::debug!(
                %gvk,
                served = version.served,
                storage = version.storage,
                "fuzzing version"
            );

            let obj = match scheme.new_object(&gvk) {
                Ok(obj) => obj,
                Err(err) => {
                    report.setup_failure(format!("failed to create object: {err}"));
                    return;
                }
            };
            let Some(props) = &version.schema else {
                report.setup_failure(format!(
                    "version {} of {} has no openAPIV3Schema",
                    version.name, crd.name
                ));
                return;
            };
            let schema = match Structural::new(props) {
                Ok(schema) => schema,
                Err(err) => {
                    report.setup_failure(format!("failed to build structural schema: {err}"));
                    return;
                }
            };

            let iterations = options.iterations;
            object_n_times_with(report, fuzzer, pruner, obj.as_ref(), &schema, iterations);
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apiextensions::JsonSchemaProps;
    use crate::decode::decode_slice;
    use crate::fuzzer::Fuzz;
    use crate::gvk::GroupVersionKind;
    use crate::impl_fuzz;
    use crate::meta::{ObjectMeta, TypeMeta};
    use crate::schema_fuzz::UnstructuredObject;
    use pretty_assertions::assert_eq;
    use serde::{Serialize, Serializer};
    use serde_json::{json, Value};

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    struct Widget {
        #[serde(flatten)]
        type_meta: TypeMeta,
        metadata: ObjectMeta,
        spec: WidgetSpec,
    }
    impl_fuzz!(Widget { type_meta, metadata, spec });

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    struct WidgetSpec {
        name: String,
    }
    impl_fuzz!(WidgetSpec { name });

    /// Serialization always fails.
    #[derive(Debug, Clone, Default, PartialEq)]
    struct Opaque;

    impl Fuzz for Opaque {
        fn fuzz(&mut self, _: &mut Fuzzer) {}
    }

    impl Serialize for Opaque {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("opaque values cannot be serialized"))
        }
    }

    const WIDGET_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  scope: Namespaced
  names: { plural: widgets, singular: widget, kind: Widget }
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
                name: { type: string }
    - name: v2
      served: true
      storage: false
"#;

    fn widget_schema() -> Structural {
        let props: JsonSchemaProps = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "spec": { "type": "object", "properties": { "name": { "type": "string" } } }
            }
        }))
        .unwrap();
        Structural::new(&props).unwrap()
    }

    #[test]
    fn test_matching_type_passes_every_iteration() {
        let mut report = Report::new();
        let mut fuzzer = Fuzzer::with_seed(1);
        object_n_times(&mut report, &mut fuzzer, &Widget::default(), &widget_schema(), 200);
        report.assert_ok();
        assert_eq!(report.passed(), 200);
    }

    #[test]
    fn test_stub_pruner_failures_are_recorded_and_loop_continues() {
        let clear_name = |value: &mut Value, _: &Structural, _: &PruneOptions| {
            if let Some(spec) = value.get_mut("spec").and_then(Value::as_object_mut) {
                spec.remove("name");
            }
        };
        let mut report = Report::new();
        let mut fuzzer = Fuzzer::with_seed(2);
        object_n_times_with(
            &mut report,
            &mut fuzzer,
            &clear_name,
            &Widget::default(),
            &widget_schema(),
            50,
        );

        // Every Widget serializes spec.name, so every iteration differs.
        assert_eq!(report.failures().len(), 50);
        assert!(report.discrepancies().all(|d| d.paths().any(|p| p == "/spec/name")));
    }

    #[test]
    fn test_serialization_failure_is_an_iteration_failure() {
        let mut report = Report::new();
        let mut fuzzer = Fuzzer::with_seed(3);
        object_n_times(&mut report, &mut fuzzer, &Opaque, &widget_schema(), 3);
        assert_eq!(report.failures().len(), 3);
        assert!(report.failures()[0]
            .to_string()
            .contains("opaque values cannot be serialized"));
    }

    #[test]
    fn test_fuzz_with_scopes_each_version() {
        let crd = decode_slice(WIDGET_CRD.as_bytes()).unwrap();
        let mut scheme = Scheme::new();
        scheme
            .register::<Widget>(GroupVersionKind::new("example.com", "v1", "Widget"))
            .unwrap();
        let options = FuzzOptions {
            iterations: 20,
            ..FuzzOptions::default()
        };

        let mut report = Report::new();
        fuzz_with(
            &mut report,
            &scheme,
            &mut Fuzzer::with_seed(4),
            &StructuralPruner,
            &crd,
            &options,
        )
        .unwrap();

        assert_eq!(
            report.scopes(),
            &[
                "example.com/v1, Kind=Widget".to_string(),
                "example.com/v2, Kind=Widget".to_string(),
            ]
        );
        assert_eq!(report.failures_in("example.com/v1, Kind=Widget").count(), 0);
        assert_eq!(report.passed(), 20);

        let v2: Vec<_> = report.failures_in("example.com/v2, Kind=Widget").collect();
        assert_eq!(v2.len(), 1);
        assert!(v2[0].to_string().contains("no kind is registered"));
    }

    #[test]
    fn test_object_kind_names_what_is_fuzzed() {
        let gvk = GroupVersionKind::new("example.com", "v1", "Widget");
        let unstructured =
            UnstructuredObject::new(gvk.clone(), std::sync::Arc::new(widget_schema()));

        let mut report = Report::new();
        assert_eq!(object_kind(&unstructured, &report), "example.com/v1, Kind=Widget");
        assert!(object_kind(&Widget::default(), &report).ends_with("Widget"));

        report.run("example.com/v2, Kind=Widget", |report| {
            assert_eq!(object_kind(&Widget::default(), report), "example.com/v2, Kind=Widget");
            assert_eq!(object_kind(&unstructured, report), gvk.to_string());
        });
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let mut report = Report::new();
        let err = fuzz_file(
            &mut report,
            &Scheme::new(),
            &mut Fuzzer::with_seed(5),
            "/nonexistent/widget-crd.yaml",
        )
        .unwrap_err();
        assert!(matches!(err, FuzzError::Decode(_)));
        assert!(report.scopes().is_empty());
    }
}
