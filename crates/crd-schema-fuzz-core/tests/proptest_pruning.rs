//! Property-based tests for pruning and the generators that feed it.
//!
//! Invariants:
//! - pruning is idempotent for any JSON value and any fixture schema;
//! - a deep copy never observes mutations of its original;
//! - values generated from a structural schema are never pruned by it.

use crd_schema_fuzz_core::apiextensions::internal::CustomResourceDefinition;
use crd_schema_fuzz_core::{
    decode_file, fuzz_value, impl_fuzz, prune, prune_with_options, DynObject, Fuzzer,
    PruneOptions, Structural,
};
use proptest::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/crds");

/// Structural schemas of every versioned fixture that has one.
fn fixture_schemas() -> Vec<Structural> {
    let mut schemas = Vec::new();
    for name in ["widget-crd.yaml", "gadget-crd.yaml"] {
        let crd = decode_file(format!("{FIXTURES_DIR}/{name}"))
            .unwrap_or_else(|e| panic!("Failed to decode fixture {name}: {e}"));
        let crd = CustomResourceDefinition::try_from(crd).unwrap();
        for version in &crd.versions {
            if let Some(props) = &version.schema {
                schemas.push(Structural::new(props).unwrap());
            }
        }
    }
    schemas
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Keys biased towards names the fixture schemas declare.
fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "(apiVersion|kind|metadata|spec|status|name|size|tags|labels|mode|template)",
        "[a-z]{1,6}",
    ]
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            proptest::collection::btree_map(arb_key(), inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct Widget {
    spec: WidgetSpec,
}
impl_fuzz!(Widget { spec });

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct WidgetSpec {
    name: String,
    tags: Vec<String>,
    replicas: Option<i32>,
}
impl_fuzz!(WidgetSpec { name, tags, replicas });

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn pruning_is_idempotent(value in arb_json(), root in any::<bool>()) {
        for schema in fixture_schemas() {
            let mut once = value.clone();
            prune(&mut once, &schema, root);
            let mut twice = once.clone();
            let options = PruneOptions { is_resource_root: root, return_pruned: true };
            let removed = prune_with_options(&mut twice, &schema, &options);
            prop_assert_eq!(&twice, &once);
            prop_assert!(removed.is_empty(), "second pass removed {:?}", removed);
        }
    }

    #[test]
    fn deep_copy_is_independent(seed in any::<u64>()) {
        let mut fuzzer = Fuzzer::with_seed(seed).nil_chance(0.0);
        let mut original = Widget::default();
        fuzzer.fill(&mut original);
        let snapshot = original.to_value().unwrap();

        let mut copy = original.deep_copy();
        copy.fuzz(&mut fuzzer);
        prop_assert_eq!(original.to_value().unwrap(), snapshot.clone());

        let copy_before = copy.to_value().unwrap();
        original.spec.tags.push("mutated".into());
        original.spec.name.push('!');
        prop_assert_eq!(copy.to_value().unwrap(), copy_before);
    }

    #[test]
    fn schema_driven_values_are_never_pruned(seed in any::<u64>()) {
        let mut fuzzer = Fuzzer::with_seed(seed).max_depth(16);
        for schema in fixture_schemas() {
            let mut value = fuzz_value(&schema, &mut fuzzer, true);
            let options = PruneOptions { is_resource_root: true, return_pruned: true };
            let removed = prune_with_options(&mut value, &schema, &options);
            prop_assert!(removed.is_empty(), "pruned {:?}", removed);
        }
    }
}
