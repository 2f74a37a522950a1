#![no_main]

use crd_schema_fuzz_core::apiextensions::JsonSchemaProps;
use crd_schema_fuzz_core::{prune, Structural};
use libfuzzer_sys::fuzz_target;
use serde_json::{json, Value};
use std::sync::OnceLock;

fn schema() -> &'static Structural {
    static SCHEMA: OnceLock<Structural> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let props: JsonSchemaProps = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "spec": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "ports": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": { "port": { "type": "integer" } }
                            }
                        },
                        "labels": {
                            "type": "object",
                            "additionalProperties": { "type": "string" }
                        },
                        "template": {
                            "type": "object",
                            "x-kubernetes-embedded-resource": true,
                            "x-kubernetes-preserve-unknown-fields": true
                        },
                        "loose": { "type": "object", "additionalProperties": true }
                    }
                }
            }
        }))
        .expect("fuzz schema is valid");
        Structural::new(&props).expect("fuzz schema is structural")
    })
}

// Arbitrary JSON pruned twice: the second pass must change nothing.
fuzz_target!(|data: &[u8]| {
    let Ok(mut value) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let root = data.first().is_some_and(|b| b & 1 == 1);
    prune(&mut value, schema(), root);
    let once = value.clone();
    prune(&mut value, schema(), root);
    assert_eq!(value, once, "pruning is not idempotent");
});
