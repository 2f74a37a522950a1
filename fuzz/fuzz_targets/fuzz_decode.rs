#![no_main]

use crd_schema_fuzz_core::apiextensions::internal::CustomResourceDefinition;
use crd_schema_fuzz_core::{decode_all, Structural};
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes through decode -> canonicalize -> structural.
// Goal: errors, never panics.
fuzz_target!(|data: &[u8]| {
    let Ok(crds) = decode_all(data) else {
        return;
    };
    for crd in crds {
        let Ok(canonical) = CustomResourceDefinition::try_from(&crd) else {
            continue;
        };
        for version in &canonical.versions {
            if let Some(props) = &version.schema {
                let _ = Structural::new(props);
            }
        }
    }
});
