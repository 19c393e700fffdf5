//! Fuzz target for model definition parsing, validation, and construction.
//!
//! Arbitrary JSON must never panic: it either fails to parse, fails
//! validation, or yields a model that can be stepped.

#![no_main]

use hmm_config::{model_issues, ModelDefinition, DEFAULT_TOLERANCE};
use hmm_core::build_model;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(def) = serde_json::from_slice::<ModelDefinition>(data) else {
        return;
    };
    let issues = model_issues(&def, DEFAULT_TOLERANCE);

    // Construction must not panic even for definitions that fail validation.
    let Ok(mut model) = build_model(&def) else {
        return;
    };
    if issues.is_empty() && model.has_wait_action() {
        let _ = model.wait_for_perception();
        if let Some(perception) = model.perceptions().first().cloned() {
            let _ = model.perception_update(&perception);
        }
    }
});
