//! Fuzz target for step script parsing and replay.
//!
//! Any text either fails to parse or replays against the umbrella preset
//! without panicking.

#![no_main]

use hmm_config::{get_preset, PresetName};
use hmm_core::{build_model, parse_script, run_script};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(steps) = parse_script(text) else {
        return;
    };
    let Ok(mut model) = build_model(&get_preset(PresetName::Umbrella)) else {
        return;
    };
    if let Ok(trace) = run_script(&mut model, &steps) {
        assert_eq!(trace.steps.len(), steps.len());
    }
});
