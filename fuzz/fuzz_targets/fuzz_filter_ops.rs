//! Fuzz target for sequences of filtering operations on the door preset.
//!
//! After every successful perception update the belief sums to 1; after
//! every failed operation the belief is unchanged.

#![no_main]

use arbitrary::Arbitrary;
use hmm_common::{Action, PerceptionId};
use hmm_config::{get_preset, PresetName};
use hmm_core::build_model;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Push,
    Wait,
    Perceive(bool),
    Unknown(String),
    Step(bool),
    Reset,
}

fuzz_target!(|ops: Vec<Op>| {
    let Ok(mut model) = build_model(&get_preset(PresetName::Door)) else {
        return;
    };
    let seen = |open: bool| PerceptionId::from(if open { "SenseOpen" } else { "SenseClosed" });

    for op in ops {
        let before = model.belief().duplicate();
        let result = match &op {
            Op::Push => model.act(&Action::named("push")),
            Op::Wait => model.wait_for_perception(),
            Op::Perceive(open) => model.perception_update(&seen(*open)),
            Op::Unknown(name) => model.perception_update(&PerceptionId::from(name.as_str())),
            Op::Step(open) => model.step(&Action::named("push"), &seen(*open)),
            Op::Reset => {
                model.reset();
                Ok(())
            }
        };

        match result {
            Ok(()) => {
                if matches!(op, Op::Perceive(_) | Op::Step(_)) {
                    assert!((model.belief().total() - 1.0).abs() < 1e-9);
                }
            }
            Err(_) => assert_eq!(model.belief(), &before),
        }
    }
});
