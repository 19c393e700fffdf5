//! End-to-end filtering scenarios through the public library API.
//!
//! Models are built from definitions the way the CLI builds them, then
//! driven through step scripts.

use hmm_common::{Action, DomainKind, Error, PerceptionId, StateId};
use hmm_config::{get_preset, ModelDefinition, PresetName};
use hmm_core::{build_model, parse_script, run_script, SharedModel, Step};
use hmm_math::approx_eq;

const TOL: f64 = 1e-12;

fn sid(s: &str) -> StateId {
    StateId::from(s)
}

fn mass(dist: &hmm_math::Distribution<StateId>, state: &str) -> f64 {
    dist.probability_of(&sid(state)).unwrap()
}

// ============================================================================
// Umbrella world
// ============================================================================

mod umbrella {
    use super::*;

    #[test]
    fn wait_then_umbrella() {
        let mut model = build_model(&get_preset(PresetName::Umbrella)).unwrap();
        let steps = parse_script("wait\nperceive:Umbrella\n").unwrap();
        let trace = run_script(&mut model, &steps).unwrap();

        assert_eq!(trace.steps.len(), 2);
        assert!(approx_eq(mass(&trace.steps[0].belief, "Sunny"), 0.5, TOL));
        assert!(approx_eq(mass(&trace.final_belief, "Sunny"), 1.0 / 9.0, TOL));
        assert!(approx_eq(mass(&trace.final_belief, "Rainy"), 8.0 / 9.0, TOL));
        assert!(approx_eq(trace.log_evidence, 0.45f64.ln(), TOL));

        let (state, p) = trace.most_likely().unwrap();
        assert_eq!(state, &sid("Rainy"));
        assert!(approx_eq(p, 8.0 / 9.0, TOL));
    }

    #[test]
    fn two_days_of_umbrellas() {
        let mut model = build_model(&get_preset(PresetName::Umbrella)).unwrap();
        let steps = parse_script("wait\nsee:Umbrella\nwait\nsee:Umbrella").unwrap();
        let trace = run_script(&mut model, &steps).unwrap();

        // Day 2 prediction from {1/9, 8/9}: Rainy = 0.3/9 + 5.6/9 = 5.9/9.
        let predicted_rainy = 5.9 / 9.0;
        assert!(approx_eq(
            mass(&trace.steps[2].belief, "Rainy"),
            predicted_rainy,
            1e-12
        ));

        let sunny = (1.0 - predicted_rainy) * 0.1;
        let rainy = predicted_rainy * 0.8;
        assert!(approx_eq(
            mass(&trace.final_belief, "Rainy"),
            rainy / (sunny + rainy),
            1e-12
        ));
        assert!(approx_eq(
            trace.log_evidence,
            0.45f64.ln() + (sunny + rainy).ln(),
            1e-12
        ));
        // Evidence only accumulates on perception steps.
        assert_eq!(trace.steps[0].log_evidence, 0.0);
        assert_eq!(trace.steps[1].log_evidence, trace.steps[2].log_evidence);
    }

    #[test]
    fn no_umbrella_favors_sun() {
        let mut model = build_model(&get_preset(PresetName::Umbrella)).unwrap();
        let trace = run_script(&mut model, &[Step::Wait, Step::Perceive("NoUmbrella".into())])
            .unwrap();
        // 0.45 vs 0.1 of the remaining mass.
        assert!(approx_eq(mass(&trace.final_belief, "Sunny"), 0.45 / 0.55, TOL));
    }

    #[test]
    fn failing_step_stops_the_run() {
        let mut model = build_model(&get_preset(PresetName::Umbrella)).unwrap();
        let steps = parse_script("wait\nperceive:Umbrella\nperceive:Snow").unwrap();
        let err = run_script(&mut model, &steps).unwrap_err();
        assert!(matches!(
            err,
            Error::Domain {
                kind: DomainKind::Perception,
                ..
            }
        ));
        // The two good steps stuck.
        assert!(approx_eq(mass(model.belief(), "Rainy"), 8.0 / 9.0, TOL));
    }

    #[test]
    fn umbrella_model_has_no_named_actions() {
        let mut model = build_model(&get_preset(PresetName::Umbrella)).unwrap();
        let err = model.act(&Action::named("push")).unwrap_err();
        assert!(matches!(
            err,
            Error::Domain {
                kind: DomainKind::Action,
                ..
            }
        ));
    }
}

// ============================================================================
// Door world
// ============================================================================

mod door {
    use super::*;

    #[test]
    fn sense_push_sense() {
        let mut model = build_model(&get_preset(PresetName::Door)).unwrap();
        let steps = parse_script(
            "# classic door localization\n\
             perceive:SenseOpen\n\
             act:push\n\
             perceive:SenseOpen\n",
        )
        .unwrap();
        let trace = run_script(&mut model, &steps).unwrap();

        assert!(approx_eq(mass(&trace.steps[0].belief, "Open"), 0.75, TOL));
        assert!(approx_eq(mass(&trace.steps[1].belief, "Open"), 0.95, TOL));
        assert!(approx_eq(mass(&trace.final_belief, "Open"), 0.57 / 0.58, TOL));
        assert!(approx_eq(
            trace.log_evidence,
            0.4f64.ln() + 0.58f64.ln(),
            TOL
        ));
    }

    #[test]
    fn waiting_keeps_the_door_as_is() {
        let mut model = build_model(&get_preset(PresetName::Door)).unwrap();
        model.perception_update(&PerceptionId::from("SenseClosed")).unwrap();
        let before = model.belief().duplicate();
        model.wait_for_perception().unwrap();
        model.wait_for_perception().unwrap();
        assert_eq!(model.belief(), &before);
    }

    #[test]
    fn step_combines_action_and_perception() {
        let mut a = build_model(&get_preset(PresetName::Door)).unwrap();
        let mut b = a.clone();

        a.step(&Action::named("push"), &PerceptionId::from("SenseOpen"))
            .unwrap();
        b.act(&Action::named("push")).unwrap();
        b.perception_update(&PerceptionId::from("SenseOpen")).unwrap();

        assert_eq!(a.belief(), b.belief());
        assert!(approx_eq(a.log_evidence(), b.log_evidence(), TOL));
    }
}

// ============================================================================
// Definitions from text
// ============================================================================

#[test]
fn zero_likelihood_observation_is_degenerate() {
    let json = r#"{
        "schema_version": "1.0.0",
        "states": ["Dry", "Wet"],
        "perceptions": ["Drip", "Silence"],
        "prior": {"Dry": 1.0, "Wet": 0.0},
        "transitions": [
            {"from": "Dry", "to": "Dry", "probability": 1.0},
            {"from": "Wet", "to": "Wet", "probability": 1.0}
        ],
        "sensor": [
            {"state": "Dry", "perception": "Silence", "probability": 1.0},
            {"state": "Wet", "perception": "Drip", "probability": 1.0}
        ]
    }"#;
    let def = ModelDefinition::from_json_str(json).unwrap();
    hmm_config::validate_model(&def, hmm_config::DEFAULT_TOLERANCE).unwrap();

    let mut model = build_model(&def).unwrap();
    let err = run_script(&mut model, &[Step::Wait, Step::Perceive("Drip".into())]).unwrap_err();
    assert!(matches!(err, Error::DegenerateDistribution { .. }));
    assert_eq!(mass(model.belief(), "Dry"), 1.0);
    assert_eq!(model.log_evidence(), 0.0);
}

#[test]
fn missing_prior_is_uniform() {
    let mut def = get_preset(PresetName::Door);
    def.prior = None;
    let model = build_model(&def).unwrap();
    assert!(approx_eq(mass(model.prior(), "Closed"), 0.5, TOL));
}

// ============================================================================
// Shared model
// ============================================================================

#[test]
fn shared_model_matches_exclusive_model() {
    let model = build_model(&get_preset(PresetName::Umbrella)).unwrap();
    let mut exclusive = model.clone();
    let shared = SharedModel::new(model);

    let steps = parse_script("wait\nsee:Umbrella\nwait\nsee:NoUmbrella").unwrap();
    for step in &steps {
        step.apply(&mut exclusive).unwrap();
        match step {
            Step::Act(action) => shared.act(action).unwrap(),
            Step::Wait => shared.wait_for_perception().unwrap(),
            Step::Perceive(p) => shared.perception_update(p).unwrap(),
        }
    }

    assert_eq!(&shared.belief(), exclusive.belief());
    assert!(approx_eq(shared.log_evidence(), exclusive.log_evidence(), TOL));
}
