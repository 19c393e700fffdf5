//! Build a [`HiddenMarkovModel`] from a model definition.
//!
//! This does not validate row sums; `hmm_config::validate_model` does that
//! before a definition gets here. Unknown ids still fail as domain errors.

use hmm_common::{Action, DomainKind, Error, PerceptionId, Result, StateId};
use hmm_config::ModelDefinition;
use hmm_math::Distribution;
use tracing::info;

use crate::model::{lift, HiddenMarkovModel};

fn action_of(name: Option<&str>) -> Action {
    match name {
        Some(name) => Action::named(name),
        None => Action::NoOp,
    }
}

/// Construct and populate a model from `def`.
pub fn build_model(def: &ModelDefinition) -> Result<HiddenMarkovModel> {
    let mut actions: Vec<Action> = def.actions.iter().map(|a| Action::named(a.as_str())).collect();
    if def.has_wait_action() {
        actions.push(Action::NoOp);
    }

    let mut model = HiddenMarkovModel::new(
        def.states.iter().map(|s| StateId::from(s.as_str())),
        def.perceptions.iter().map(|p| PerceptionId::from(p.as_str())),
        actions,
    )?;

    for entry in &def.transitions {
        model.set_transition_model_value(
            &StateId::from(entry.from.as_str()),
            &action_of(entry.action.as_deref()),
            &StateId::from(entry.to.as_str()),
            entry.probability,
        )?;
    }

    for entry in &def.sensor {
        model.set_sensor_model_value(
            &StateId::from(entry.state.as_str()),
            &PerceptionId::from(entry.perception.as_str()),
            entry.probability,
        )?;
    }

    if let Some(prior) = &def.prior {
        if let Some(stray) = prior.keys().find(|s| !def.states.contains(s)) {
            return Err(Error::domain(DomainKind::State, stray));
        }
        let pairs = def
            .states
            .iter()
            .map(|s| (StateId::from(s.as_str()), prior.get(s).copied().unwrap_or(0.0)));
        let prior =
            Distribution::from_pairs(pairs).map_err(|e| lift(e, DomainKind::State))?;
        model.set_prior(&prior)?;
    }

    info!(
        model = def.display_name(),
        states = def.states.len(),
        actions = model.actions().len(),
        perceptions = def.perceptions.len(),
        "model built"
    );
    Ok(model)
}
