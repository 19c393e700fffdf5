//! Discrete hidden Markov model with exact forward filtering.
//!
//! The belief is advanced in two phases:
//!
//!   predict:  b'(s') = Σ_s T(s' | s, a) · b(s)
//!   correct:  b''(s) ∝ S(e | s) · b'(s)
//!
//! Every stepping operation builds a new distribution and swaps it in only
//! on success, so a failed step leaves the belief exactly as it was.
//!
//! Table rows are not checked for summing to 1 here. Malformed tables give
//! incoherent beliefs, never panics; see [`HiddenMarkovModel::malformed_rows`].

use std::collections::HashSet;
use std::fmt;

use hmm_common::{Action, DomainKind, Error, PerceptionId, Result, StateId, NO_OP_NAME};
use hmm_math::{stable_sum, ConditionalTable, Distribution, ProbabilityError};
use serde::Serialize;
use tracing::debug;

/// Row key of the transition table: the current state and the action taken.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionKey {
    pub state: StateId,
    pub action: Action,
}

impl TransitionKey {
    pub fn new(state: StateId, action: Action) -> Self {
        TransitionKey { state, action }
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.state, self.action)
    }
}

/// `P(next state | state, action)`.
pub type TransitionTable = ConditionalTable<TransitionKey, StateId>;

/// `P(perception | state)`.
pub type SensorTable = ConditionalTable<StateId, PerceptionId>;

/// Which table a malformed row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Transition,
    Sensor,
}

/// A table row whose entries do not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedRow {
    pub table: TableKind,
    pub row: String,
    pub sum: f64,
}

/// Belief-tracking hidden Markov model.
#[derive(Debug, Clone)]
pub struct HiddenMarkovModel {
    actions: Vec<Action>,
    prior: Distribution<StateId>,
    belief: Distribution<StateId>,
    transition_model: TransitionTable,
    sensor_model: SensorTable,
    log_evidence: f64,
}

pub(crate) fn lift(err: ProbabilityError, kind: DomainKind) -> Error {
    match err {
        ProbabilityError::UnknownKey { key, .. } => Error::Domain { kind, id: key },
        ProbabilityError::DuplicateKey { key, .. } => Error::DuplicateId { kind, id: key },
        ProbabilityError::Degenerate { total } => Error::DegenerateDistribution { total },
        other @ ProbabilityError::ShapeMismatch { .. } => Error::InvalidModel(other.to_string()),
    }
}

impl HiddenMarkovModel {
    /// Build a model over the given spaces.
    ///
    /// The prior is uniform and the belief starts as a copy of it. Every
    /// table entry starts at 0.
    pub fn new<S, P, A>(states: S, perceptions: P, actions: A) -> Result<Self>
    where
        S: IntoIterator<Item = StateId>,
        P: IntoIterator<Item = PerceptionId>,
        A: IntoIterator<Item = Action>,
    {
        let states: Vec<StateId> = states.into_iter().collect();
        let prior =
            Distribution::uniform(states.iter().cloned()).map_err(|e| lift(e, DomainKind::State))?;

        let mut seen = HashSet::new();
        let mut action_list = Vec::new();
        for action in actions {
            if !seen.insert(action.clone()) {
                return Err(Error::DuplicateId {
                    kind: DomainKind::Action,
                    id: action.to_string(),
                });
            }
            action_list.push(action);
        }

        let rows = states.iter().flat_map(|s| {
            action_list
                .iter()
                .map(move |a| TransitionKey::new(s.clone(), a.clone()))
        });
        let transition_model = ConditionalTable::new(rows, states.iter().cloned())
            .map_err(|e| lift(e, DomainKind::State))?;
        let sensor_model = ConditionalTable::new(states.iter().cloned(), perceptions)
            .map_err(|e| lift(e, DomainKind::Perception))?;

        Ok(HiddenMarkovModel {
            actions: action_list,
            belief: prior.duplicate(),
            prior,
            transition_model,
            sensor_model,
            log_evidence: 0.0,
        })
    }

    /// Build a model whose only action is [`Action::NoOp`].
    pub fn without_actions<S, P>(states: S, perceptions: P) -> Result<Self>
    where
        S: IntoIterator<Item = StateId>,
        P: IntoIterator<Item = PerceptionId>,
    {
        Self::new(states, perceptions, [Action::NoOp])
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    fn check_state(&self, state: &StateId) -> Result<()> {
        if self.prior.contains(state) {
            Ok(())
        } else {
            Err(Error::domain(DomainKind::State, state))
        }
    }

    fn check_action(&self, action: &Action) -> Result<()> {
        if self.actions.contains(action) {
            Ok(())
        } else {
            Err(Error::domain(DomainKind::Action, action))
        }
    }

    fn check_perception(&self, perception: &PerceptionId) -> Result<()> {
        if self.sensor_model.contains_column(perception) {
            Ok(())
        } else {
            Err(Error::domain(DomainKind::Perception, perception))
        }
    }

    /// A belief must range over exactly this model's states.
    fn check_belief(&self, belief: &Distribution<StateId>) -> Result<()> {
        if belief.same_outcomes(&self.prior) {
            return Ok(());
        }
        if let Some(stray) = belief.states().iter().find(|s| !self.prior.contains(s)) {
            return Err(Error::domain(DomainKind::State, stray));
        }
        match self.prior.states().iter().find(|s| !belief.contains(s)) {
            Some(missing) => Err(Error::domain(DomainKind::State, missing)),
            // Same states, different order.
            None => Err(Error::InvalidModel(
                "belief orders states differently from the model".to_string(),
            )),
        }
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    /// Set `P(next_state | state, action)`.
    pub fn set_transition_model_value(
        &mut self,
        state: &StateId,
        action: &Action,
        next_state: &StateId,
        probability: f64,
    ) -> Result<()> {
        self.check_state(state)?;
        self.check_action(action)?;
        self.check_state(next_state)?;
        self.transition_model
            .set(
                &TransitionKey::new(state.clone(), action.clone()),
                next_state,
                probability,
            )
            .map_err(|e| lift(e, DomainKind::State))
    }

    /// Set `P(next_state | state, no-op)`.
    pub fn set_wait_transition_model_value(
        &mut self,
        state: &StateId,
        next_state: &StateId,
        probability: f64,
    ) -> Result<()> {
        self.set_transition_model_value(state, &Action::NoOp, next_state, probability)
    }

    /// Set `P(perception | state)`.
    pub fn set_sensor_model_value(
        &mut self,
        state: &StateId,
        perception: &PerceptionId,
        probability: f64,
    ) -> Result<()> {
        self.check_state(state)?;
        self.check_perception(perception)?;
        self.sensor_model
            .set(state, perception, probability)
            .map_err(|e| lift(e, DomainKind::Perception))
    }

    /// Overwrite one prior mass and restart filtering from the prior.
    pub fn set_prior_probability(&mut self, state: &StateId, probability: f64) -> Result<()> {
        self.prior
            .set_probability_of(state, probability)
            .map_err(|e| lift(e, DomainKind::State))?;
        self.reset();
        Ok(())
    }

    /// Replace the prior and restart filtering from it.
    ///
    /// `prior` must cover exactly this model's states, in any order.
    pub fn set_prior(&mut self, prior: &Distribution<StateId>) -> Result<()> {
        if let Some(stray) = prior.states().iter().find(|s| !self.prior.contains(s)) {
            return Err(Error::domain(DomainKind::State, stray));
        }
        let masses = self
            .prior
            .states()
            .iter()
            .map(|s| prior.probability_of(s).map_err(|e| lift(e, DomainKind::State)))
            .collect::<Result<Vec<f64>>>()?;
        self.prior = self
            .prior
            .with_masses(masses)
            .map_err(|e| lift(e, DomainKind::State))?;
        self.reset();
        Ok(())
    }

    /// Restart filtering: belief becomes a copy of the prior.
    pub fn reset(&mut self) {
        self.belief = self.prior.duplicate();
        self.log_evidence = 0.0;
    }

    // ------------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------------

    /// One-step prediction of `belief` under `action`. Not renormalized.
    pub fn predict(
        &self,
        belief: &Distribution<StateId>,
        action: &Action,
    ) -> Result<Distribution<StateId>> {
        self.check_action(action)?;
        self.check_belief(belief)?;

        let mut masses = vec![0.0; self.prior.len()];
        for (state, mass) in belief.iter() {
            let row = self
                .transition_model
                .row(&TransitionKey::new(state.clone(), action.clone()))
                .map_err(|e| lift(e, DomainKind::State))?;
            for (next, p) in masses.iter_mut().zip(row) {
                *next += p * mass;
            }
        }

        self.prior
            .with_masses(masses)
            .map_err(|e| lift(e, DomainKind::State))
    }

    /// Posterior of `belief` after observing `perception`, and the
    /// normalizing constant.
    fn corrected(
        &self,
        belief: &Distribution<StateId>,
        perception: &PerceptionId,
    ) -> Result<(Distribution<StateId>, f64)> {
        let col = self
            .sensor_model
            .column_position(perception)
            .map_err(|e| lift(e, DomainKind::Perception))?;

        let masses = belief
            .iter()
            .map(|(state, mass)| -> Result<f64> {
                let row = self
                    .sensor_model
                    .row(state)
                    .map_err(|e| lift(e, DomainKind::State))?;
                Ok(row[col] * mass)
            })
            .collect::<Result<Vec<f64>>>()?;

        let mut posterior = belief
            .with_masses(masses)
            .map_err(|e| lift(e, DomainKind::State))?;
        let total = posterior.total();
        posterior
            .normalize()
            .map_err(|e| lift(e, DomainKind::Perception))?;
        Ok((posterior, total))
    }

    /// Advance the belief one step under `action`.
    pub fn act(&mut self, action: &Action) -> Result<()> {
        let next = self.predict(&self.belief, action)?;
        debug!(
            action = %action,
            entropy = next.entropy(),
            "belief predicted"
        );
        self.belief = next;
        Ok(())
    }

    /// Advance the belief one step with no deliberate action.
    pub fn wait_for_perception(&mut self) -> Result<()> {
        if !self.has_wait_action() {
            return Err(Error::domain(DomainKind::Action, NO_OP_NAME));
        }
        self.act(&Action::NoOp)
    }

    /// Condition the belief on `perception`.
    ///
    /// Unknown perceptions and zero-likelihood observations fail and leave
    /// the belief unchanged.
    pub fn perception_update(&mut self, perception: &PerceptionId) -> Result<()> {
        self.check_perception(perception)?;
        let (next, total) = self.corrected(&self.belief, perception)?;
        self.log_evidence += total.ln();
        debug!(
            perception = %perception,
            likelihood = total,
            entropy = next.entropy(),
            "belief corrected"
        );
        self.belief = next;
        Ok(())
    }

    /// `act(action)` then `perception_update(perception)`, applied together.
    pub fn step(&mut self, action: &Action, perception: &PerceptionId) -> Result<()> {
        self.check_perception(perception)?;
        let predicted = self.predict(&self.belief, action)?;
        let (next, total) = self.corrected(&predicted, perception)?;
        self.log_evidence += total.ln();
        debug!(
            action = %action,
            perception = %perception,
            likelihood = total,
            "belief stepped"
        );
        self.belief = next;
        Ok(())
    }

    /// `P(perception | history) = Σ_s S(perception | s) · b(s)`.
    pub fn perception_probability(&self, perception: &PerceptionId) -> Result<f64> {
        self.check_perception(perception)?;
        let col = self
            .sensor_model
            .column_position(perception)
            .map_err(|e| lift(e, DomainKind::Perception))?;
        let terms = self
            .belief
            .iter()
            .map(|(state, mass)| {
                self.sensor_model
                    .row(state)
                    .map(|row| row[col] * mass)
                    .map_err(|e| lift(e, DomainKind::State))
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(stable_sum(terms))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn prior(&self) -> &Distribution<StateId> {
        &self.prior
    }

    pub fn belief(&self) -> &Distribution<StateId> {
        &self.belief
    }

    /// Sum of `ln P(perception | history)` over all corrections since the
    /// last reset.
    pub fn log_evidence(&self) -> f64 {
        self.log_evidence
    }

    pub fn states(&self) -> &[StateId] {
        self.prior.states()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn perceptions(&self) -> &[PerceptionId] {
        self.sensor_model.column_keys()
    }

    pub fn has_wait_action(&self) -> bool {
        self.actions.contains(&Action::NoOp)
    }

    pub fn transition_model(&self) -> &TransitionTable {
        &self.transition_model
    }

    pub fn sensor_model(&self) -> &SensorTable {
        &self.sensor_model
    }

    /// `P(next_state | state, action)`.
    pub fn transition_probability(
        &self,
        state: &StateId,
        action: &Action,
        next_state: &StateId,
    ) -> Result<f64> {
        self.check_state(state)?;
        self.check_action(action)?;
        self.transition_model
            .get(&TransitionKey::new(state.clone(), action.clone()), next_state)
            .map_err(|e| lift(e, DomainKind::State))
    }

    /// `P(perception | state)`.
    pub fn sensor_probability(&self, state: &StateId, perception: &PerceptionId) -> Result<f64> {
        self.check_perception(perception)?;
        self.sensor_model
            .get(state, perception)
            .map_err(|e| lift(e, DomainKind::State))
    }

    /// Rows of either table that do not sum to 1 within `tolerance`.
    ///
    /// Diagnostic only; filtering never calls this.
    pub fn malformed_rows(&self, tolerance: f64) -> Vec<MalformedRow> {
        let transitions = self
            .transition_model
            .malformed_rows(tolerance)
            .into_iter()
            .map(|(key, sum)| MalformedRow {
                table: TableKind::Transition,
                row: key.to_string(),
                sum,
            });
        let sensor = self
            .sensor_model
            .malformed_rows(tolerance)
            .into_iter()
            .map(|(state, sum)| MalformedRow {
                table: TableKind::Sensor,
                row: state.to_string(),
                sum,
            });
        transitions.chain(sensor).collect()
    }
}
