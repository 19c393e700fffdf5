//! Step scripts and belief traces.
//!
//! A script is a sequence of [`Step`]s, one per line in text form:
//!
//! ```text
//! # comments and blank lines are ignored
//! wait
//! act:push
//! perceive:SenseOpen
//! ```

use std::fmt;
use std::str::FromStr;

use hmm_common::{Action, Error, PerceptionId, Result, StateId};
use hmm_math::Distribution;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::model::HiddenMarkovModel;

/// One driver step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Advance time under a specific action.
    Act(Action),
    /// Advance time under the no-op action.
    Wait,
    /// Condition on an observation.
    Perceive(PerceptionId),
}

impl Step {
    /// Apply this step to `model`.
    pub fn apply(&self, model: &mut HiddenMarkovModel) -> Result<()> {
        match self {
            Step::Act(action) => model.act(action),
            Step::Wait => model.wait_for_perception(),
            Step::Perceive(perception) => model.perception_update(perception),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Act(action) => write!(f, "act:{}", action),
            Step::Wait => f.write_str("wait"),
            Step::Perceive(perception) => write!(f, "perceive:{}", perception),
        }
    }
}

impl FromStr for Step {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        if text == "wait" {
            return Ok(Step::Wait);
        }
        let (kind, name) = text
            .split_once(':')
            .ok_or_else(|| Error::InvalidStep(text.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidStep(text.to_string()));
        }
        match kind.trim() {
            "act" => {
                let action = match name.parse::<Action>() {
                    Ok(action) => action,
                    Err(never) => match never {},
                };
                Ok(Step::Act(action))
            }
            "perceive" | "see" => Ok(Step::Perceive(PerceptionId::from(name))),
            _ => Err(Error::InvalidStep(text.to_string())),
        }
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a script: one step per line, `#` starts a comment.
pub fn parse_script(text: &str) -> Result<Vec<Step>> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::parse::<Step>)
        .collect()
}

/// Belief after one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// 1-based step index.
    pub index: usize,
    pub step: Step,
    pub belief: Distribution<StateId>,
    pub most_likely: Option<StateId>,
    pub probability: f64,
    /// Entropy of the belief in nats.
    pub entropy: f64,
    /// Cumulative log evidence after this step.
    pub log_evidence: f64,
}

impl StepRecord {
    fn capture(index: usize, step: &Step, model: &HiddenMarkovModel) -> Self {
        let belief = model.belief().duplicate();
        let (most_likely, probability) = match belief.most_likely() {
            Some((state, p)) => (Some(state.clone()), p),
            None => (None, 0.0),
        };
        StepRecord {
            index,
            step: step.clone(),
            entropy: belief.entropy(),
            belief,
            most_likely,
            probability,
            log_evidence: model.log_evidence(),
        }
    }
}

/// The full record of a script run.
#[derive(Debug, Clone, Serialize)]
pub struct FilterTrace {
    /// Belief when the run started.
    pub initial_belief: Distribution<StateId>,
    pub steps: Vec<StepRecord>,
    pub final_belief: Distribution<StateId>,
    pub log_evidence: f64,
}

impl FilterTrace {
    /// Most likely state of the final belief.
    pub fn most_likely(&self) -> Option<(&StateId, f64)> {
        self.final_belief.most_likely()
    }
}

/// Apply `steps` in order, recording the belief after each.
///
/// The first failing step aborts the run; the model keeps the belief it had
/// before that step.
pub fn run_script(model: &mut HiddenMarkovModel, steps: &[Step]) -> Result<FilterTrace> {
    let initial_belief = model.belief().duplicate();
    let mut records = Vec::with_capacity(steps.len());

    for (i, step) in steps.iter().enumerate() {
        step.apply(model)?;
        let record = StepRecord::capture(i + 1, step, model);
        debug!(
            index = record.index,
            step = %step,
            entropy = record.entropy,
            "step applied"
        );
        records.push(record);
    }

    Ok(FilterTrace {
        initial_belief,
        steps: records,
        final_belief: model.belief().duplicate(),
        log_evidence: model.log_evidence(),
    })
}
