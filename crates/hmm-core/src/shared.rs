//! A model shared between threads behind a single lock.
//!
//! Each stepping operation reads the belief and replaces it while holding
//! the lock. Replacement is a single assignment, so a poisoned lock still
//! guards a whole belief and is recovered rather than propagated.

use std::sync::{Arc, Mutex, MutexGuard};

use hmm_common::{Action, PerceptionId, Result, StateId};
use hmm_math::Distribution;

use crate::model::HiddenMarkovModel;

/// Cloneable handle to a mutex-guarded [`HiddenMarkovModel`].
#[derive(Debug, Clone)]
pub struct SharedModel {
    inner: Arc<Mutex<HiddenMarkovModel>>,
}

impl SharedModel {
    pub fn new(model: HiddenMarkovModel) -> Self {
        SharedModel {
            inner: Arc::new(Mutex::new(model)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HiddenMarkovModel> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn act(&self, action: &Action) -> Result<()> {
        self.lock().act(action)
    }

    pub fn wait_for_perception(&self) -> Result<()> {
        self.lock().wait_for_perception()
    }

    pub fn perception_update(&self, perception: &PerceptionId) -> Result<()> {
        self.lock().perception_update(perception)
    }

    pub fn step(&self, action: &Action, perception: &PerceptionId) -> Result<()> {
        self.lock().step(action, perception)
    }

    pub fn reset(&self) {
        self.lock().reset()
    }

    /// Snapshot of the current belief.
    pub fn belief(&self) -> Distribution<StateId> {
        self.lock().belief().duplicate()
    }

    pub fn log_evidence(&self) -> f64 {
        self.lock().log_evidence()
    }

    /// Run `f` with exclusive access to the model.
    pub fn with<R>(&self, f: impl FnOnce(&mut HiddenMarkovModel) -> R) -> R {
        f(&mut self.lock())
    }
}

impl From<HiddenMarkovModel> for SharedModel {
    fn from(model: HiddenMarkovModel) -> Self {
        SharedModel::new(model)
    }
}
