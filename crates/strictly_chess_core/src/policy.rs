//! Inference endpoint for the agent.
//!
//! The controller only needs [`Policy::predict`]. Continual learning adds
//! [`Policy::train_step`] and [`Policy::save`]. [`TabularPolicy`] is the
//! bundled implementation: a per-observation action-value table persisted as
//! a JSON checkpoint.

use crate::action::ACTION_SPACE_SIZE;
use crate::observation::Observation;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// One step of experience for a training update.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation the action was chosen from.
    pub observation: Observation,
    /// Action index the policy produced.
    pub action: usize,
    /// Reward from the agent's side.
    pub reward: f32,
    /// True if the move ended the game.
    pub done: bool,
}

/// Maps observations to action indices.
pub trait Policy {
    /// Deterministic action for an observation.
    fn predict(&self, observation: &Observation) -> usize;

    /// One online update. Policies that cannot learn ignore it.
    fn train_step(&mut self, _transition: &Transition) -> Result<(), PolicyError> {
        Ok(())
    }

    /// Writes a checkpoint to `path`.
    fn save(&self, path: &Path) -> Result<(), PolicyError> {
        Err(PolicyError::new(format!(
            "Policy does not support checkpoints: {}",
            path.display()
        )))
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn predict(&self, observation: &Observation) -> usize {
        (**self).predict(observation)
    }

    fn train_step(&mut self, transition: &Transition) -> Result<(), PolicyError> {
        (**self).train_step(transition)
    }

    fn save(&self, path: &Path) -> Result<(), PolicyError> {
        (**self).save(path)
    }
}

/// Policy failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Policy error: {} at {}:{}", message, file, line)]
pub struct PolicyError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl PolicyError {
    /// Creates a new policy error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

fn default_learning_rate() -> f32 {
    0.1
}

/// Action-value table keyed by observation fingerprint.
///
/// Unseen observations map to `fingerprint % ACTION_SPACE_SIZE`, which keeps
/// a fresh policy deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularPolicy {
    #[serde(default = "default_learning_rate")]
    learning_rate: f32,
    #[serde(default)]
    updates: u64,
    #[serde(default)]
    values: HashMap<u64, HashMap<usize, f32>>,
}

impl TabularPolicy {
    /// Untrained policy.
    #[instrument]
    pub fn fresh() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            updates: 0,
            values: HashMap::new(),
        }
    }

    /// Untrained policy with a custom step size.
    pub fn with_learning_rate(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            ..Self::fresh()
        }
    }

    /// Reads a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PolicyError::new(format!("Failed to read checkpoint: {}", e)))?;
        let policy: Self = serde_json::from_str(&content)
            .map_err(|e| PolicyError::new(format!("Failed to parse checkpoint: {}", e)))?;
        info!(
            states = policy.values.len(),
            updates = policy.updates,
            "Checkpoint loaded"
        );
        Ok(policy)
    }

    /// Reads a checkpoint, falling back to a fresh policy on any failure.
    ///
    /// The flag is true when the checkpoint was actually loaded.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_fresh(path: impl AsRef<Path>) -> (Self, bool) {
        match Self::load(path.as_ref()) {
            Ok(policy) => (policy, true),
            Err(e) => {
                warn!(error = %e, "Could not load policy, starting untrained");
                (Self::fresh(), false)
            }
        }
    }

    /// Number of observations with learned values.
    pub fn states(&self) -> usize {
        self.values.len()
    }

    /// Number of training steps applied.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl Default for TabularPolicy {
    fn default() -> Self {
        Self::fresh()
    }
}

impl Policy for TabularPolicy {
    fn predict(&self, observation: &Observation) -> usize {
        let key = observation.fingerprint();
        let learned = self.values.get(&key).and_then(|actions| {
            actions
                .iter()
                .max_by(|(ia, va), (ib, vb)| va.total_cmp(vb).then_with(|| ib.cmp(ia)))
                .map(|(index, _)| *index)
        });
        learned.unwrap_or((key % ACTION_SPACE_SIZE as u64) as usize)
    }

    #[instrument(skip(self, transition), fields(action = transition.action, reward = transition.reward))]
    fn train_step(&mut self, transition: &Transition) -> Result<(), PolicyError> {
        if transition.action >= ACTION_SPACE_SIZE {
            return Err(PolicyError::new(format!(
                "Action {} outside action space",
                transition.action
            )));
        }
        let key = transition.observation.fingerprint();
        let value = self
            .values
            .entry(key)
            .or_default()
            .entry(transition.action)
            .or_insert(0.0);
        *value += self.learning_rate * (transition.reward - *value);
        self.updates += 1;
        debug!(value = *value, updates = self.updates, "Policy updated");
        Ok(())
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn save(&self, path: &Path) -> Result<(), PolicyError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| PolicyError::new(format!("Failed to create checkpoint dir: {}", e)))?;
        }
        let content = serde_json::to_string(self)
            .map_err(|e| PolicyError::new(format!("Failed to serialize policy: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| PolicyError::new(format!("Failed to write checkpoint: {}", e)))?;
        debug!("Checkpoint saved");
        Ok(())
    }
}
