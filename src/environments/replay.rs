use super::environment::{CloneBoxedEnvironment, Environment};

use crate::errors::{ConfigurationError, EnvironmentError, PersistenceError};
use crate::policies::{argmax, RewardKind};

use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmOutcome {
    pub parameter: f64,
    pub reward: f64,
}

/// Everything that happened on every arm during one step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayStep {
    pub outcomes: Vec<ArmOutcome>,
}

impl ReplayStep {
    /// Arm with the highest realized parameter, lowest index on ties.
    pub fn best_arm(&self) -> Option<usize> {
        argmax(self.outcomes.iter().map(|outcome| outcome.parameter))
    }
}

/// Step-indexed record of an environment, enough to replay it without any randomness.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    steps: Vec<ReplayStep>,
}

impl ReplayLog {
    pub fn new(steps: Vec<ReplayStep>) -> Self {
        Self { steps }
    }

    /// Builds a log from empirical per-period success frequencies, one row per step and one
    /// column per arm. Each arm's reward is drawn once from its frequency.
    pub fn from_frequencies(
        frequencies: &[Vec<f64>],
        rng: &mut SmallRng,
    ) -> Result<Self, ConfigurationError> {
        let mut steps = Vec::with_capacity(frequencies.len());
        for row in frequencies {
            let outcomes = row
                .iter()
                .enumerate()
                .map(|(arm_id, &parameter)| {
                    if (0.0..=1.0).contains(&parameter) {
                        Ok(ArmOutcome {
                            parameter,
                            reward: rng.random_bool(parameter) as u8 as f64,
                        })
                    } else {
                        Err(ConfigurationError::InvalidParameter {
                            what: "frequency",
                            arm_id,
                            value: parameter,
                        })
                    }
                })
                .collect::<Result<Vec<ArmOutcome>, ConfigurationError>>()?;
            steps.push(ReplayStep { outcomes });
        }

        let log = Self { steps };
        log.validate()?;
        Ok(log)
    }

    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let reader = BufReader::new(File::open(path)?);
        let log: Self = serde_json::from_reader(reader)?;
        info!(path = ?path, steps = log.len(), "Loaded replay log");
        Ok(log)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        info!(path = ?path, steps = self.len(), "Persisting replay log");
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn push(&mut self, step: ReplayStep) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }

    pub fn step(&self, step: usize) -> Option<&ReplayStep> {
        self.steps.get(step)
    }

    pub fn n_arms(&self) -> Option<usize> {
        self.steps.first().map(|step| step.outcomes.len())
    }

    /// Checks the log is non-empty and every step covers the same arms, returns their count.
    pub fn validate(&self) -> Result<usize, ConfigurationError> {
        let n_arms = self.n_arms().ok_or(ConfigurationError::EmptyReplay)?;
        if n_arms == 0 {
            return Err(ConfigurationError::NoArms);
        }
        if let Some((step, ragged)) = self
            .steps
            .iter()
            .enumerate()
            .find(|(_, step)| step.outcomes.len() != n_arms)
        {
            return Err(ConfigurationError::RaggedReplay {
                step,
                expected: n_arms,
                actual: ragged.outcomes.len(),
            });
        }
        Ok(n_arms)
    }

    fn reward_kind(&self) -> RewardKind {
        let binary = self
            .steps
            .iter()
            .flat_map(|step| step.outcomes.iter())
            .all(|outcome| outcome.reward == 0.0 || outcome.reward == 1.0);

        if binary {
            RewardKind::Binary
        } else {
            RewardKind::Continuous
        }
    }
}

/// Plays back a recorded log. Every trial gets its own cursor over the same shared log.
#[derive(Clone, Debug)]
pub struct ReplayBandit {
    log: Arc<ReplayLog>,
    n_arms: usize,
    reward_kind: RewardKind,
    cursor: usize,
}

impl ReplayBandit {
    pub fn new(log: ReplayLog) -> Result<Self, ConfigurationError> {
        Self::from_shared(Arc::new(log))
    }

    pub fn from_shared(log: Arc<ReplayLog>) -> Result<Self, ConfigurationError> {
        let n_arms = log.validate()?;
        let reward_kind = log.reward_kind();
        Ok(Self {
            log,
            n_arms,
            reward_kind,
            cursor: 0,
        })
    }

    pub fn log(&self) -> &ReplayLog {
        &self.log
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn current(&self) -> Result<&ReplayStep, EnvironmentError> {
        self.log
            .step(self.cursor)
            .ok_or(EnvironmentError::ReplayExhausted(self.cursor))
    }

    // past the end of the log the last recorded step describes the arms
    fn current_or_last(&self) -> Option<&ReplayStep> {
        self.log
            .step(self.cursor)
            .or_else(|| self.log.steps().last())
    }
}

impl CloneBoxedEnvironment for ReplayBandit {
    fn clone_box(&self) -> Box<dyn Environment + Send> {
        Box::new(self.clone())
    }
}

impl Environment for ReplayBandit {
    fn n_arms(&self) -> usize {
        self.n_arms
    }

    fn reward_kind(&self) -> RewardKind {
        self.reward_kind
    }

    fn do_action(&mut self, arm_id: usize, _: &mut SmallRng) -> Result<f64, EnvironmentError> {
        self.current()?
            .outcomes
            .get(arm_id)
            .map(|outcome| outcome.reward)
            .ok_or(EnvironmentError::ArmNotFound(arm_id))
    }

    fn step(&mut self, _: &mut SmallRng) {
        self.cursor += 1;
    }

    fn best_action(&self) -> usize {
        self.current_or_last()
            .and_then(ReplayStep::best_arm)
            .unwrap_or_default()
    }

    fn best_action_mean(&self) -> f64 {
        self.current_or_last()
            .and_then(|step| step.best_arm().map(|arm_id| step.outcomes[arm_id].parameter))
            .unwrap_or_default()
    }

    fn action_mean(&self, arm_id: usize) -> Result<f64, EnvironmentError> {
        self.current_or_last()
            .and_then(|step| step.outcomes.get(arm_id))
            .map(|outcome| outcome.parameter)
            .ok_or(EnvironmentError::ArmNotFound(arm_id))
    }

    fn max_steps(&self) -> Option<usize> {
        Some(self.log.len())
    }

    fn supports_replay(&self) -> bool {
        true
    }

    fn oracle_reward(&self) -> Option<f64> {
        let step = self.log.step(self.cursor)?;
        step.best_arm()
            .map(|arm_id| step.outcomes[arm_id].reward)
    }
}
