use super::bernoulli::BernoulliBandit;
use super::dynamic::{BernoulliDynamicBandit, DriftConfig, GaussianDynamicBandit};
use super::gaussian::GaussianBandit;
use super::replay::{ReplayBandit, ReplayLog};

use crate::errors::{ConfigurationError, EnvironmentError};
use crate::policies::RewardKind;

use rand::rngs::SmallRng;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum EnvironmentType {
    Bernoulli {
        n_arms: usize,
        probabilities: Option<Vec<f64>>,
    },
    Gaussian {
        n_arms: usize,
        means: Option<Vec<f64>>,
        std_devs: Option<Vec<f64>>,
    },
    BernoulliDynamic {
        n_arms: usize,
        probabilities: Option<Vec<f64>>,
        prob_of_change: f64,
        #[serde(default)]
        fixed_action_prob: f64,
        #[serde(default)]
        save_replay: bool,
    },
    GaussianDynamic {
        n_arms: usize,
        means: Option<Vec<f64>>,
        std_devs: Option<Vec<f64>>,
        prob_of_change: f64,
        #[serde(default)]
        fixed_action_prob: f64,
        #[serde(default)]
        save_replay: bool,
    },
    BernoulliReplay {
        path: PathBuf,
    },
}

impl EnvironmentType {
    /// Builds the environment. Parameters left out of the configuration are drawn from `rng`.
    pub fn into_inner(
        self,
        rng: &mut SmallRng,
    ) -> Result<Box<dyn Environment + Send>, ConfigurationError> {
        let environment: Box<dyn Environment + Send> = match self {
            EnvironmentType::Bernoulli {
                n_arms,
                probabilities,
            } => Box::new(BernoulliBandit::build(n_arms, probabilities, rng)?),
            EnvironmentType::Gaussian {
                n_arms,
                means,
                std_devs,
            } => Box::new(GaussianBandit::build(n_arms, means, std_devs, rng)?),
            EnvironmentType::BernoulliDynamic {
                n_arms,
                probabilities,
                prob_of_change,
                fixed_action_prob,
                save_replay,
            } => Box::new(BernoulliDynamicBandit::new(
                BernoulliBandit::build(n_arms, probabilities, rng)?,
                DriftConfig {
                    prob_of_change,
                    fixed_action_prob,
                    save_replay,
                },
            )?),
            EnvironmentType::GaussianDynamic {
                n_arms,
                means,
                std_devs,
                prob_of_change,
                fixed_action_prob,
                save_replay,
            } => Box::new(GaussianDynamicBandit::new(
                GaussianBandit::build(n_arms, means, std_devs, rng)?,
                DriftConfig {
                    prob_of_change,
                    fixed_action_prob,
                    save_replay,
                },
            )?),
            EnvironmentType::BernoulliReplay { path } => {
                let replay = ReplayLog::load(&path)
                    .map_err(|err| ConfigurationError::ReplayUnavailable(err.to_string()))?;
                Box::new(ReplayBandit::new(replay)?)
            }
        };

        Ok(environment)
    }
}

impl Clone for Box<dyn Environment + Send> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub trait CloneBoxedEnvironment {
    fn clone_box(&self) -> Box<dyn Environment + Send>;
}

/// Source of rewards. An environment is queried by every agent during a step and then
/// moved to the next step with [`Environment::step`].
pub trait Environment: Send + CloneBoxedEnvironment + fmt::Debug {
    fn n_arms(&self) -> usize;
    fn reward_kind(&self) -> RewardKind;
    /// Reward for playing `arm_id` at the current step.
    fn do_action(&mut self, arm_id: usize, rng: &mut SmallRng) -> Result<f64, EnvironmentError>;
    /// Closes the current step.
    fn step(&mut self, rng: &mut SmallRng);
    fn best_action(&self) -> usize;
    fn best_action_mean(&self) -> f64;
    fn action_mean(&self, arm_id: usize) -> Result<f64, EnvironmentError>;

    /// Number of steps the environment can serve, `None` when unbounded.
    fn max_steps(&self) -> Option<usize> {
        None
    }

    fn supports_replay(&self) -> bool {
        false
    }

    /// Reward of the best arm at the current step, known only when replaying a log.
    fn oracle_reward(&self) -> Option<f64> {
        None
    }

    /// Hands over the log recorded so far, if the environment records one.
    fn take_replay(&mut self) -> Option<ReplayLog> {
        None
    }
}
