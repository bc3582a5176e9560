use super::belief::{check_binary_reward, BetaBelief, WindowedBelief};
use super::policy::{argmax, CloneBoxedPolicy, Policy, PolicyType};

use crate::errors::{ConfigurationError, PolicyError};

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

/// Per-arm windows of the `n` most recent rewards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowedBeliefs {
    size: usize,
    arms: Vec<WindowedBelief>,
}

impl WindowedBeliefs {
    pub fn new(n_arms: usize, size: usize) -> Result<Self, ConfigurationError> {
        if size == 0 {
            return Err(ConfigurationError::InvalidWindow);
        }

        Ok(Self {
            size,
            arms: vec![WindowedBelief::new(size); n_arms],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    pub fn posterior(&self, arm_id: usize) -> Option<BetaBelief> {
        self.arms.get(arm_id).map(WindowedBelief::posterior)
    }

    pub fn samples(&self, rng: &mut SmallRng) -> Result<Vec<f64>, PolicyError> {
        self.arms
            .iter()
            .map(|arm| arm.posterior().sample(rng))
            .collect()
    }

    pub fn means(&self) -> Vec<f64> {
        self.arms.iter().map(|arm| arm.posterior().mean()).collect()
    }

    pub fn update(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        self.arms
            .get_mut(arm_id)
            .ok_or(PolicyError::ArmNotFound(arm_id))?
            .update(reward);

        Ok(())
    }
}

/// Thompson Sampling that only trusts the last `n` rewards of each arm.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlidingWindowThompsonSampling {
    windows: WindowedBeliefs,
}

impl SlidingWindowThompsonSampling {
    pub fn new(n_arms: usize, n: usize) -> Result<Self, ConfigurationError> {
        Ok(Self {
            windows: WindowedBeliefs::new(n_arms, n)?,
        })
    }

    pub fn posterior(&self, arm_id: usize) -> Option<BetaBelief> {
        self.windows.posterior(arm_id)
    }
}

impl CloneBoxedPolicy for SlidingWindowThompsonSampling {
    fn clone_box(&self) -> Box<dyn Policy + Send> {
        Box::new(self.clone())
    }
}

impl Policy for SlidingWindowThompsonSampling {
    fn name(&self) -> &'static str {
        "Sliding Window Thompson Sampling Bernoulli"
    }

    fn policy_type(&self) -> PolicyType {
        PolicyType::SlidingWindowThompsonSampling {
            n: self.windows.size(),
        }
    }

    fn n_arms(&self) -> usize {
        self.windows.len()
    }

    fn select_action(&mut self, rng: &mut SmallRng) -> Result<usize, PolicyError> {
        argmax(self.windows.samples(rng)?).ok_or(PolicyError::NoArmsAvailable)
    }

    fn update_estimates(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        self.windows.update(arm_id, check_binary_reward(reward)?)
    }

    fn estimates(&self) -> Vec<f64> {
        self.windows.means()
    }
}
