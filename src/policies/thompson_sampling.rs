use super::belief::{check_binary_reward, BetaBelief, GaussianBelief};
use super::policy::{argmax, CloneBoxedPolicy, Policy, PolicyType, RewardKind};

use crate::errors::PolicyError;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

/// Thompson Sampling over Bernoulli arms, every observation weighs the same forever.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThompsonSampling {
    arms: Vec<BetaBelief>,
}

impl ThompsonSampling {
    pub fn new(n_arms: usize) -> Self {
        Self {
            arms: vec![BetaBelief::default(); n_arms],
        }
    }

    pub fn belief(&self, arm_id: usize) -> Option<&BetaBelief> {
        self.arms.get(arm_id)
    }
}

impl CloneBoxedPolicy for ThompsonSampling {
    fn clone_box(&self) -> Box<dyn Policy + Send> {
        Box::new(self.clone())
    }
}

impl Policy for ThompsonSampling {
    fn name(&self) -> &'static str {
        "Thompson Sampling Bernoulli"
    }

    fn policy_type(&self) -> PolicyType {
        PolicyType::ThompsonSampling
    }

    fn n_arms(&self) -> usize {
        self.arms.len()
    }

    fn select_action(&mut self, rng: &mut SmallRng) -> Result<usize, PolicyError> {
        // sample from the beta distribution for each arm and select the arm with the best statistic
        let samples = self
            .arms
            .iter()
            .map(|arm| arm.sample(rng))
            .collect::<Result<Vec<f64>, PolicyError>>()?;

        argmax(samples).ok_or(PolicyError::NoArmsAvailable)
    }

    fn update_estimates(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        let reward = check_binary_reward(reward)?;
        self.arms
            .get_mut(arm_id)
            .ok_or(PolicyError::ArmNotFound(arm_id))?
            .update(reward);

        Ok(())
    }

    fn estimates(&self) -> Vec<f64> {
        self.arms.iter().map(BetaBelief::mean).collect()
    }
}

/// Thompson Sampling for continuous rewards with a Normal posterior per arm.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GaussianThompsonSampling {
    arms: Vec<GaussianBelief>,
}

impl GaussianThompsonSampling {
    pub fn new(n_arms: usize) -> Self {
        Self {
            arms: vec![GaussianBelief::default(); n_arms],
        }
    }
}

impl CloneBoxedPolicy for GaussianThompsonSampling {
    fn clone_box(&self) -> Box<dyn Policy + Send> {
        Box::new(self.clone())
    }
}

impl Policy for GaussianThompsonSampling {
    fn name(&self) -> &'static str {
        "Thompson Sampling Gaussian"
    }

    fn policy_type(&self) -> PolicyType {
        PolicyType::GaussianThompsonSampling
    }

    fn n_arms(&self) -> usize {
        self.arms.len()
    }

    fn reward_kind(&self) -> RewardKind {
        RewardKind::Continuous
    }

    fn select_action(&mut self, rng: &mut SmallRng) -> Result<usize, PolicyError> {
        let samples = self
            .arms
            .iter()
            .map(|arm| arm.sample(rng))
            .collect::<Result<Vec<f64>, PolicyError>>()?;

        argmax(samples).ok_or(PolicyError::NoArmsAvailable)
    }

    fn update_estimates(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        self.arms
            .get_mut(arm_id)
            .ok_or(PolicyError::ArmNotFound(arm_id))?
            .update(reward);

        Ok(())
    }

    fn estimates(&self) -> Vec<f64> {
        self.arms.iter().map(GaussianBelief::mean).collect()
    }
}
