use super::belief::check_binary_reward;
use super::discounted::DiscountedBeliefs;
use super::policy::{argmax, CloneBoxedPolicy, Policy, PolicyType};
use super::sliding_window::WindowedBeliefs;

use crate::errors::{ConfigurationError, PolicyError};

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

/// How the discounted and the windowed estimate of an arm are fused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reducer {
    Max,
    Min,
    Mean,
}

impl Reducer {
    pub fn reduce(self, discounted: f64, windowed: f64) -> f64 {
        match self {
            Reducer::Max => discounted.max(windowed),
            Reducer::Min => discounted.min(windowed),
            Reducer::Mean => (discounted + windowed) / 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombinedEstimate {
    pub discounted: f64,
    pub windowed: f64,
    pub combined: f64,
}

/// Discounted-sliding-window Thompson Sampling. Both sub-models see every reward, each arm
/// is scored by reducing one sample from each of them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DswThompsonSampling {
    reducer: Reducer,
    discounted: DiscountedBeliefs,
    windowed: WindowedBeliefs,
}

impl DswThompsonSampling {
    pub fn new(
        n_arms: usize,
        gamma: f64,
        n: usize,
        reducer: Reducer,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            reducer,
            discounted: DiscountedBeliefs::new(n_arms, gamma)?,
            windowed: WindowedBeliefs::new(n_arms, n)?,
        })
    }

    pub fn reducer(&self) -> Reducer {
        self.reducer
    }

    pub fn combined_estimates(
        &self,
        rng: &mut SmallRng,
    ) -> Result<Vec<CombinedEstimate>, PolicyError> {
        let discounted = self.discounted.samples(rng)?;
        let windowed = self.windowed.samples(rng)?;

        Ok(discounted
            .into_iter()
            .zip(windowed)
            .map(|(discounted, windowed)| CombinedEstimate {
                discounted,
                windowed,
                combined: self.reducer.reduce(discounted, windowed),
            })
            .collect())
    }
}

impl CloneBoxedPolicy for DswThompsonSampling {
    fn clone_box(&self) -> Box<dyn Policy + Send> {
        Box::new(self.clone())
    }
}

impl Policy for DswThompsonSampling {
    fn name(&self) -> &'static str {
        match self.reducer {
            Reducer::Max => "Max d-sw TS Bernoulli",
            Reducer::Min => "Min d-sw TS Bernoulli",
            Reducer::Mean => "Mean d-sw TS Bernoulli",
        }
    }

    fn policy_type(&self) -> PolicyType {
        let gamma = self.discounted.gamma();
        let n = self.windowed.size();
        match self.reducer {
            Reducer::Max => PolicyType::MaxDswThompsonSampling { gamma, n },
            Reducer::Min => PolicyType::MinDswThompsonSampling { gamma, n },
            Reducer::Mean => PolicyType::MeanDswThompsonSampling { gamma, n },
        }
    }

    fn n_arms(&self) -> usize {
        self.discounted.len()
    }

    fn select_action(&mut self, rng: &mut SmallRng) -> Result<usize, PolicyError> {
        let estimates = self.combined_estimates(rng)?;
        argmax(estimates.iter().map(|estimate| estimate.combined))
            .ok_or(PolicyError::NoArmsAvailable)
    }

    fn update_estimates(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        let reward = check_binary_reward(reward)?;
        if arm_id >= self.n_arms() {
            return Err(PolicyError::ArmNotFound(arm_id));
        }
        self.discounted.update(arm_id, reward)?;
        self.windowed.update(arm_id, reward)
    }

    fn estimates(&self) -> Vec<f64> {
        self.discounted
            .means()
            .into_iter()
            .zip(self.windowed.means())
            .map(|(discounted, windowed)| self.reducer.reduce(discounted, windowed))
            .collect()
    }
}
