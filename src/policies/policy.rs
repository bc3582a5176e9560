use super::discounted::DiscountedThompsonSampling;
use super::dsw::{DswThompsonSampling, Reducer};
use super::sliding_window::SlidingWindowThompsonSampling;
use super::thompson_sampling::{GaussianThompsonSampling, ThompsonSampling};

use crate::errors::{ConfigurationError, PolicyError};

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Kind of reward an environment produces, and a policy can learn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    /// Rewards in [0, 1], usually 0 or 1.
    Binary,
    /// Any real value.
    Continuous,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PolicyType {
    ThompsonSampling,
    GaussianThompsonSampling,
    DiscountedThompsonSampling { gamma: f64 },
    SlidingWindowThompsonSampling { n: usize },
    MaxDswThompsonSampling { gamma: f64, n: usize },
    MinDswThompsonSampling { gamma: f64, n: usize },
    MeanDswThompsonSampling { gamma: f64, n: usize },
}

impl PolicyType {
    pub fn into_inner(self, n_arms: usize) -> Result<Box<dyn Policy + Send>, ConfigurationError> {
        if n_arms == 0 {
            return Err(ConfigurationError::NoArms);
        }

        let policy: Box<dyn Policy + Send> = match self {
            PolicyType::ThompsonSampling => Box::new(ThompsonSampling::new(n_arms)),
            PolicyType::GaussianThompsonSampling => {
                Box::new(GaussianThompsonSampling::new(n_arms))
            }
            PolicyType::DiscountedThompsonSampling { gamma } => {
                Box::new(DiscountedThompsonSampling::new(n_arms, gamma)?)
            }
            PolicyType::SlidingWindowThompsonSampling { n } => {
                Box::new(SlidingWindowThompsonSampling::new(n_arms, n)?)
            }
            PolicyType::MaxDswThompsonSampling { gamma, n } => {
                Box::new(DswThompsonSampling::new(n_arms, gamma, n, Reducer::Max)?)
            }
            PolicyType::MinDswThompsonSampling { gamma, n } => {
                Box::new(DswThompsonSampling::new(n_arms, gamma, n, Reducer::Min)?)
            }
            PolicyType::MeanDswThompsonSampling { gamma, n } => {
                Box::new(DswThompsonSampling::new(n_arms, gamma, n, Reducer::Mean)?)
            }
        };

        Ok(policy)
    }
}

impl Clone for Box<dyn Policy + Send> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub trait CloneBoxedPolicy {
    fn clone_box(&self) -> Box<dyn Policy + Send>;
}

/// Capability shared by every learning strategy: pick an arm, then learn from its reward.
pub trait Policy: Send + CloneBoxedPolicy + fmt::Debug {
    /// Display name, used as the column header of exported results.
    fn name(&self) -> &'static str;
    fn policy_type(&self) -> PolicyType;
    fn n_arms(&self) -> usize;
    fn reward_kind(&self) -> RewardKind {
        RewardKind::Binary
    }
    fn select_action(&mut self, rng: &mut SmallRng) -> Result<usize, PolicyError>;
    fn update_estimates(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError>;
    /// Posterior mean of every arm.
    fn estimates(&self) -> Vec<f64>;
}

/// Index of the largest value, the lowest index wins on ties.
pub(crate) fn argmax<I>(values: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (arm_id, value)| match best {
            Some((_, best_value))
                if value.partial_cmp(&best_value).unwrap_or(Ordering::Less)
                    != Ordering::Greater =>
            {
                best
            }
            _ => Some((arm_id, value)),
        })
        .map(|(arm_id, _)| arm_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_lowest_index_on_ties() {
        assert_eq!(argmax(vec![0.2, 0.7, 0.7, 0.1]), Some(1));
        assert_eq!(argmax(vec![0.5, 0.5, 0.5]), Some(0));
        assert_eq!(argmax(vec![0.1, 0.3, 0.9]), Some(2));
    }

    #[test]
    fn argmax_empty() {
        assert_eq!(argmax(Vec::new()), None);
    }

    #[test]
    fn argmax_ignores_nan() {
        assert_eq!(argmax(vec![0.4, f64::NAN, 0.3]), Some(0));
    }

    #[test]
    fn build_every_policy() {
        let types = vec![
            PolicyType::ThompsonSampling,
            PolicyType::GaussianThompsonSampling,
            PolicyType::DiscountedThompsonSampling { gamma: 0.98 },
            PolicyType::SlidingWindowThompsonSampling { n: 75 },
            PolicyType::MaxDswThompsonSampling { gamma: 0.98, n: 20 },
            PolicyType::MinDswThompsonSampling { gamma: 0.98, n: 20 },
            PolicyType::MeanDswThompsonSampling { gamma: 0.98, n: 20 },
        ];

        for policy_type in types {
            let policy = policy_type.clone().into_inner(5).unwrap();
            assert_eq!(policy.n_arms(), 5);
            assert_eq!(policy.policy_type(), policy_type);
            assert_eq!(policy.estimates().len(), 5);
        }
    }

    #[test]
    fn build_rejects_invalid_parameters() {
        assert_eq!(
            PolicyType::DiscountedThompsonSampling { gamma: 1.0 }
                .into_inner(3)
                .err(),
            Some(ConfigurationError::InvalidGamma(1.0))
        );
        assert_eq!(
            PolicyType::SlidingWindowThompsonSampling { n: 0 }
                .into_inner(3)
                .err(),
            Some(ConfigurationError::InvalidWindow)
        );
        assert_eq!(
            PolicyType::ThompsonSampling.into_inner(0).err(),
            Some(ConfigurationError::NoArms)
        );
    }

    #[test]
    fn deserialize_tagged() {
        let policy_type: PolicyType =
            serde_json::from_str(r#"{"type": "MeanDswThompsonSampling", "gamma": 0.9, "n": 10}"#)
                .unwrap();
        assert_eq!(
            policy_type,
            PolicyType::MeanDswThompsonSampling { gamma: 0.9, n: 10 }
        );
    }
}
