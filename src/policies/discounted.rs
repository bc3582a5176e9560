use super::belief::{check_binary_reward, BetaBelief};
use super::policy::{argmax, CloneBoxedPolicy, Policy, PolicyType};

use crate::errors::{ConfigurationError, PolicyError};

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

pub(crate) fn check_gamma(gamma: f64) -> Result<f64, ConfigurationError> {
    if gamma > 0.0 && gamma < 1.0 {
        Ok(gamma)
    } else {
        Err(ConfigurationError::InvalidGamma(gamma))
    }
}

/// Beta posteriors for every arm, geometrically forgotten at each update.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscountedBeliefs {
    gamma: f64,
    arms: Vec<BetaBelief>,
}

impl DiscountedBeliefs {
    pub fn new(n_arms: usize, gamma: f64) -> Result<Self, ConfigurationError> {
        Ok(Self {
            gamma: check_gamma(gamma)?,
            arms: vec![BetaBelief::default(); n_arms],
        })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    pub fn belief(&self, arm_id: usize) -> Option<&BetaBelief> {
        self.arms.get(arm_id)
    }

    pub fn samples(&self, rng: &mut SmallRng) -> Result<Vec<f64>, PolicyError> {
        self.arms.iter().map(|arm| arm.sample(rng)).collect()
    }

    pub fn means(&self) -> Vec<f64> {
        self.arms.iter().map(BetaBelief::mean).collect()
    }

    pub fn update(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        if arm_id >= self.arms.len() {
            return Err(PolicyError::ArmNotFound(arm_id));
        }

        // apply discount to all arms, played or not
        let gamma = self.gamma;
        self.arms.iter_mut().for_each(|arm| arm.decay(gamma));
        self.arms[arm_id].update(reward);

        Ok(())
    }
}

/// Thompson Sampling whose evidence fades by a factor `gamma` every step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscountedThompsonSampling {
    beliefs: DiscountedBeliefs,
}

impl DiscountedThompsonSampling {
    pub fn new(n_arms: usize, gamma: f64) -> Result<Self, ConfigurationError> {
        Ok(Self {
            beliefs: DiscountedBeliefs::new(n_arms, gamma)?,
        })
    }

    pub fn belief(&self, arm_id: usize) -> Option<&BetaBelief> {
        self.beliefs.belief(arm_id)
    }
}

impl CloneBoxedPolicy for DiscountedThompsonSampling {
    fn clone_box(&self) -> Box<dyn Policy + Send> {
        Box::new(self.clone())
    }
}

impl Policy for DiscountedThompsonSampling {
    fn name(&self) -> &'static str {
        "Discounted Thompson Sampling Bernoulli"
    }

    fn policy_type(&self) -> PolicyType {
        PolicyType::DiscountedThompsonSampling {
            gamma: self.beliefs.gamma(),
        }
    }

    fn n_arms(&self) -> usize {
        self.beliefs.len()
    }

    fn select_action(&mut self, rng: &mut SmallRng) -> Result<usize, PolicyError> {
        argmax(self.beliefs.samples(rng)?).ok_or(PolicyError::NoArmsAvailable)
    }

    fn update_estimates(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        self.beliefs.update(arm_id, check_binary_reward(reward)?)
    }

    fn estimates(&self) -> Vec<f64> {
        self.beliefs.means()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn total(policy: &DiscountedThompsonSampling, arm_id: usize) -> f64 {
        policy
            .belief(arm_id)
            .map(|arm| arm.alpha() + arm.beta())
            .unwrap_or_default()
    }

    #[test]
    fn invalid_gamma() {
        for gamma in [0.0, 1.0, -0.3, 1.2, f64::NAN] {
            assert!(DiscountedThompsonSampling::new(2, gamma).is_err());
        }
        assert!(DiscountedThompsonSampling::new(2, 0.5).is_ok());
    }

    #[test]
    fn decay_applies_to_every_arm() {
        let mut policy = DiscountedThompsonSampling::new(2, 0.5).unwrap();
        policy.update_estimates(0, 1.0).unwrap();
        policy.update_estimates(1, 0.0).unwrap();

        // arm 0 went (1, 1) -> (2, 1) -> (1.5, 1)
        let arm = policy.belief(0).unwrap();
        assert!((arm.alpha() - 1.5).abs() < EPS);
        assert!((arm.beta() - 1.0).abs() < EPS);

        let arm = policy.belief(1).unwrap();
        assert!((arm.alpha() - 1.0).abs() < EPS);
        assert!((arm.beta() - 2.0).abs() < EPS);
    }

    #[test]
    fn net_growth_below_one() {
        let mut policy = DiscountedThompsonSampling::new(2, 0.9).unwrap();
        policy.update_estimates(0, 1.0).unwrap();
        for _ in 0..10 {
            let before = total(&policy, 0);
            policy.update_estimates(0, 1.0).unwrap();
            let after = total(&policy, 0);
            assert!(after - before < 1.0);
            assert!(after > before);
        }
    }

    #[test]
    fn unplayed_arm_forgets() {
        let mut policy = DiscountedThompsonSampling::new(2, 0.9).unwrap();
        for _ in 0..5 {
            policy.update_estimates(0, 1.0).unwrap();
        }
        let mut previous = total(&policy, 0);
        for _ in 0..20 {
            policy.update_estimates(1, 0.0).unwrap();
            let current = total(&policy, 0);
            assert!(current < previous);
            previous = current;
        }
    }

    #[test]
    fn small_gamma_trusts_last_observation() {
        let mut policy = DiscountedThompsonSampling::new(1, 1e-6).unwrap();
        for _ in 0..50 {
            policy.update_estimates(0, 0.0).unwrap();
        }
        policy.update_estimates(0, 1.0).unwrap();
        let arm = policy.belief(0).unwrap();
        assert!((arm.alpha() - 2.0).abs() < 1e-4);
        assert!((arm.beta() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn update_unknown_arm() {
        let mut policy = DiscountedThompsonSampling::new(2, 0.9).unwrap();
        assert_eq!(
            policy.update_estimates(5, 1.0),
            Err(PolicyError::ArmNotFound(5))
        );
        assert!((total(&policy, 0) - 2.0).abs() < EPS);
    }
}
