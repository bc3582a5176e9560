use crate::errors::PolicyError;

use rand::Rng;
use rand_distr::{Beta, Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Beta posterior over the success probability of one arm, stored as pseudo-counts on top
/// of the uniform Beta(1, 1) prior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BetaBelief {
    pub(crate) alpha: f64,
    pub(crate) beta: f64,
}

impl Default for BetaBelief {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }
}

impl BetaBelief {
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, PolicyError> {
        let s = Beta::new(self.alpha, self.beta)
            .map_err(|e| PolicyError::SamplingError(e.to_string()))?
            .sample(rng);

        Ok(s)
    }

    pub fn update(&mut self, reward: f64) {
        self.alpha += reward;
        self.beta += 1.0 - reward;
    }

    // shrink the evidence towards the prior, the (1, 1) floor is never crossed
    pub fn decay(&mut self, gamma: f64) {
        self.alpha = 1.0 + gamma * (self.alpha - 1.0);
        self.beta = 1.0 + gamma * (self.beta - 1.0);
    }
}

/// Last `n` rewards observed for one arm. The success sum is kept alongside the ring so the
/// posterior never needs a rescan.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowedBelief {
    size: usize,
    rewards: VecDeque<f64>,
    successes: f64,
}

impl WindowedBelief {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            rewards: VecDeque::with_capacity(size),
            successes: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn successes(&self) -> f64 {
        self.successes
    }

    pub fn failures(&self) -> f64 {
        self.rewards.len() as f64 - self.successes
    }

    pub fn posterior(&self) -> BetaBelief {
        BetaBelief {
            alpha: 1.0 + self.successes,
            beta: 1.0 + self.failures(),
        }
    }

    pub fn update(&mut self, reward: f64) {
        if self.rewards.len() == self.size {
            if let Some(evicted) = self.rewards.pop_front() {
                self.successes -= evicted;
            }
        }
        self.rewards.push_back(reward);
        self.successes += reward;
    }
}

/// Running mean of a continuous reward with a Normal posterior whose spread shrinks with
/// the number of observations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GaussianBelief {
    mean: f64,
    count: u64,
}

impl GaussianBelief {
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, PolicyError> {
        let std_dev = 1.0 / ((self.count + 1) as f64).sqrt();
        let s = Normal::new(self.mean, std_dev)
            .map_err(|e| PolicyError::SamplingError(e.to_string()))?
            .sample(rng);

        Ok(s)
    }

    pub fn update(&mut self, reward: f64) {
        self.count += 1;
        self.mean += (reward - self.mean) / (self.count as f64);
    }
}

pub(crate) fn check_binary_reward(reward: f64) -> Result<f64, PolicyError> {
    if (0.0..=1.0).contains(&reward) {
        Ok(reward)
    } else {
        Err(PolicyError::InvalidReward(reward))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    const EPS: f64 = 1e-9;
    const DEFAULT_SEED: u64 = 1234;

    #[test]
    fn update_adds_one_observation() {
        let mut belief = BetaBelief::default();
        belief.update(1.0);
        belief.update(0.0);
        belief.update(1.0);
        assert_eq!(belief.alpha(), 3.0);
        assert_eq!(belief.beta(), 2.0);
        assert!((belief.alpha() + belief.beta() - 5.0).abs() < EPS);
    }

    #[test]
    fn decay_keeps_prior_floor() {
        let mut belief = BetaBelief::default();
        belief.decay(0.5);
        assert_eq!(belief, BetaBelief::default());

        belief.update(1.0);
        belief.update(1.0);
        belief.decay(0.5);
        assert!((belief.alpha() - 2.0).abs() < EPS);
        assert!((belief.beta() - 1.0).abs() < EPS);
    }

    #[test]
    fn sample_lies_in_unit_interval() {
        let mut rng = SmallRng::seed_from_u64(DEFAULT_SEED);
        let belief = BetaBelief {
            alpha: 3.0,
            beta: 7.0,
        };
        for _ in 0..100 {
            let s = belief.sample(&mut rng).unwrap();
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn window_evicts_oldest() {
        let mut window = WindowedBelief::new(3);
        window.update(1.0);
        window.update(0.0);
        window.update(0.0);
        assert_eq!(window.successes(), 1.0);

        window.update(0.0);
        assert_eq!(window.len(), 3);
        assert_eq!(window.successes(), 0.0);
        assert_eq!(window.failures(), 3.0);
        assert_eq!(
            window.posterior(),
            BetaBelief {
                alpha: 1.0,
                beta: 4.0
            }
        );
    }

    #[test]
    fn window_never_exceeds_size() {
        let mut window = WindowedBelief::new(5);
        for i in 0..50 {
            window.update((i % 2) as f64);
            assert!(window.len() <= 5);
        }
    }

    #[test]
    fn gaussian_running_mean() {
        let mut belief = GaussianBelief::default();
        belief.update(2.0);
        belief.update(4.0);
        assert_eq!(belief.count(), 2);
        assert!((belief.mean() - 3.0).abs() < EPS);
    }

    #[test]
    fn binary_reward_check() {
        assert!(check_binary_reward(0.0).is_ok());
        assert!(check_binary_reward(1.0).is_ok());
        assert_eq!(
            check_binary_reward(1.5),
            Err(PolicyError::InvalidReward(1.5))
        );
    }
}
