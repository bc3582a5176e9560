use super::dynamic::Drifting;
use super::environment::{CloneBoxedEnvironment, Environment};

use crate::errors::{ConfigurationError, EnvironmentError};
use crate::policies::{argmax, RewardKind};

use rand::{rngs::SmallRng, Rng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

const DEFAULT_STD_DEV: f64 = 1.0;

/// Stationary bandit whose arms pay a normally distributed reward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GaussianBandit {
    means: Vec<f64>,
    std_devs: Vec<f64>,
    best_action: usize,
}

impl GaussianBandit {
    pub fn new(means: Vec<f64>, std_devs: Vec<f64>) -> Result<Self, ConfigurationError> {
        if means.is_empty() {
            return Err(ConfigurationError::NoArms);
        }
        if std_devs.len() != means.len() {
            return Err(ConfigurationError::ParameterLength {
                what: "standard deviation",
                expected: means.len(),
                actual: std_devs.len(),
            });
        }
        if let Some((arm_id, &value)) = means.iter().enumerate().find(|(_, m)| !m.is_finite()) {
            return Err(ConfigurationError::InvalidParameter {
                what: "mean",
                arm_id,
                value,
            });
        }
        if let Some((arm_id, &value)) = std_devs
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(ConfigurationError::InvalidParameter {
                what: "standard deviation",
                arm_id,
                value,
            });
        }

        let best_action = argmax(means.iter().copied()).unwrap_or_default();
        Ok(Self {
            means,
            std_devs,
            best_action,
        })
    }

    /// Uses the given means and standard deviations when present, each of which must then
    /// hold exactly `n_arms` values. Missing means are drawn uniformly from [0, 1).
    pub fn build(
        n_arms: usize,
        means: Option<Vec<f64>>,
        std_devs: Option<Vec<f64>>,
        rng: &mut SmallRng,
    ) -> Result<Self, ConfigurationError> {
        let means = match means {
            Some(means) if means.len() != n_arms => {
                return Err(ConfigurationError::ParameterLength {
                    what: "mean",
                    expected: n_arms,
                    actual: means.len(),
                })
            }
            Some(means) => means,
            None => (0..n_arms).map(|_| Self::draw_parameter(rng)).collect(),
        };
        let std_devs = std_devs.unwrap_or_else(|| vec![DEFAULT_STD_DEV; n_arms]);

        Self::new(means, std_devs)
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn std_devs(&self) -> &[f64] {
        &self.std_devs
    }
}

impl Drifting for GaussianBandit {
    fn parameters(&self) -> &[f64] {
        &self.means
    }

    fn set_parameter(&mut self, arm_id: usize, value: f64) {
        if let Some(mean) = self.means.get_mut(arm_id) {
            *mean = value;
        }
        self.best_action = argmax(self.means.iter().copied()).unwrap_or_default();
    }

    fn draw_parameter(rng: &mut SmallRng) -> f64 {
        rng.random::<f64>()
    }

    fn sample(&self, arm_id: usize, rng: &mut SmallRng) -> Result<f64, EnvironmentError> {
        let (mean, std_dev) = self
            .means
            .get(arm_id)
            .zip(self.std_devs.get(arm_id))
            .ok_or(EnvironmentError::ArmNotFound(arm_id))?;

        let s = Normal::new(*mean, *std_dev)
            .map_err(|e| EnvironmentError::SamplingError(e.to_string()))?
            .sample(rng);

        Ok(s)
    }
}

impl CloneBoxedEnvironment for GaussianBandit {
    fn clone_box(&self) -> Box<dyn Environment + Send> {
        Box::new(self.clone())
    }
}

impl Environment for GaussianBandit {
    fn n_arms(&self) -> usize {
        self.means.len()
    }

    fn reward_kind(&self) -> RewardKind {
        RewardKind::Continuous
    }

    fn do_action(&mut self, arm_id: usize, rng: &mut SmallRng) -> Result<f64, EnvironmentError> {
        self.sample(arm_id, rng)
    }

    fn step(&mut self, _: &mut SmallRng) {}

    fn best_action(&self) -> usize {
        self.best_action
    }

    fn best_action_mean(&self) -> f64 {
        self.means[self.best_action]
    }

    fn action_mean(&self, arm_id: usize) -> Result<f64, EnvironmentError> {
        self.means
            .get(arm_id)
            .copied()
            .ok_or(EnvironmentError::ArmNotFound(arm_id))
    }
}
