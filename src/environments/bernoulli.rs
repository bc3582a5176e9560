use super::dynamic::Drifting;
use super::environment::{CloneBoxedEnvironment, Environment};

use crate::errors::{ConfigurationError, EnvironmentError};
use crate::policies::{argmax, RewardKind};

use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};

/// Stationary bandit whose arms pay 1 with a fixed probability and 0 otherwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BernoulliBandit {
    probabilities: Vec<f64>,
    best_action: usize,
}

impl BernoulliBandit {
    pub fn new(probabilities: Vec<f64>) -> Result<Self, ConfigurationError> {
        if probabilities.is_empty() {
            return Err(ConfigurationError::NoArms);
        }
        if let Some((arm_id, &value)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(ConfigurationError::InvalidParameter {
                what: "probability",
                arm_id,
                value,
            });
        }

        let best_action = argmax(probabilities.iter().copied()).unwrap_or_default();
        Ok(Self {
            probabilities,
            best_action,
        })
    }

    pub fn random(n_arms: usize, rng: &mut SmallRng) -> Result<Self, ConfigurationError> {
        Self::new((0..n_arms).map(|_| Self::draw_parameter(rng)).collect())
    }

    /// Uses `probabilities` when given, which must then hold exactly `n_arms` values.
    pub fn build(
        n_arms: usize,
        probabilities: Option<Vec<f64>>,
        rng: &mut SmallRng,
    ) -> Result<Self, ConfigurationError> {
        match probabilities {
            Some(probabilities) if probabilities.len() != n_arms => {
                Err(ConfigurationError::ParameterLength {
                    what: "probability",
                    expected: n_arms,
                    actual: probabilities.len(),
                })
            }
            Some(probabilities) => Self::new(probabilities),
            None => Self::random(n_arms, rng),
        }
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

impl Drifting for BernoulliBandit {
    fn parameters(&self) -> &[f64] {
        &self.probabilities
    }

    fn set_parameter(&mut self, arm_id: usize, value: f64) {
        if let Some(p) = self.probabilities.get_mut(arm_id) {
            *p = value.clamp(0.0, 1.0);
        }
        self.best_action = argmax(self.probabilities.iter().copied()).unwrap_or_default();
    }

    fn draw_parameter(rng: &mut SmallRng) -> f64 {
        rng.random::<f64>()
    }

    fn sample(&self, arm_id: usize, rng: &mut SmallRng) -> Result<f64, EnvironmentError> {
        let p = *self
            .probabilities
            .get(arm_id)
            .ok_or(EnvironmentError::ArmNotFound(arm_id))?;

        Ok(rng.random_bool(p) as u8 as f64)
    }
}

impl CloneBoxedEnvironment for BernoulliBandit {
    fn clone_box(&self) -> Box<dyn Environment + Send> {
        Box::new(self.clone())
    }
}

impl Environment for BernoulliBandit {
    fn n_arms(&self) -> usize {
        self.probabilities.len()
    }

    fn reward_kind(&self) -> RewardKind {
        RewardKind::Binary
    }

    fn do_action(&mut self, arm_id: usize, rng: &mut SmallRng) -> Result<f64, EnvironmentError> {
        self.sample(arm_id, rng)
    }

    fn step(&mut self, _: &mut SmallRng) {}

    fn best_action(&self) -> usize {
        self.best_action
    }

    fn best_action_mean(&self) -> f64 {
        self.probabilities[self.best_action]
    }

    fn action_mean(&self, arm_id: usize) -> Result<f64, EnvironmentError> {
        self.probabilities
            .get(arm_id)
            .copied()
            .ok_or(EnvironmentError::ArmNotFound(arm_id))
    }
}
