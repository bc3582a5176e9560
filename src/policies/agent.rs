use super::policy::{Policy, PolicyType};

use crate::errors::{ConfigurationError, PolicyError};

use rand::{rngs::SmallRng, Rng};

pub const RANDOM_LABEL: &str = "random";
pub const ORACLE_LABEL: &str = "Oracle";

/// Something that plays arms in a session: either the uniform random baseline, which has
/// nothing to learn, or a learning policy.
#[derive(Clone, Debug)]
pub enum Agent {
    Random,
    Algorithm(Box<dyn Policy + Send>),
}

impl Agent {
    pub fn from_policy_type(
        policy_type: PolicyType,
        n_arms: usize,
    ) -> Result<Self, ConfigurationError> {
        policy_type.into_inner(n_arms).map(Agent::Algorithm)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Agent::Random => RANDOM_LABEL,
            Agent::Algorithm(policy) => policy.name(),
        }
    }

    pub fn select_action(
        &mut self,
        n_arms: usize,
        rng: &mut SmallRng,
    ) -> Result<usize, PolicyError> {
        match self {
            Agent::Random if n_arms == 0 => Err(PolicyError::NoArmsAvailable),
            Agent::Random => Ok(rng.random_range(0..n_arms)),
            Agent::Algorithm(policy) => policy.select_action(rng),
        }
    }

    pub fn update_estimates(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        match self {
            Agent::Random => Ok(()),
            Agent::Algorithm(policy) => policy.update_estimates(arm_id, reward),
        }
    }
}

impl From<Box<dyn Policy + Send>> for Agent {
    fn from(policy: Box<dyn Policy + Send>) -> Self {
        Agent::Algorithm(policy)
    }
}
