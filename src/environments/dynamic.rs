use super::bernoulli::BernoulliBandit;
use super::environment::{CloneBoxedEnvironment, Environment};
use super::gaussian::GaussianBandit;
use super::replay::{ArmOutcome, ReplayLog, ReplayStep};

use crate::errors::{ConfigurationError, EnvironmentError};
use crate::policies::RewardKind;

use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stationary bandit whose per-arm parameter can be overwritten while a trial runs.
pub trait Drifting: Clone + fmt::Debug + Send + 'static {
    fn parameters(&self) -> &[f64];
    fn set_parameter(&mut self, arm_id: usize, value: f64);
    /// Fresh parameter for an arm that changes.
    fn draw_parameter(rng: &mut SmallRng) -> f64;
    fn sample(&self, arm_id: usize, rng: &mut SmallRng) -> Result<f64, EnvironmentError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Per step and per arm probability that the arm gets a new parameter.
    pub prob_of_change: f64,
    /// Probability that a change hitting the current best arm is skipped.
    #[serde(default)]
    pub fixed_action_prob: f64,
    /// Record realized parameters and rewards so the run can be replayed.
    #[serde(default)]
    pub save_replay: bool,
}

impl DriftConfig {
    fn validate(self) -> Result<Self, ConfigurationError> {
        for (name, value) in [
            ("prob_of_change", self.prob_of_change),
            ("fixed_action_prob", self.fixed_action_prob),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::InvalidProbability { name, value });
            }
        }
        Ok(self)
    }
}

pub type BernoulliDynamicBandit = DynamicBandit<BernoulliBandit>;
pub type GaussianDynamicBandit = DynamicBandit<GaussianBandit>;

/// Bandit whose arms drift over time, independently of what the agents play.
///
/// When recording, every step realizes one reward per arm up front. All agents acting
/// during that step observe those realizations, and they are appended to the replay log
/// together with the parameters that produced them.
#[derive(Clone, Debug)]
pub struct DynamicBandit<B> {
    arms: B,
    config: DriftConfig,
    realized: Option<Vec<f64>>,
    replay: Option<ReplayLog>,
}

impl<B> DynamicBandit<B>
where
    B: Drifting + Environment,
{
    pub fn new(arms: B, config: DriftConfig) -> Result<Self, ConfigurationError> {
        let config = config.validate()?;
        Ok(Self {
            arms,
            config,
            realized: None,
            replay: config.save_replay.then(ReplayLog::default),
        })
    }

    pub fn arms(&self) -> &B {
        &self.arms
    }

    pub fn config(&self) -> DriftConfig {
        self.config
    }

    pub fn replay(&self) -> Option<&ReplayLog> {
        self.replay.as_ref()
    }

    fn realize(&mut self, rng: &mut SmallRng) -> Result<&[f64], EnvironmentError> {
        if self.realized.is_none() {
            let parameters = self.arms.parameters().to_vec();
            let rewards = (0..parameters.len())
                .map(|arm_id| self.arms.sample(arm_id, rng))
                .collect::<Result<Vec<f64>, EnvironmentError>>()?;

            if let Some(replay) = self.replay.as_mut() {
                replay.push(ReplayStep {
                    outcomes: parameters
                        .into_iter()
                        .zip(&rewards)
                        .map(|(parameter, &reward)| ArmOutcome { parameter, reward })
                        .collect(),
                });
            }
            self.realized = Some(rewards);
        }

        Ok(self.realized.as_deref().unwrap_or_default())
    }

    fn drift(&mut self, rng: &mut SmallRng) {
        // no draw at all without drift, keeps the stream aligned with the stationary bandit
        if self.config.prob_of_change <= 0.0 {
            return;
        }

        for arm_id in 0..self.arms.n_arms() {
            if !rng.random_bool(self.config.prob_of_change) {
                continue;
            }
            if arm_id == self.arms.best_action()
                && self.config.fixed_action_prob > 0.0
                && rng.random_bool(self.config.fixed_action_prob)
            {
                continue;
            }
            let value = B::draw_parameter(rng);
            self.arms.set_parameter(arm_id, value);
        }
    }
}

impl<B> CloneBoxedEnvironment for DynamicBandit<B>
where
    B: Drifting + Environment,
{
    fn clone_box(&self) -> Box<dyn Environment + Send> {
        Box::new(self.clone())
    }
}

impl<B> Environment for DynamicBandit<B>
where
    B: Drifting + Environment,
{
    fn n_arms(&self) -> usize {
        self.arms.n_arms()
    }

    fn reward_kind(&self) -> RewardKind {
        self.arms.reward_kind()
    }

    fn do_action(&mut self, arm_id: usize, rng: &mut SmallRng) -> Result<f64, EnvironmentError> {
        if self.replay.is_none() {
            return self.arms.sample(arm_id, rng);
        }

        self.realize(rng)?
            .get(arm_id)
            .copied()
            .ok_or(EnvironmentError::ArmNotFound(arm_id))
    }

    fn step(&mut self, rng: &mut SmallRng) {
        // a step nobody played is still recorded
        if self.replay.is_some() {
            let _ = self.realize(rng);
        }
        self.realized = None;
        self.drift(rng);
    }

    fn best_action(&self) -> usize {
        self.arms.best_action()
    }

    fn best_action_mean(&self) -> f64 {
        self.arms.best_action_mean()
    }

    fn action_mean(&self, arm_id: usize) -> Result<f64, EnvironmentError> {
        self.arms.action_mean(arm_id)
    }

    fn take_replay(&mut self) -> Option<ReplayLog> {
        self.replay.as_mut().map(std::mem::take)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const DEFAULT_SEED: u64 = 1234;

    fn drift(prob_of_change: f64, fixed_action_prob: f64, save_replay: bool) -> DriftConfig {
        DriftConfig {
            prob_of_change,
            fixed_action_prob,
            save_replay,
        }
    }

    fn make_bandit(config: DriftConfig) -> BernoulliDynamicBandit {
        DynamicBandit::new(
            BernoulliBandit::new(vec![0.2, 0.5, 0.8]).unwrap(),
            config,
        )
        .unwrap()
    }

    #[test]
    fn invalid_probabilities() {
        let arms = BernoulliBandit::new(vec![0.5]).unwrap();
        assert_eq!(
            DynamicBandit::new(arms.clone(), drift(1.2, 0.0, false)).err(),
            Some(ConfigurationError::InvalidProbability {
                name: "prob_of_change",
                value: 1.2
            })
        );
        assert!(DynamicBandit::new(arms, drift(0.1, -0.1, false)).is_err());
    }

    #[test]
    fn no_change_matches_stationary() {
        let mut stationary = BernoulliBandit::new(vec![0.2, 0.5, 0.8]).unwrap();
        let mut dynamic = make_bandit(drift(0.0, 0.0, false));
        let mut rng_a = SmallRng::seed_from_u64(DEFAULT_SEED);
        let mut rng_b = SmallRng::seed_from_u64(DEFAULT_SEED);

        for step in 0..2000 {
            let arm_id = step % 3;
            assert_eq!(
                stationary.do_action(arm_id, &mut rng_a),
                dynamic.do_action(arm_id, &mut rng_b)
            );
            stationary.step(&mut rng_a);
            dynamic.step(&mut rng_b);
        }
        assert_eq!(dynamic.arms().probabilities(), &[0.2, 0.5, 0.8]);
    }

    #[test]
    fn certain_change_redraws_every_arm() {
        let mut rng = SmallRng::seed_from_u64(DEFAULT_SEED);
        let mut bandit = make_bandit(drift(1.0, 0.0, false));
        bandit.step(&mut rng);
        let probabilities = bandit.arms().probabilities();
        assert!(probabilities
            .iter()
            .zip([0.2, 0.5, 0.8])
            .all(|(new, old)| *new != old));
    }

    #[test]
    fn fixed_best_arm_is_kept() {
        let mut rng = SmallRng::seed_from_u64(DEFAULT_SEED);
        let mut bandit = DynamicBandit::new(
            BernoulliBandit::new(vec![0.1, 0.2, 1.0]).unwrap(),
            drift(1.0, 1.0, false),
        )
        .unwrap();
        for _ in 0..50 {
            bandit.step(&mut rng);
            assert_eq!(bandit.action_mean(2), Ok(1.0));
            assert_eq!(bandit.best_action(), 2);
        }
    }

    #[test]
    fn records_one_entry_per_step() {
        let mut rng = SmallRng::seed_from_u64(DEFAULT_SEED);
        let mut bandit = make_bandit(drift(0.05, 0.0, true));
        for _ in 0..100 {
            bandit.step(&mut rng);
        }

        let replay = bandit.take_replay().unwrap();
        assert_eq!(replay.len(), 100);
        assert_eq!(replay.n_arms(), Some(3));
        assert!(replay
            .steps()
            .iter()
            .flat_map(|step| step.outcomes.iter())
            .all(|outcome| outcome.reward == 0.0 || outcome.reward == 1.0));
        assert_eq!(
            replay.step(0).map(|step| step.outcomes[2].parameter),
            Some(0.8)
        );
    }

    #[test]
    fn agents_share_the_realized_step() {
        let mut rng = SmallRng::seed_from_u64(DEFAULT_SEED);
        let mut bandit = make_bandit(drift(0.0, 0.0, true));
        for _ in 0..20 {
            let first = bandit.do_action(1, &mut rng).unwrap();
            let second = bandit.do_action(1, &mut rng).unwrap();
            assert_eq!(first, second);
            bandit.step(&mut rng);
        }

        let replay = bandit.replay().unwrap();
        assert_eq!(replay.len(), 20);
    }

    #[test]
    fn recorded_rewards_are_served() {
        let mut rng = SmallRng::seed_from_u64(DEFAULT_SEED);
        let mut bandit = make_bandit(drift(0.1, 0.0, true));
        let served = (0..3)
            .map(|arm_id| bandit.do_action(arm_id, &mut rng).unwrap())
            .collect::<Vec<f64>>();
        bandit.step(&mut rng);

        let replay = bandit.take_replay().unwrap();
        let recorded = replay.steps()[0]
            .outcomes
            .iter()
            .map(|outcome| outcome.reward)
            .collect::<Vec<f64>>();
        assert_eq!(served, recorded);
    }
}
