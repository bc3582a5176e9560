use super::result::SessionResult;
use super::trial::{RunTrial, Trial, TrialRunner};

use crate::config::AppConfig;
use crate::environments::{Environment, ReplayLog};
use crate::errors::{ConfigurationError, SessionError, TrialExecutionError};
use crate::policies::{Agent, RewardKind, ORACLE_LABEL};
use crate::rng::MasterSeed;

use actix::prelude::*;
use futures_util::future::join_all;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::thread;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs a set of agents against an environment over many independent trials and keeps the
/// merged results of the last successful run.
pub struct Session {
    id: Uuid,
    environment: Box<dyn Environment + Send>,
    agents: Vec<Agent>,
    seed: MasterSeed,
    workers: Option<usize>,
    result: Option<SessionResult>,
}

impl Session {
    pub fn new(environment: Box<dyn Environment + Send>, agents: Vec<Agent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            environment,
            agents,
            seed: MasterSeed::new(None),
            workers: None,
            result: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = MasterSeed::new(Some(seed));
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Builds the environment and the agents described by `config`. Environment parameters
    /// left unspecified are drawn from the session seed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigurationError> {
        let seed = MasterSeed::new(config.session.seed);
        let environment = config
            .environment
            .clone()
            .into_inner(&mut seed.session_rng())?;

        let n_arms = environment.n_arms();
        let mut agents = config
            .agents
            .iter()
            .cloned()
            .map(|policy_type| Agent::from_policy_type(policy_type, n_arms))
            .collect::<Result<Vec<Agent>, ConfigurationError>>()?;
        if config.session.include_random {
            agents.push(Agent::Random);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            environment,
            agents,
            seed,
            workers: config.session.workers,
            result: None,
        })
    }

    /// Identifier of the current run.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed.seed()
    }

    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn validate(
        &self,
        n_step: usize,
        n_test: usize,
        use_replay: bool,
    ) -> Result<(), ConfigurationError> {
        if n_step == 0 {
            return Err(ConfigurationError::InvalidStepCount);
        }
        if n_test == 0 {
            return Err(ConfigurationError::InvalidTrialCount);
        }

        let env_arms = self.environment.n_arms();
        if env_arms == 0 {
            return Err(ConfigurationError::NoArms);
        }

        let mut labels = HashSet::new();
        if use_replay {
            labels.insert(ORACLE_LABEL);
        }
        for agent in &self.agents {
            if let Agent::Algorithm(policy) = agent {
                if policy.n_arms() > env_arms {
                    return Err(ConfigurationError::ArmCountMismatch {
                        agent: agent.label().to_string(),
                        agent_arms: policy.n_arms(),
                        env_arms,
                    });
                }
                if policy.reward_kind() == RewardKind::Binary
                    && self.environment.reward_kind() == RewardKind::Continuous
                {
                    return Err(ConfigurationError::IncompatibleRewards(
                        agent.label().to_string(),
                    ));
                }
            }
            if !labels.insert(agent.label()) {
                return Err(ConfigurationError::DuplicateAgent(agent.label().to_string()));
            }
        }

        if use_replay && !self.environment.supports_replay() {
            return Err(ConfigurationError::ReplayNotSupported);
        }
        match self.environment.max_steps() {
            Some(available) if available < n_step => Err(ConfigurationError::ReplayTooShort {
                requested: n_step,
                available,
            }),
            _ => Ok(()),
        }
    }

    /// Runs `n_test` trials of `n_step` steps each and blocks until all of them are done.
    pub fn run(
        &mut self,
        n_step: usize,
        n_test: usize,
        use_replay: bool,
    ) -> Result<&SessionResult, SessionError> {
        System::new().block_on(self.run_async(n_step, n_test, use_replay))
    }

    /// Same as [`Session::run`], from within a running actix system.
    pub async fn run_async(
        &mut self,
        n_step: usize,
        n_test: usize,
        use_replay: bool,
    ) -> Result<&SessionResult, SessionError> {
        self.result = None;
        self.validate(n_step, n_test, use_replay)?;
        self.id = Uuid::new_v4();

        let workers = self
            .workers
            .unwrap_or_else(|| {
                thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1)
            })
            .clamp(1, n_test);
        info!(
            id = %self.id,
            seed = self.seed.seed(),
            n_step,
            n_test,
            workers,
            "Starting session"
        );

        let runner = SyncArbiter::start(workers, || TrialRunner);
        let requests = (0..n_test).map(|index| {
            runner.send(RunTrial {
                trial: Trial::new(
                    index,
                    self.agents.clone(),
                    self.environment.clone(),
                    self.seed.trial_rng(index),
                    n_step,
                    use_replay,
                ),
            })
        });

        let trials = join_all(requests)
            .await
            .into_iter()
            .map(|response| {
                response
                    .map_err(|source| TrialExecutionError::Mailbox {
                        actor: "TrialRunner",
                        source,
                    })
                    .and_then(|trial| trial)
            })
            .collect::<Result<Vec<_>, TrialExecutionError>>()
            .inspect_err(|err| warn!(id = %self.id, error = %err, "Session aborted"))?;

        let result = SessionResult::merge(self.id, self.seed.seed(), n_step, trials);
        for label in result.agents() {
            info!(
                id = %self.id,
                agent = %label,
                mean_reward = result.mean_reward_sum(label).unwrap_or_default(),
                "Agent done"
            );
        }
        info!(id = %self.id, "Completed session");

        Ok(&*self.result.insert(result))
    }

    /// Result of the last successful run.
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn reward_trace(&self, label: &str) -> Option<&[f64]> {
        self.result()?.reward_trace(label)
    }

    pub fn reward_sums(&self, label: &str) -> Option<&[f64]> {
        self.result()?.reward_sums(label)
    }

    pub fn mean_reward_sum(&self, label: &str) -> Option<f64> {
        self.result()?.mean_reward_sum(label)
    }

    pub fn reward_sum_variance(&self, label: &str) -> Option<f64> {
        self.result()?.reward_sum_variance(label)
    }

    pub fn replays(&self) -> &[ReplayLog] {
        self.result()
            .map(SessionResult::replays)
            .unwrap_or_default()
    }
}
