use super::result::{AgentRecord, TrialResult};

use crate::environments::Environment;
use crate::errors::{EnvironmentError, TrialExecutionError};
use crate::policies::{Agent, ORACLE_LABEL};

use actix::prelude::*;
use rand::rngs::SmallRng;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrialState {
    Initialized,
    Running,
    Completed,
}

/// One independent run of every agent against its own copy of the environment.
pub struct Trial {
    index: usize,
    state: TrialState,
    agents: Vec<Agent>,
    environment: Box<dyn Environment + Send>,
    rng: SmallRng,
    n_step: usize,
    use_replay: bool,
}

impl Trial {
    pub fn new(
        index: usize,
        agents: Vec<Agent>,
        environment: Box<dyn Environment + Send>,
        rng: SmallRng,
        n_step: usize,
        use_replay: bool,
    ) -> Self {
        Self {
            index,
            state: TrialState::Initialized,
            agents,
            environment,
            rng,
            n_step,
            use_replay,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn run(&mut self) -> Result<TrialResult, TrialExecutionError> {
        if self.state != TrialState::Initialized {
            return Err(TrialExecutionError::InvalidState(self.index));
        }
        self.state = TrialState::Running;
        debug!(trial = self.index, n_step = self.n_step, "Starting trial");

        let trial = self.index;
        let n_arms = self.environment.n_arms();
        let mut traces = vec![Vec::with_capacity(self.n_step); self.agents.len()];
        let mut totals = vec![0.0; self.agents.len()];
        let mut oracle_trace = Vec::with_capacity(if self.use_replay { self.n_step } else { 0 });
        let mut oracle_total = 0.0;

        for step in 0..self.n_step {
            for (slot, agent) in self.agents.iter_mut().enumerate() {
                let label = agent.label();
                let policy_error = |source| TrialExecutionError::Policy {
                    trial,
                    agent: label.to_string(),
                    source,
                };

                let arm_id = agent
                    .select_action(n_arms, &mut self.rng)
                    .map_err(&policy_error)?;
                let reward = self
                    .environment
                    .do_action(arm_id, &mut self.rng)
                    .map_err(|source| TrialExecutionError::Environment { trial, source })?;

                totals[slot] += reward;
                traces[slot].push(totals[slot]);

                agent
                    .update_estimates(arm_id, reward)
                    .map_err(&policy_error)?;
            }

            if self.use_replay {
                let reward = self.environment.oracle_reward().ok_or(
                    TrialExecutionError::Environment {
                        trial,
                        source: EnvironmentError::ReplayExhausted(step),
                    },
                )?;
                oracle_total += reward;
                oracle_trace.push(oracle_total);
            }

            self.environment.step(&mut self.rng);
        }

        let n_step = self.n_step.max(1) as f64;
        let mut records = self
            .agents
            .iter()
            .zip(traces)
            .zip(totals)
            .map(|((agent, trace), total)| AgentRecord {
                label: agent.label().to_string(),
                trace,
                reward_sum: total / n_step,
            })
            .collect::<Vec<AgentRecord>>();

        if self.use_replay {
            records.push(AgentRecord {
                label: ORACLE_LABEL.to_string(),
                trace: oracle_trace,
                reward_sum: oracle_total / n_step,
            });
        }

        self.state = TrialState::Completed;
        debug!(trial = self.index, "Completed trial");

        Ok(TrialResult {
            trial,
            records,
            replay: self.environment.take_replay(),
        })
    }
}

/// Synchronous worker running whole trials, one at a time.
pub struct TrialRunner;

impl Actor for TrialRunner {
    type Context = SyncContext<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        debug!("Starting trial runner");
    }
}

// Messages
#[derive(Message)]
#[rtype(result = "Result<TrialResult, TrialExecutionError>")]
pub struct RunTrial {
    pub trial: Trial,
}

impl Handler<RunTrial> for TrialRunner {
    type Result = Result<TrialResult, TrialExecutionError>;

    fn handle(&mut self, msg: RunTrial, _: &mut Self::Context) -> Self::Result {
        let mut trial = msg.trial;
        trial.run().inspect_err(|err| {
            warn!(trial = trial.index(), error = %err, "Trial failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environments::{ArmOutcome, BernoulliBandit, ReplayBandit, ReplayLog, ReplayStep};
    use crate::policies::PolicyType;
    use rand::SeedableRng;

    const DEFAULT_SEED: u64 = 1234;

    fn make_trial(n_step: usize) -> Trial {
        let environment = Box::new(BernoulliBandit::new(vec![0.1, 0.5, 0.9]).unwrap());
        let agents = vec![
            Agent::from_policy_type(PolicyType::ThompsonSampling, 3).unwrap(),
            Agent::Random,
        ];
        Trial::new(
            0,
            agents,
            environment,
            SmallRng::seed_from_u64(DEFAULT_SEED),
            n_step,
            false,
        )
    }

    #[test]
    fn lifecycle() {
        let mut trial = make_trial(50);
        assert_eq!(trial.state(), TrialState::Initialized);

        let result = trial.run().unwrap();
        assert_eq!(trial.state(), TrialState::Completed);
        assert_eq!(result.records.len(), 2);
        assert!(result.replay.is_none());

        assert!(matches!(
            trial.run(),
            Err(TrialExecutionError::InvalidState(0))
        ));
    }

    #[test]
    fn traces_are_cumulative() {
        let result = make_trial(200).run().unwrap();
        for record in &result.records {
            assert_eq!(record.trace.len(), 200);
            assert!(record.trace.windows(2).all(|w| w[1] - w[0] == 0.0 || w[1] - w[0] == 1.0));
            let last = record.trace.last().copied().unwrap();
            assert!((record.reward_sum - last / 200.0).abs() < 1e-12);
        }
        assert_eq!(result.records[1].label, "random");
    }

    #[test]
    fn oracle_is_credited_on_replay() {
        let log = ReplayLog::new(
            (0..10)
                .map(|step| ReplayStep {
                    outcomes: vec![
                        ArmOutcome {
                            parameter: 0.9,
                            reward: (step % 2) as f64,
                        },
                        ArmOutcome {
                            parameter: 0.1,
                            reward: 0.0,
                        },
                    ],
                })
                .collect(),
        );
        let mut trial = Trial::new(
            3,
            vec![Agent::Random],
            Box::new(ReplayBandit::new(log).unwrap()),
            SmallRng::seed_from_u64(DEFAULT_SEED),
            10,
            true,
        );

        let result = trial.run().unwrap();
        let oracle = result
            .records
            .iter()
            .find(|record| record.label == ORACLE_LABEL)
            .unwrap();
        assert_eq!(oracle.trace.last(), Some(&5.0));
        assert!((oracle.reward_sum - 0.5).abs() < 1e-12);
    }

    #[test]
    fn environment_failure_stops_the_trial() {
        let log = ReplayLog::new(vec![ReplayStep {
            outcomes: vec![ArmOutcome {
                parameter: 0.5,
                reward: 1.0,
            }],
        }]);
        let mut trial = Trial::new(
            1,
            vec![Agent::Random],
            Box::new(ReplayBandit::new(log).unwrap()),
            SmallRng::seed_from_u64(DEFAULT_SEED),
            3,
            false,
        );

        assert!(matches!(
            trial.run(),
            Err(TrialExecutionError::Environment {
                trial: 1,
                source: EnvironmentError::ReplayExhausted(1)
            })
        ));
        assert_eq!(trial.state(), TrialState::Running);
    }
}
