use crate::environments::ReplayLog;

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// What one agent earned during one trial.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentRecord {
    pub label: String,
    /// Cumulative reward after every step.
    pub trace: Vec<f64>,
    /// Total reward divided by the number of steps.
    pub reward_sum: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct TrialResult {
    pub trial: usize,
    pub records: Vec<AgentRecord>,
    #[serde(skip)]
    pub replay: Option<ReplayLog>,
}

/// Results of every trial of a session, merged per agent label.
#[derive(Clone, Debug, Serialize)]
pub struct SessionResult {
    id: Uuid,
    seed: u64,
    n_step: usize,
    n_test: usize,
    agents: Vec<String>,
    traces: HashMap<String, Vec<f64>>,
    sums: HashMap<String, Vec<f64>>,
    #[serde(skip)]
    replays: Vec<ReplayLog>,
}

impl SessionResult {
    /// Traces are summed elementwise, per-trial reward sums are collected in trial order.
    /// Expects the complete set of trials.
    pub fn merge(id: Uuid, seed: u64, n_step: usize, mut trials: Vec<TrialResult>) -> Self {
        trials.sort_by_key(|trial| trial.trial);

        let agents = trials
            .first()
            .map(|trial| {
                trial
                    .records
                    .iter()
                    .map(|record| record.label.clone())
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();

        let mut traces: HashMap<String, Vec<f64>> = agents
            .iter()
            .map(|label| (label.clone(), vec![0.0; n_step]))
            .collect();
        let mut sums: HashMap<String, Vec<f64>> = agents
            .iter()
            .map(|label| (label.clone(), Vec::with_capacity(trials.len())))
            .collect();
        let mut replays = Vec::new();
        let n_test = trials.len();

        for trial in trials {
            for record in trial.records {
                if let Some(trace) = traces.get_mut(&record.label) {
                    trace
                        .iter_mut()
                        .zip(&record.trace)
                        .for_each(|(total, value)| *total += value);
                }
                if let Some(sums) = sums.get_mut(&record.label) {
                    sums.push(record.reward_sum);
                }
            }
            replays.extend(trial.replay);
        }

        Self {
            id,
            seed,
            n_step,
            n_test,
            agents,
            traces,
            sums,
            replays,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Seed the session was run with, enough to reproduce it.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn n_step(&self) -> usize {
        self.n_step
    }

    pub fn n_test(&self) -> usize {
        self.n_test
    }

    /// Agent labels in the order the agents played.
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    /// Cumulative reward per step, summed over every trial.
    pub fn reward_trace(&self, label: &str) -> Option<&[f64]> {
        self.traces.get(label).map(Vec::as_slice)
    }

    pub fn mean_reward_trace(&self, label: &str) -> Option<Vec<f64>> {
        let n_test = self.n_test.max(1) as f64;
        self.reward_trace(label)
            .map(|trace| trace.iter().map(|value| value / n_test).collect())
    }

    /// Normalized reward of every trial.
    pub fn reward_sums(&self, label: &str) -> Option<&[f64]> {
        self.sums.get(label).map(Vec::as_slice)
    }

    pub fn mean_reward_sum(&self, label: &str) -> Option<f64> {
        self.reward_sums(label)
            .filter(|sums| !sums.is_empty())
            .map(|sums| sums.iter().sum::<f64>() / sums.len() as f64)
    }

    /// Population variance of the per-trial normalized rewards.
    pub fn reward_sum_variance(&self, label: &str) -> Option<f64> {
        let mean = self.mean_reward_sum(label)?;
        self.reward_sums(label).map(|sums| {
            sums.iter().map(|sum| (sum - mean).powi(2)).sum::<f64>() / sums.len() as f64
        })
    }

    /// Replay logs recorded by the trials, in trial order.
    pub fn replays(&self) -> &[ReplayLog] {
        &self.replays
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn record(label: &str, trace: Vec<f64>) -> AgentRecord {
        let reward_sum = trace.last().copied().unwrap_or_default() / trace.len() as f64;
        AgentRecord {
            label: label.to_string(),
            trace,
            reward_sum,
        }
    }

    fn make_trials() -> Vec<TrialResult> {
        vec![
            TrialResult {
                trial: 1,
                records: vec![
                    record("a", vec![1.0, 1.0, 2.0, 3.0]),
                    record("random", vec![0.0, 0.0, 1.0, 1.0]),
                ],
                replay: None,
            },
            TrialResult {
                trial: 0,
                records: vec![
                    record("a", vec![1.0, 2.0, 3.0, 4.0]),
                    record("random", vec![0.0, 1.0, 1.0, 2.0]),
                ],
                replay: Some(ReplayLog::default()),
            },
        ]
    }

    #[test]
    fn traces_are_summed() {
        let result = SessionResult::merge(Uuid::new_v4(), 7, 4, make_trials());
        assert_eq!(result.n_test(), 2);
        assert_eq!(result.seed(), 7);
        assert_eq!(result.agents(), &["a".to_string(), "random".to_string()]);
        assert_eq!(result.reward_trace("a"), Some(&[2.0, 3.0, 5.0, 7.0][..]));
        assert_eq!(
            result.mean_reward_trace("random"),
            Some(vec![0.0, 0.5, 1.0, 1.5])
        );
        assert_eq!(result.reward_trace("b"), None);
    }

    #[test]
    fn sums_are_collected_in_trial_order() {
        let result = SessionResult::merge(Uuid::new_v4(), 7, 4, make_trials());
        assert_eq!(result.reward_sums("a"), Some(&[1.0, 0.75][..]));

        let mean = result.mean_reward_sum("a").unwrap();
        assert!((mean - 0.875).abs() < EPS);
        let variance = result.reward_sum_variance("a").unwrap();
        assert!((variance - 0.015625).abs() < EPS);
        assert_eq!(result.replays().len(), 1);
    }

    #[test]
    fn empty_merge() {
        let result = SessionResult::merge(Uuid::new_v4(), 7, 4, Vec::new());
        assert!(result.agents().is_empty());
        assert_eq!(result.mean_reward_sum("a"), None);
    }
}
