use actix::MailboxError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Expected {expected} {what} values, got {actual}")]
    ParameterLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid {what} for arm {arm_id}: {value}")]
    InvalidParameter {
        what: &'static str,
        arm_id: usize,
        value: f64,
    },
    #[error("Probability {name} must lie in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("Discount factor must lie in (0, 1), got {0}")]
    InvalidGamma(f64),
    #[error("Window size must be at least 1")]
    InvalidWindow,
    #[error("A bandit needs at least one arm")]
    NoArms,
    #[error("Number of steps must be at least 1")]
    InvalidStepCount,
    #[error("Number of trials must be at least 1")]
    InvalidTrialCount,
    #[error("Agent {agent} expects {agent_arms} arms but the environment only has {env_arms}")]
    ArmCountMismatch {
        agent: String,
        agent_arms: usize,
        env_arms: usize,
    },
    #[error("Agent {0} cannot learn from the rewards produced by this environment")]
    IncompatibleRewards(String),
    #[error("Agent label {0} is used more than once")]
    DuplicateAgent(String),
    #[error("Replay requested but the environment cannot replay a recorded log")]
    ReplayNotSupported,
    #[error("Replay log holds {available} steps but {requested} were requested")]
    ReplayTooShort { requested: usize, available: usize },
    #[error("Replay log is empty")]
    EmptyReplay,
    #[error("Replay log step {step} has {actual} arms, expected {expected}")]
    RaggedReplay {
        step: usize,
        expected: usize,
        actual: usize,
    },
    #[error("The environment does not record a replay log")]
    RecordingDisabled,
    #[error("Cannot load replay log: {0}")]
    ReplayUnavailable(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("No arms to draw from")]
    NoArmsAvailable,
    #[error("Arm {0} not found")]
    ArmNotFound(usize),
    #[error("Reward {0} is outside [0, 1]")]
    InvalidReward(f64),
    #[error("Sampling failed: {0}")]
    SamplingError(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum EnvironmentError {
    #[error("Arm {0} not found")]
    ArmNotFound(usize),
    #[error("Replay log exhausted at step {0}")]
    ReplayExhausted(usize),
    #[error("Sampling failed: {0}")]
    SamplingError(String),
}

#[derive(Debug, Error)]
pub enum TrialExecutionError {
    #[error("Trial {trial} failed in agent {agent}: {source}")]
    Policy {
        trial: usize,
        agent: String,
        #[source]
        source: PolicyError,
    },
    #[error("Trial {trial} failed in environment: {source}")]
    Environment {
        trial: usize,
        #[source]
        source: EnvironmentError,
    },
    #[error("Trial {0} was already started")]
    InvalidState(usize),
    #[error("Mailbox error in {actor}: {source}")]
    Mailbox {
        actor: &'static str,
        #[source]
        source: MailboxError,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Trial(#[from] TrialExecutionError),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error while writing results: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize replay log: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write CSV table: {0}")]
    Csv(#[from] csv::Error),
}
