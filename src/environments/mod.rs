mod bernoulli;
mod dynamic;
mod environment;
mod gaussian;
mod replay;

pub use bernoulli::BernoulliBandit;
pub use dynamic::{
    BernoulliDynamicBandit, DriftConfig, Drifting, DynamicBandit, GaussianDynamicBandit,
};
pub use environment::{CloneBoxedEnvironment, Environment, EnvironmentType};
pub use gaussian::GaussianBandit;
pub use replay::{ArmOutcome, ReplayBandit, ReplayLog, ReplayStep};
