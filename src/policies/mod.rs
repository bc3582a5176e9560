mod agent;
pub mod belief;
mod discounted;
mod dsw;
mod policy;
mod sliding_window;
mod thompson_sampling;

pub use agent::{Agent, ORACLE_LABEL, RANDOM_LABEL};
pub use discounted::DiscountedThompsonSampling;
pub use dsw::{CombinedEstimate, DswThompsonSampling, Reducer};
pub(crate) use policy::argmax;
pub use policy::{CloneBoxedPolicy, Policy, PolicyType, RewardKind};
pub use sliding_window::SlidingWindowThompsonSampling;
pub use thompson_sampling::{GaussianThompsonSampling, ThompsonSampling};
