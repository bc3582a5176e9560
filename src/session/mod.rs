mod result;
mod session;
mod trial;

pub use result::{AgentRecord, SessionResult, TrialResult};
pub use session::Session;
pub use trial::{RunTrial, Trial, TrialRunner, TrialState};
