pub mod config;
pub mod environments;
pub mod errors;
pub mod export;
pub mod policies;
pub mod rng;
pub mod session;
