use crate::environments::EnvironmentType;
use crate::policies::PolicyType;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub n_step: usize,
    pub n_test: usize,
    #[serde(default)]
    pub use_replay: bool,
    pub seed: Option<u64>,
    pub workers: Option<usize>,
    #[serde(default)]
    pub include_random: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub replay_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub session: SessionConfig,
    pub environment: EnvironmentType,
    pub agents: Vec<PolicyType>,
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn from_env(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        builder.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const CONFIG: &str = r#"
        log_level = "debug"

        [session]
        n_step = 1000
        n_test = 8
        seed = 42
        include_random = true

        [environment]
        type = "BernoulliDynamic"
        n_arms = 3
        probabilities = [0.1, 0.5, 0.9]
        prob_of_change = 0.001

        [[agents]]
        type = "ThompsonSampling"

        [[agents]]
        type = "MaxDswThompsonSampling"
        gamma = 0.95
        n = 50

        [output]
        path = "results"
    "#;

    #[test]
    fn parse_toml() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.session.n_step, 1000);
        assert_eq!(config.session.seed, Some(42));
        assert!(!config.session.use_replay);
        assert!(config.session.include_random);
        assert!(config.session.workers.is_none());
        assert_eq!(
            config.agents,
            vec![
                PolicyType::ThompsonSampling,
                PolicyType::MaxDswThompsonSampling { gamma: 0.95, n: 50 }
            ]
        );
        assert!(matches!(
            config.environment,
            EnvironmentType::BernoulliDynamic {
                n_arms: 3,
                save_replay: false,
                ..
            }
        ));
        assert_eq!(config.output.path, PathBuf::from("results"));
        assert!(config.output.replay_path.is_none());
    }
}
