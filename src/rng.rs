use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Deserializer, Serialize};

// odd constant from splitmix64, spreads consecutive trial indices over the seed space
const TRIAL_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Root of all randomness in a session. Every trial derives its own generator from it so
/// that results do not depend on which worker ran which trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MasterSeed {
    seed: u64,
}

impl MasterSeed {
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generator for whatever has to be drawn once per session, e.g. unspecified arm parameters.
    pub fn session_rng(&self) -> SmallRng {
        SmallRng::seed_from_u64(self.seed)
    }

    pub fn trial_rng(&self, trial: usize) -> SmallRng {
        SmallRng::seed_from_u64(
            self.seed
                .wrapping_add((trial as u64).wrapping_add(1).wrapping_mul(TRIAL_STRIDE)),
        )
    }
}

impl<'de> Deserialize<'de> for MasterSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seed = Deserialize::deserialize(deserializer)?;
        Ok(Self::new(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let seed = MasterSeed::new(Some(1234));
        let (mut rng_a, mut rng_b) = (seed.trial_rng(3), seed.trial_rng(3));
        let a: Vec<u64> = (0..8).map(|_| rng_a.random()).collect();
        let b: Vec<u64> = (0..8).map(|_| rng_b.random()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn trials_get_distinct_streams() {
        let seed = MasterSeed::new(Some(1234));
        let first: u64 = seed.trial_rng(0).random();
        let second: u64 = seed.trial_rng(1).random();
        assert_ne!(first, second);
    }

    #[test]
    fn deserializes_missing_seed_from_entropy() {
        let seed: MasterSeed = serde_json::from_str("null").unwrap();
        let explicit: MasterSeed = serde_json::from_str("42").unwrap();
        assert_eq!(explicit.seed(), 42);
        let _ = seed.seed();
    }
}
