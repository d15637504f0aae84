//! Configuration for agent creation.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Default cap on propagate/derive rounds per observation.
pub const DEFAULT_MAX_ROUNDS: usize = 64;

/// Configuration for creating an [`Agent`](crate::Agent).
///
/// # Examples
///
/// ```
/// use minesweeper_agent::{Agent, AgentConfig};
///
/// let config = AgentConfig::new()
///     .with_seed(42)
///     .with_max_rounds(16)
///     .with_exhaustive_fallback(true);
/// let agent = Agent::with_config(8, 8, config);
/// assert!(agent.knowledge().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AgentConfig {
    /// Random seed for guesses; `None` draws from the OS
    pub seed: Option<u64>,
    /// Upper bound on propagate/derive rounds run by one `add_knowledge`
    pub max_rounds: usize,
    /// Consult the exact solver when local deduction runs dry
    pub exhaustive_fallback: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            exhaustive_fallback: false,
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the round cap. Zero is treated as one.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_exhaustive_fallback(mut self, enabled: bool) -> Self {
        self.exhaustive_fallback = enabled;
        self
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.max_rounds, DEFAULT_MAX_ROUNDS);
        assert!(!config.exhaustive_fallback);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = AgentConfig::new().with_seed(7);
        let mut first = config.rng();
        let mut second = config.rng();
        let xs: Vec<u32> = (0..8).map(|_| first.random()).collect();
        let ys: Vec<u32> = (0..8).map(|_| second.random()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_zero_rounds_clamped() {
        assert_eq!(AgentConfig::new().with_max_rounds(0).max_rounds, 1);
    }
}
