//! Sampling strategies for transaction generation
//!
//! Different strategies for exploring the space of transaction sequences.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default upper bound on generated sequence length
pub const DEFAULT_MAX_LEN: usize = 100;

/// Default upper bound on the length of a repeated run
pub const DEFAULT_MAX_RUN: usize = 60;

/// Sampling strategy for transaction sequences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationStrategy {
    /// Independent uniform draws
    ///
    /// Each transaction picks Reward or Penalise with equal probability and a
    /// process uniformly. Sequence length is uniform in `0..=max_len`.
    Uniform {
        /// Maximum sequence length
        max_len: usize,
    },

    /// Repeated runs of the same transaction
    ///
    /// Pushes single processes towards their bounds far faster than uniform
    /// draws, which mostly random-walk around the starting value.
    Runs {
        /// Maximum sequence length
        max_len: usize,
        /// Maximum length of a single run
        max_run: usize,
    },

    /// Every sequence up to a length, shortest first
    ///
    /// Grows as `(2 * process_count)^max_len`; only usable for tiny depths.
    Exhaustive {
        /// Maximum sequence length
        max_len: usize,
    },
}

impl GenerationStrategy {
    /// Build a strategy from its CLI name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for an unknown name
    pub fn from_name(name: &str, max_len: usize) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "uniform" | "random" => Ok(Self::Uniform { max_len }),
            "runs" | "boundary" => Ok(Self::Runs {
                max_len,
                max_run: DEFAULT_MAX_RUN.min(max_len.max(1)),
            }),
            "exhaustive" => Ok(Self::Exhaustive { max_len }),
            other => Err(Error::Parse(format!("unknown strategy '{other}'"))),
        }
    }

    /// Maximum sequence length this strategy produces
    #[must_use]
    pub fn max_len(&self) -> usize {
        match self {
            Self::Uniform { max_len }
            | Self::Runs { max_len, .. }
            | Self::Exhaustive { max_len } => *max_len,
        }
    }

    /// Short name, inverse of [`GenerationStrategy::from_name`]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform { .. } => "uniform",
            Self::Runs { .. } => "runs",
            Self::Exhaustive { .. } => "exhaustive",
        }
    }
}

impl Default for GenerationStrategy {
    fn default() -> Self {
        Self::Uniform {
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy() {
        let strategy = GenerationStrategy::default();
        assert_eq!(strategy, GenerationStrategy::Uniform { max_len: 100 });
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            GenerationStrategy::from_name("uniform", 10).unwrap(),
            GenerationStrategy::Uniform { max_len: 10 }
        );
        assert_eq!(
            GenerationStrategy::from_name("Exhaustive", 3).unwrap(),
            GenerationStrategy::Exhaustive { max_len: 3 }
        );
        assert!(GenerationStrategy::from_name("swarm", 3).is_err());
    }

    #[test]
    fn test_runs_caps_run_length() {
        let strategy = GenerationStrategy::from_name("runs", 20).unwrap();
        if let GenerationStrategy::Runs { max_len, max_run } = strategy {
            assert_eq!(max_len, 20);
            assert_eq!(max_run, 20);
        } else {
            panic!("Expected Runs strategy");
        }
    }

    #[test]
    fn test_name_round_trips() {
        for name in ["uniform", "runs", "exhaustive"] {
            let strategy = GenerationStrategy::from_name(name, 5).unwrap();
            assert_eq!(strategy.name(), name);
            assert_eq!(strategy.max_len(), 5);
        }
    }

    #[test]
    fn test_strategy_serde_tag() {
        let json = serde_json::to_string(&GenerationStrategy::Runs {
            max_len: 80,
            max_run: 50,
        })
        .unwrap();
        assert!(json.contains("\"type\":\"runs\""));
    }
}
