//! Invariant violations reported by ledger checks

use serde::{Deserialize, Serialize};

use super::ProcessId;

/// A broken ledger invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A process holds fewer than `MIN_TICKETS`
    BelowMinimum {
        /// Process id
        process: ProcessId,
        /// Tickets held
        tickets: u32,
    },
    /// A process holds more than `MAX_TICKETS`
    AboveMaximum {
        /// Process id
        process: ProcessId,
        /// Tickets held
        tickets: u32,
    },
    /// The cached total disagrees with the per-process sum
    TotalMismatch {
        /// Cached `total_tickets`
        recorded: u64,
        /// Recomputed sum
        actual: u64,
    },
}

impl Violation {
    /// Process involved, if the violation concerns a single process
    #[must_use]
    pub fn process(&self) -> Option<ProcessId> {
        match self {
            Self::BelowMinimum { process, .. } | Self::AboveMaximum { process, .. } => {
                Some(*process)
            }
            Self::TotalMismatch { .. } => None,
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BelowMinimum { process, tickets } => write!(
                f,
                "process {process} holds {tickets} tickets, below minimum {}",
                super::MIN_TICKETS
            ),
            Self::AboveMaximum { process, tickets } => write!(
                f,
                "process {process} holds {tickets} tickets, above maximum {}",
                super::MAX_TICKETS
            ),
            Self::TotalMismatch { recorded, actual } => {
                write!(f, "total_tickets is {recorded} but tickets sum to {actual}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_below_minimum() {
        let v = Violation::BelowMinimum {
            process: 0,
            tickets: 0,
        };
        assert_eq!(v.to_string(), "process 0 holds 0 tickets, below minimum 1");
    }

    #[test]
    fn test_display_total_mismatch() {
        let v = Violation::TotalMismatch {
            recorded: 26,
            actual: 25,
        };
        assert!(v.to_string().contains("26"));
        assert_eq!(v.process(), None);
    }

    #[test]
    fn test_serde_tagged() {
        let v = Violation::AboveMaximum {
            process: 4,
            tickets: 51,
        };
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"kind\":\"above_maximum\""));
        let back: Violation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
