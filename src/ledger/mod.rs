//! Lottery-scheduling ticket ledger
//!
//! Every process owns a number of lottery tickets. A scheduler draws a ticket
//! at random and runs its owner, so the ticket count is the share of the CPU a
//! process receives. Transactions reward or penalise a single process by one
//! ticket at a time.
//!
//! # Invariants
//!
//! After every mutation:
//! 1. `MIN_TICKETS <= tickets[i] <= MAX_TICKETS` for every process `i`
//! 2. `total_tickets == sum(tickets)`
//!
//! What happens when a transaction would cross a bound is decided by the
//! ledger's [`BoundaryPolicy`].
//!
//! # Example
//!
//! ```rust
//! use lottery_ledger::ledger::{Ledger, Transaction};
//!
//! let mut ledger = Ledger::new(5, 5)?;
//! assert_eq!(ledger.total_tickets(), 25);
//!
//! ledger.apply(Transaction::Reward(2))?;
//! assert_eq!(ledger.tickets()[2], 6);
//! assert!(ledger.is_valid());
//! # Ok::<(), lottery_ledger::Error>(())
//! ```

mod violation;

pub use violation::Violation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Lowest ticket count a process may hold
pub const MIN_TICKETS: u32 = 1;

/// Highest ticket count a process may hold
pub const MAX_TICKETS: u32 = 50;

/// Starting ticket count per process
pub const DEFAULT_INITIAL_TICKETS: u32 = 5;

/// Number of processes in a default ledger
pub const DEFAULT_PROCESS_COUNT: usize = 5;

/// Process identity (index into the ledger)
pub type ProcessId = usize;

/// A single ticket adjustment targeting one process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "process", rename_all = "snake_case")]
pub enum Transaction {
    /// Give the process one more ticket
    Reward(ProcessId),
    /// Take one ticket away from the process
    Penalise(ProcessId),
}

impl Transaction {
    /// Target process
    #[must_use]
    pub fn process(self) -> ProcessId {
        match self {
            Self::Reward(p) | Self::Penalise(p) => p,
        }
    }

    /// Same kind of transaction aimed at another process
    #[must_use]
    pub fn with_process(self, process: ProcessId) -> Self {
        match self {
            Self::Reward(_) => Self::Reward(process),
            Self::Penalise(_) => Self::Penalise(process),
        }
    }

    /// Whether this is a reward
    #[must_use]
    pub fn is_reward(self) -> bool {
        matches!(self, Self::Reward(_))
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reward(p) => write!(f, "reward:{p}"),
            Self::Penalise(p) => write!(f, "penalise:{p}"),
        }
    }
}

impl std::str::FromStr for Transaction {
    type Err = Error;

    /// Accepts `reward:3`, `penalise:0`, `penalize:0` and `reward(3)`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (kind, process) = if let Some((kind, rest)) = s.split_once(':') {
            (kind, rest)
        } else if let Some((kind, rest)) = s.split_once('(') {
            let rest = rest
                .strip_suffix(')')
                .ok_or_else(|| Error::Parse(format!("unclosed parenthesis in '{s}'")))?;
            (kind, rest)
        } else {
            return Err(Error::Parse(format!(
                "expected 'reward:<pid>' or 'penalise:<pid>', got '{s}'"
            )));
        };

        let process: ProcessId = process
            .trim()
            .parse()
            .map_err(|_| Error::Parse(format!("invalid process id in '{s}'")))?;

        match kind.trim().to_lowercase().as_str() {
            "reward" | "r" => Ok(Self::Reward(process)),
            "penalise" | "penalize" | "p" => Ok(Self::Penalise(process)),
            other => Err(Error::Parse(format!("unknown transaction kind '{other}'"))),
        }
    }
}

/// What `apply` does when a transaction would cross a ticket bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Leave the count at the bound and report [`ApplyOutcome::Clamped`]
    #[default]
    Clamp,
    /// Refuse the transaction with [`Error::TicketBound`]
    Reject,
    /// Apply it anyway, breaking the bound invariant
    ///
    /// This is the unclamped ledger the invariant checks exist to catch.
    #[serde(alias = "none")]
    Unchecked,
}

impl std::fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clamp => write!(f, "clamp"),
            Self::Reject => write!(f, "reject"),
            Self::Unchecked => write!(f, "unchecked"),
        }
    }
}

impl std::str::FromStr for BoundaryPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "clamp" => Ok(Self::Clamp),
            "reject" => Ok(Self::Reject),
            "unchecked" | "none" => Ok(Self::Unchecked),
            other => Err(Error::Parse(format!("unknown boundary policy '{other}'"))),
        }
    }
}

/// Result of a successful `apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyOutcome {
    /// The ticket count moved by one
    Applied,
    /// The count was already at a bound and stayed there
    Clamped,
}

/// Anything the property driver can check
///
/// [`Ledger`] is the canonical implementation; alternative bookkeeping (or a
/// deliberately broken one) can be checked the same way.
pub trait TicketModel {
    /// Number of processes tracked
    fn process_count(&self) -> usize;

    /// Apply one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is refused or targets an unknown
    /// process
    fn apply(&mut self, transaction: Transaction) -> Result<ApplyOutcome>;

    /// Report the first broken invariant, if any
    ///
    /// # Errors
    ///
    /// Returns the violation found
    fn check(&self) -> std::result::Result<(), Violation>;

    /// Whether every invariant holds
    fn is_valid(&self) -> bool {
        self.check().is_ok()
    }
}

/// Per-process ticket counts and their cached total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    total_tickets: u64,
    tickets: Vec<u32>,
    #[serde(default)]
    policy: BoundaryPolicy,
}

impl Ledger {
    /// Create a ledger of `process_count` processes holding `initial_tickets` each
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoProcesses`] for an empty ledger and
    /// [`Error::InitialTickets`] if `initial_tickets` is out of bounds
    pub fn new(process_count: usize, initial_tickets: u32) -> Result<Self> {
        if process_count == 0 {
            return Err(Error::NoProcesses);
        }
        if !(MIN_TICKETS..=MAX_TICKETS).contains(&initial_tickets) {
            return Err(Error::InitialTickets {
                tickets: initial_tickets,
                min: MIN_TICKETS,
                max: MAX_TICKETS,
            });
        }

        Ok(Self {
            total_tickets: process_count as u64 * u64::from(initial_tickets),
            tickets: vec![initial_tickets; process_count],
            policy: BoundaryPolicy::default(),
        })
    }

    /// Set the boundary policy
    #[must_use]
    pub fn with_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Boundary policy in force
    #[must_use]
    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    /// Per-process ticket counts, indexed by process id
    #[must_use]
    pub fn tickets(&self) -> &[u32] {
        &self.tickets
    }

    /// Tickets held by one process
    #[must_use]
    pub fn tickets_of(&self, process: ProcessId) -> Option<u32> {
        self.tickets.get(process).copied()
    }

    /// Cached total of all tickets
    #[must_use]
    pub fn total_tickets(&self) -> u64 {
        self.total_tickets
    }

    /// Number of processes tracked
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.tickets.len()
    }

    /// Apply one transaction in place
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProcess`] for an out-of-range process under
    /// every policy, and [`Error::TicketBound`] at a bound under
    /// [`BoundaryPolicy::Reject`]. The ledger is unchanged on error.
    pub fn apply(&mut self, transaction: Transaction) -> Result<ApplyOutcome> {
        let process = transaction.process();
        let held = self
            .tickets_of(process)
            .ok_or(Error::UnknownProcess {
                process,
                process_count: self.tickets.len(),
            })?;

        let (at_bound, bound) = match transaction {
            Transaction::Reward(_) => (held >= MAX_TICKETS, MAX_TICKETS),
            Transaction::Penalise(_) => (held <= MIN_TICKETS, MIN_TICKETS),
        };

        if at_bound {
            match self.policy {
                BoundaryPolicy::Clamp => return Ok(ApplyOutcome::Clamped),
                BoundaryPolicy::Reject => {
                    return Err(Error::TicketBound {
                        process,
                        tickets: held,
                        bound,
                    })
                }
                BoundaryPolicy::Unchecked => {}
            }
        }

        let next = match transaction {
            Transaction::Reward(_) => held.checked_add(1),
            Transaction::Penalise(_) => held.checked_sub(1),
        };
        // An unsigned count cannot drop below zero even when unchecked
        let Some(next) = next else {
            return Ok(ApplyOutcome::Clamped);
        };

        self.tickets[process] = next;
        self.total_tickets = if transaction.is_reward() {
            self.total_tickets.saturating_add(1)
        } else {
            self.total_tickets.saturating_sub(1)
        };

        Ok(ApplyOutcome::Applied)
    }

    /// Apply a sequence of transactions, stopping at the first error
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Ledger::apply`]
    pub fn apply_all<I>(&mut self, transactions: I) -> Result<Vec<ApplyOutcome>>
    where
        I: IntoIterator<Item = Transaction>,
    {
        transactions.into_iter().map(|tx| self.apply(tx)).collect()
    }

    /// Whether the bound and sum invariants hold
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }

    /// Report the first broken invariant
    ///
    /// Bounds are checked in process order before the sum.
    ///
    /// # Errors
    ///
    /// Returns the first [`Violation`] found
    pub fn check(&self) -> std::result::Result<(), Violation> {
        match self.violations().into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Every broken invariant, bounds first
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        let mut found: Vec<Violation> = self
            .tickets
            .iter()
            .enumerate()
            .filter_map(|(process, &tickets)| {
                if tickets < MIN_TICKETS {
                    Some(Violation::BelowMinimum { process, tickets })
                } else if tickets > MAX_TICKETS {
                    Some(Violation::AboveMaximum { process, tickets })
                } else {
                    None
                }
            })
            .collect();

        let actual = self.recomputed_total();
        if actual != self.total_tickets {
            found.push(Violation::TotalMismatch {
                recorded: self.total_tickets,
                actual,
            });
        }

        found
    }

    /// Whether the cached total matches the per-process sum
    ///
    /// Independent of the bound checks.
    #[must_use]
    pub fn total_is_consistent(&self) -> bool {
        self.recomputed_total() == self.total_tickets
    }

    fn recomputed_total(&self) -> u64 {
        self.tickets.iter().map(|&t| u64::from(t)).sum()
    }

    /// Hold a lottery: pick a process with probability proportional to its tickets
    ///
    /// Uses the cached total, so a ledger whose total disagrees with its
    /// entries may return `None`. Returns `None` when there are no tickets.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ProcessId> {
        if self.total_tickets == 0 {
            return None;
        }

        let mut winning = rng.gen_range(0..self.total_tickets);
        for (process, &held) in self.tickets.iter().enumerate() {
            let held = u64::from(held);
            if winning < held {
                return Some(process);
            }
            winning -= held;
        }
        None
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            total_tickets: DEFAULT_PROCESS_COUNT as u64 * u64::from(DEFAULT_INITIAL_TICKETS),
            tickets: vec![DEFAULT_INITIAL_TICKETS; DEFAULT_PROCESS_COUNT],
            policy: BoundaryPolicy::default(),
        }
    }
}

impl TicketModel for Ledger {
    fn process_count(&self) -> usize {
        Ledger::process_count(self)
    }

    fn apply(&mut self, transaction: Transaction) -> Result<ApplyOutcome> {
        Ledger::apply(self, transaction)
    }

    fn check(&self) -> std::result::Result<(), Violation> {
        Ledger::check(self)
    }
}
