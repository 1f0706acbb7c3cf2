//! Lottery Ledger - Ticket Bookkeeping for Lottery Scheduling
//!
//! A lottery scheduler gives every process a number of tickets and runs the
//! owner of a randomly drawn ticket. This crate keeps those ticket counts in a
//! [`Ledger`], applies reward/penalty transactions to it, and ships a
//! property-based driver that hammers the ledger with random transaction
//! sequences and shrinks any invariant violation to a minimal reproduction.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        LOTTERY LEDGER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Generator   →   Ledger    →   Invariant   →   Shrinker     │
//! │  (seeded)        (apply)       check           (minimize)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use lottery_ledger::driver::{CheckConfig, PropertyDriver};
//! use lottery_ledger::ledger::BoundaryPolicy;
//!
//! // A ledger that never clamps is caught and shrunk to five penalties
//! let config = CheckConfig::default().with_policy(BoundaryPolicy::Unchecked);
//! let report = PropertyDriver::new(config)?.check()?;
//! let cex = report.counterexample().expect("unclamped ledger must fail");
//! assert_eq!(cex.minimal.len(), 5);
//! # Ok::<(), lottery_ledger::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`ledger`] - Ticket ledger, transactions, boundary policies, lottery draw
//! - [`generator`] - Seeded transaction generation and counterexample shrinking
//! - [`driver`] - Property checks, replay, reports

// Note: Lint configuration is in Cargo.toml [lints]
#![forbid(unsafe_code)]

pub mod driver;
pub mod error;
pub mod generator;
pub mod ledger;

pub use error::{Error, Result};
pub use ledger::{
    ApplyOutcome, BoundaryPolicy, Ledger, ProcessId, TicketModel, Transaction, Violation,
    MAX_TICKETS, MIN_TICKETS,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::driver::{CheckConfig, CheckReport, PropertyDriver, Verdict};
    pub use crate::generator::{GenerationStrategy, TransactionGenerator};
    pub use crate::ledger::{
        ApplyOutcome, BoundaryPolicy, Ledger, TicketModel, Transaction, Violation,
    };
    pub use crate::{Error, Result};
}
