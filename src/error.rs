//! Error types for the ticket ledger
//!
//! This module defines the error types used throughout the library.

use thiserror::Error;

use crate::ledger::ProcessId;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during ledger operations
#[derive(Error, Debug)]
pub enum Error {
    /// A ledger or generator was asked to track zero processes
    #[error("process count must be at least 1")]
    NoProcesses,

    /// Initial ticket count outside the allowed bounds
    #[error("initial ticket count {tickets} outside [{min}, {max}]")]
    InitialTickets {
        /// Requested initial tickets
        tickets: u32,
        /// Lower bound
        min: u32,
        /// Upper bound
        max: u32,
    },

    /// Transaction targets a process the ledger does not track
    #[error("unknown process {process} (ledger tracks {process_count} processes)")]
    UnknownProcess {
        /// Offending process id
        process: ProcessId,
        /// Number of processes in the ledger
        process_count: usize,
    },

    /// Transaction refused because the process already sits at a bound
    #[error("process {process} already holds {tickets} tickets (bound {bound})")]
    TicketBound {
        /// Process id
        process: ProcessId,
        /// Current ticket count
        tickets: u32,
        /// The bound that would have been crossed
        bound: u32,
    },

    /// Malformed textual input (transactions, policies, strategies)
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error is a bound refusal under the reject policy
    ///
    /// Refusals leave the ledger untouched and are expected traffic, unlike
    /// misuse such as an unknown process.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::TicketBound { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
