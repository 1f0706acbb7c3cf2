//! Property-based invariant driver
//!
//! The driver generates random transaction sequences, replays each one on a
//! fresh ledger, and checks the invariants after every single transaction.
//! The first failing sequence is cut at the failing step and shrunk to a
//! minimal counterexample.
//!
//! # Verification Strategy
//!
//! 1. **Generate**: `cases` sequences from the configured [`GenerationStrategy`]
//! 2. **Replay**: apply sequentially, checking validity after each step
//! 3. **Shrink**: minimize the first failure while it keeps failing
//!
//! # Example
//!
//! ```rust
//! use lottery_ledger::driver::{CheckConfig, PropertyDriver};
//! use lottery_ledger::ledger::BoundaryPolicy;
//!
//! let driver = PropertyDriver::new(CheckConfig::default())?;
//! assert!(driver.check()?.passed());
//!
//! let buggy = CheckConfig::default().with_policy(BoundaryPolicy::Unchecked);
//! let report = PropertyDriver::new(buggy)?.check()?;
//! assert!(!report.passed());
//! # Ok::<(), lottery_ledger::Error>(())
//! ```

mod report;

pub use report::CheckReport;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::generator::{
    minimize, GenerationStrategy, TransactionGenerator, DEFAULT_MAX_SHRINK_STEPS,
};
use crate::ledger::{
    ApplyOutcome, BoundaryPolicy, Ledger, TicketModel, Transaction, Violation,
    DEFAULT_INITIAL_TICKETS, DEFAULT_PROCESS_COUNT, MAX_TICKETS, MIN_TICKETS,
};
use crate::{Error, Result};

/// Default number of generated cases per check
pub const DEFAULT_CASES: usize = 100;

/// Default seed for reproducible runs
pub const DEFAULT_SEED: u64 = 42;

/// Settings for a property check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Processes in each fresh ledger (and the generator's id range)
    pub process_count: usize,
    /// Starting tickets per process
    pub initial_tickets: u32,
    /// Boundary policy of the ledger under test
    pub policy: BoundaryPolicy,
    /// Number of generated sequences
    pub cases: usize,
    /// How sequences are generated
    pub strategy: GenerationStrategy,
    /// Generator seed
    pub seed: u64,
    /// Cap on accepted shrink steps
    pub max_shrink_steps: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            process_count: DEFAULT_PROCESS_COUNT,
            initial_tickets: DEFAULT_INITIAL_TICKETS,
            policy: BoundaryPolicy::default(),
            cases: DEFAULT_CASES,
            strategy: GenerationStrategy::default(),
            seed: DEFAULT_SEED,
            max_shrink_steps: DEFAULT_MAX_SHRINK_STEPS,
        }
    }
}

impl CheckConfig {
    /// Load a config from a JSON file; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse a config from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the process count
    #[must_use]
    pub fn with_process_count(mut self, process_count: usize) -> Self {
        self.process_count = process_count;
        self
    }

    /// Set the initial tickets per process
    #[must_use]
    pub fn with_initial_tickets(mut self, initial_tickets: u32) -> Self {
        self.initial_tickets = initial_tickets;
        self
    }

    /// Set the boundary policy
    #[must_use]
    pub fn with_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the number of cases
    #[must_use]
    pub fn with_cases(mut self, cases: usize) -> Self {
        self.cases = cases;
        self
    }

    /// Set the generation strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: GenerationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the shrink budget
    #[must_use]
    pub fn with_max_shrink_steps(mut self, max_shrink_steps: usize) -> Self {
        self.max_shrink_steps = max_shrink_steps;
        self
    }

    /// Check the settings are usable
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] describing the first bad field
    pub fn validate(&self) -> Result<()> {
        if self.process_count == 0 {
            return Err(Error::Configuration(
                "process_count must be at least 1".to_string(),
            ));
        }
        if !(MIN_TICKETS..=MAX_TICKETS).contains(&self.initial_tickets) {
            return Err(Error::Configuration(format!(
                "initial_tickets {} outside [{MIN_TICKETS}, {MAX_TICKETS}]",
                self.initial_tickets
            )));
        }
        if self.cases == 0 {
            return Err(Error::Configuration("cases must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Command-line overrides layered over a [`CheckConfig`]
///
/// Unset fields keep the base value. Setting only one of `strategy` and
/// `max_len` keeps the other from the base strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Number of processes
    pub process_count: Option<usize>,
    /// Starting tickets per process
    pub initial_tickets: Option<u32>,
    /// Boundary policy
    pub policy: Option<BoundaryPolicy>,
    /// Number of generated cases
    pub cases: Option<usize>,
    /// Strategy name (`uniform`, `runs`, `exhaustive`)
    pub strategy: Option<String>,
    /// Maximum sequence length
    pub max_len: Option<usize>,
    /// Generator seed
    pub seed: Option<u64>,
}

impl ConfigOverrides {
    /// Apply the overrides to `base` and validate the result
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown strategy name or an invalid result
    pub fn apply(self, base: CheckConfig) -> Result<CheckConfig> {
        let mut config = base;

        if let Some(process_count) = self.process_count {
            config = config.with_process_count(process_count);
        }
        if let Some(initial_tickets) = self.initial_tickets {
            config = config.with_initial_tickets(initial_tickets);
        }
        if let Some(policy) = self.policy {
            config = config.with_policy(policy);
        }
        if let Some(cases) = self.cases {
            config = config.with_cases(cases);
        }
        if self.strategy.is_some() || self.max_len.is_some() {
            let name = self
                .strategy
                .unwrap_or_else(|| config.strategy.name().to_string());
            let max_len = self.max_len.unwrap_or_else(|| config.strategy.max_len());
            config = config.with_strategy(GenerationStrategy::from_name(&name, max_len)?);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }

        config.validate()?;
        Ok(config)
    }
}

/// The step at which a replay broke an invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    /// Zero-based index of the offending transaction
    pub step: usize,
    /// The offending transaction
    pub transaction: Transaction,
    /// What broke
    pub violation: Violation,
}

/// Outcome of replaying one sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Transactions that moved a count
    pub applied: usize,
    /// Transactions that hit a bound and were clamped
    pub clamped: usize,
    /// Transactions refused at a bound
    pub rejected: usize,
    /// First invariant violation, if any
    pub failure: Option<StepFailure>,
}

impl Replay {
    /// Number of transactions processed
    #[must_use]
    pub fn steps(&self) -> usize {
        self.applied + self.clamped + self.rejected
    }

    /// Whether every step kept the invariants
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Apply `transactions` in order, checking invariants after every one
///
/// Stops at the first violation. Bound refusals are counted, not failed.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the model is invalid before the first
/// transaction, and propagates any apply error other than a bound refusal
/// (such as an unknown process).
pub fn replay<M>(model: &mut M, transactions: &[Transaction]) -> Result<Replay>
where
    M: TicketModel + ?Sized,
{
    if let Err(violation) = model.check() {
        return Err(Error::Configuration(format!(
            "initial state already invalid: {violation}"
        )));
    }

    let mut outcome = Replay::default();

    for (step, &transaction) in transactions.iter().enumerate() {
        match model.apply(transaction) {
            Ok(ApplyOutcome::Applied) => outcome.applied += 1,
            Ok(ApplyOutcome::Clamped) => outcome.clamped += 1,
            Err(err) if err.is_rejection() => outcome.rejected += 1,
            Err(err) => return Err(err),
        }

        if let Err(violation) = model.check() {
            outcome.failure = Some(StepFailure {
                step,
                transaction,
                violation,
            });
            break;
        }
    }

    Ok(outcome)
}

/// A failing input, before and after shrinking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterexample {
    /// Index of the generated case that failed
    pub case: usize,
    /// Generated sequence, cut just after the failing step
    pub original: Vec<Transaction>,
    /// Shrunk sequence that still fails
    pub minimal: Vec<Transaction>,
    /// Failure observed when replaying `minimal`
    pub failure: StepFailure,
    /// Shrink candidates accepted
    pub shrink_steps: usize,
}

/// Verdict of a property check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Verdict {
    /// Invariants held after every step of every case
    Pass,
    /// A case broke an invariant
    Fail(Counterexample),
}

/// Runs property checks against fresh ledgers
#[derive(Debug, Clone)]
pub struct PropertyDriver {
    config: CheckConfig,
}

impl PropertyDriver {
    /// Create a driver
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the config is invalid
    pub fn new(config: CheckConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Settings in use
    #[must_use]
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// A ledger in the configured starting state
    ///
    /// # Errors
    ///
    /// Returns an error if the configured ledger cannot be built
    pub fn fresh_ledger(&self) -> Result<Ledger> {
        Ok(Ledger::new(self.config.process_count, self.config.initial_tickets)?
            .with_policy(self.config.policy))
    }

    /// Check the invariants of [`Ledger`] under the configured policy
    ///
    /// # Errors
    ///
    /// Returns an error if a ledger cannot be built or a transaction is misused
    pub fn check(&self) -> Result<CheckReport> {
        self.check_model(|| self.fresh_ledger())
    }

    /// Check the invariants of any model built by `factory`
    ///
    /// `factory` must return a fresh model in its initial state on every call,
    /// tracking exactly `process_count` processes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a model's process count differs from
    /// the config, or an error if `factory` fails or a replay hits a non-refusal
    /// error
    pub fn check_model<M, F>(&self, factory: F) -> Result<CheckReport>
    where
        M: TicketModel,
        F: Fn() -> Result<M>,
    {
        let config = &self.config;
        let mut generator = TransactionGenerator::new(config.process_count, config.seed)?;
        let sequences = generator.generate(&config.strategy, config.cases);

        let mut report = CheckReport::new(config.clone());

        for (case, sequence) in sequences.into_iter().enumerate() {
            let mut model = factory()?;
            if model.process_count() != config.process_count {
                return Err(Error::Configuration(format!(
                    "model tracks {} processes but the generator targets {}",
                    model.process_count(),
                    config.process_count
                )));
            }
            let outcome = replay(&mut model, &sequence)?;
            report.record(&outcome);

            let Some(failure) = outcome.failure else {
                debug!(case, len = sequence.len(), "case passed");
                continue;
            };

            warn!(
                case,
                step = failure.step,
                violation = %failure.violation,
                "invariant violated, shrinking"
            );

            let original = sequence[..=failure.step].to_vec();
            let counterexample = self.shrink(case, original, failure, &factory)?;

            info!(
                case,
                original_len = counterexample.original.len(),
                minimal_len = counterexample.minimal.len(),
                shrink_steps = counterexample.shrink_steps,
                "counterexample found"
            );

            report.verdict = Verdict::Fail(counterexample);
            return Ok(report);
        }

        info!(
            cases = report.cases_run,
            transactions = report.transactions,
            policy = %config.policy,
            "invariants held"
        );
        Ok(report)
    }

    fn shrink<M, F>(
        &self,
        case: usize,
        original: Vec<Transaction>,
        failure: StepFailure,
        factory: &F,
    ) -> Result<Counterexample>
    where
        M: TicketModel,
        F: Fn() -> Result<M>,
    {
        let still_fails = |candidate: &[Transaction]| {
            factory()
                .and_then(|mut model| replay(&mut model, candidate))
                .map(|outcome| !outcome.passed())
                .unwrap_or(false)
        };

        let shrunk = minimize(original.clone(), still_fails, self.config.max_shrink_steps);

        let mut model = factory()?;
        let failure = replay(&mut model, &shrunk.transactions)?
            .failure
            .unwrap_or(failure);

        Ok(Counterexample {
            case,
            original,
            minimal: shrunk.transactions,
            failure,
            shrink_steps: shrunk.steps,
        })
    }

    /// Replay an explicit script on a fresh ledger
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be built or a transaction
    /// targets an unknown process
    pub fn replay_transactions(&self, transactions: &[Transaction]) -> Result<Replay> {
        let mut ledger = self.fresh_ledger()?;
        replay(&mut ledger, transactions)
    }
}
