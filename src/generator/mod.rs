//! Random and exhaustive transaction generation
//!
//! The generator is bound to an explicit process count so that every
//! transaction it produces targets a process the ledger under test actually
//! tracks.
//!
//! # Example
//!
//! ```rust
//! use lottery_ledger::generator::{GenerationStrategy, TransactionGenerator};
//!
//! let mut generator = TransactionGenerator::new(5, 42)?;
//! let sequences = generator.generate(&GenerationStrategy::Uniform { max_len: 20 }, 10);
//! assert_eq!(sequences.len(), 10);
//! assert!(sequences.iter().flatten().all(|tx| tx.process() < 5));
//! # Ok::<(), lottery_ledger::Error>(())
//! ```

mod shrink;
mod strategy;

pub use shrink::{
    minimize, sequence_candidates, shrink_transaction, Shrunk, DEFAULT_MAX_SHRINK_STEPS,
};
pub use strategy::{GenerationStrategy, DEFAULT_MAX_LEN, DEFAULT_MAX_RUN};

use rand::prelude::*;
use tracing::debug;

use crate::ledger::{ProcessId, Transaction};
use crate::{Error, Result};

/// Seeded transaction generator
#[derive(Debug, Clone)]
pub struct TransactionGenerator {
    /// Number of processes transactions may target
    process_count: usize,
    /// Seed the generator was created with
    seed: u64,
    rng: StdRng,
}

impl TransactionGenerator {
    /// Create a generator targeting processes `0..process_count`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoProcesses`] if `process_count` is zero
    pub fn new(process_count: usize, seed: u64) -> Result<Self> {
        if process_count == 0 {
            return Err(Error::NoProcesses);
        }
        Ok(Self {
            process_count,
            seed,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Number of processes transactions may target
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.process_count
    }

    /// Seed the generator was created with
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// One transaction: uniform kind, uniform process
    pub fn transaction(&mut self) -> Transaction {
        let process: ProcessId = self.rng.gen_range(0..self.process_count);
        if self.rng.gen_bool(0.5) {
            Transaction::Reward(process)
        } else {
            Transaction::Penalise(process)
        }
    }

    /// Exactly `len` independent transactions
    pub fn sequence(&mut self, len: usize) -> Vec<Transaction> {
        (0..len).map(|_| self.transaction()).collect()
    }

    /// A sequence whose length is uniform in `0..=max_len`
    pub fn sequence_up_to(&mut self, max_len: usize) -> Vec<Transaction> {
        let len = self.rng.gen_range(0..=max_len);
        self.sequence(len)
    }

    /// Runs of one repeated transaction, total length uniform in `0..=max_len`
    pub fn runs(&mut self, max_len: usize, max_run: usize) -> Vec<Transaction> {
        let len = self.rng.gen_range(0..=max_len);
        let max_run = max_run.max(1);
        let mut sequence = Vec::with_capacity(len);

        while sequence.len() < len {
            let tx = self.transaction();
            let run = self.rng.gen_range(1..=max_run).min(len - sequence.len());
            sequence.extend(std::iter::repeat(tx).take(run));
        }

        sequence
    }

    /// Generate `count` sequences with the given strategy
    ///
    /// Exhaustive enumeration may return fewer than `count` sequences when
    /// the space is smaller than that.
    pub fn generate(
        &mut self,
        strategy: &GenerationStrategy,
        count: usize,
    ) -> Vec<Vec<Transaction>> {
        debug!(
            strategy = strategy.name(),
            count,
            process_count = self.process_count,
            "generating transaction sequences"
        );

        match *strategy {
            GenerationStrategy::Uniform { max_len } => {
                (0..count).map(|_| self.sequence_up_to(max_len)).collect()
            }
            GenerationStrategy::Runs { max_len, max_run } => {
                (0..count).map(|_| self.runs(max_len, max_run)).collect()
            }
            GenerationStrategy::Exhaustive { max_len } => {
                exhaustive(self.process_count, max_len, count)
            }
        }
    }

    /// Every distinct transaction, rewards first
    #[must_use]
    pub fn alphabet(&self) -> Vec<Transaction> {
        alphabet(self.process_count)
    }
}

fn alphabet(process_count: usize) -> Vec<Transaction> {
    (0..process_count)
        .map(Transaction::Reward)
        .chain((0..process_count).map(Transaction::Penalise))
        .collect()
}

/// Enumerate sequences over every transaction, shortest first
///
/// Within one length the order is lexicographic over the alphabet order.
/// Stops after `limit` sequences.
fn exhaustive(process_count: usize, max_len: usize, limit: usize) -> Vec<Vec<Transaction>> {
    let symbols = alphabet(process_count);
    let mut out = Vec::new();

    for len in 0..=max_len {
        let mut digits = vec![0usize; len];
        loop {
            if out.len() >= limit {
                return out;
            }
            out.push(digits.iter().map(|&d| symbols[d]).collect());
            if !advance(&mut digits, symbols.len()) {
                break;
            }
        }
    }

    out
}

/// Odometer step over base-`base` digits; false once every combination is spent
fn advance(digits: &mut [usize], base: usize) -> bool {
    for digit in digits.iter_mut().rev() {
        *digit += 1;
        if *digit < base {
            return true;
        }
        *digit = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_processes() {
        assert!(matches!(
            TransactionGenerator::new(0, 1),
            Err(Error::NoProcesses)
        ));
    }

    #[test]
    fn test_transactions_stay_in_range() {
        let mut generator = TransactionGenerator::new(3, 7).unwrap();
        let txs = generator.sequence(500);
        assert_eq!(txs.len(), 500);
        assert!(txs.iter().all(|tx| tx.process() < 3));
    }

    #[test]
    fn test_both_kinds_and_all_processes_appear() {
        let mut generator = TransactionGenerator::new(5, 42).unwrap();
        let txs = generator.sequence(1000);
        assert!(txs.iter().any(|tx| tx.is_reward()));
        assert!(txs.iter().any(|tx| !tx.is_reward()));
        for p in 0..5 {
            assert!(txs.iter().any(|tx| tx.process() == p), "process {p} never drawn");
        }
    }

    #[test]
    fn test_same_seed_same_sequences() {
        let strategy = GenerationStrategy::Uniform { max_len: 30 };
        let a = TransactionGenerator::new(5, 99).unwrap().generate(&strategy, 20);
        let b = TransactionGenerator::new(5, 99).unwrap().generate(&strategy, 20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sequence_up_to_respects_max() {
        let mut generator = TransactionGenerator::new(2, 3).unwrap();
        for _ in 0..100 {
            assert!(generator.sequence_up_to(8).len() <= 8);
        }
        assert!(generator.sequence_up_to(0).is_empty());
    }

    #[test]
    fn test_runs_are_repetitive() {
        let mut generator = TransactionGenerator::new(5, 11).unwrap();
        let seqs = generator.generate(
            &GenerationStrategy::Runs {
                max_len: 100,
                max_run: 50,
            },
            50,
        );
        assert!(seqs.iter().all(|s| s.len() <= 100));
        let repeats: usize = seqs
            .iter()
            .map(|s| s.windows(2).filter(|w| w[0] == w[1]).count())
            .sum();
        let total: usize = seqs.iter().map(|s| s.len().saturating_sub(1)).sum();
        // uniform draws repeat about 1 in 10 times
        assert!(repeats * 2 > total, "{repeats} repeats out of {total}");
    }

    #[test]
    fn test_exhaustive_order_and_count() {
        let mut generator = TransactionGenerator::new(1, 0).unwrap();
        let seqs = generator.generate(&GenerationStrategy::Exhaustive { max_len: 2 }, 100);
        // 1 + 2 + 4 sequences over {Reward(0), Penalise(0)}
        assert_eq!(seqs.len(), 7);
        assert!(seqs[0].is_empty());
        assert_eq!(seqs[1], vec![Transaction::Reward(0)]);
        assert_eq!(seqs[2], vec![Transaction::Penalise(0)]);
        assert_eq!(
            seqs[3],
            vec![Transaction::Reward(0), Transaction::Reward(0)]
        );
        assert_eq!(
            seqs[6],
            vec![Transaction::Penalise(0), Transaction::Penalise(0)]
        );
    }

    #[test]
    fn test_exhaustive_respects_limit() {
        let mut generator = TransactionGenerator::new(5, 0).unwrap();
        let seqs = generator.generate(&GenerationStrategy::Exhaustive { max_len: 6 }, 25);
        assert_eq!(seqs.len(), 25);
        // 1 empty + 10 singletons, then pairs
        assert_eq!(seqs[11].len(), 2);
    }

    #[test]
    fn test_alphabet() {
        let generator = TransactionGenerator::new(2, 0).unwrap();
        assert_eq!(
            generator.alphabet(),
            vec![
                Transaction::Reward(0),
                Transaction::Reward(1),
                Transaction::Penalise(0),
                Transaction::Penalise(1),
            ]
        );
    }
}
