//! Counterexample shrinking
//!
//! A failing sequence is reduced greedily: every round proposes simpler
//! candidates and keeps the first one that still fails, until no candidate
//! does. Candidates are strictly smaller in `(length, sum of process ids)`,
//! so the loop always terminates.
//!
//! Candidate order:
//! 1. Drop a chunk of the sequence (whole sequence, halves, quarters, ... single elements)
//! 2. Relabel every occurrence of one process to a lower id
//! 3. Shrink a single transaction

use crate::ledger::{ProcessId, Transaction};

/// Default cap on accepted shrink steps
pub const DEFAULT_MAX_SHRINK_STEPS: usize = 1000;

/// Outcome of [`minimize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shrunk {
    /// Smallest failing sequence found
    pub transactions: Vec<Transaction>,
    /// Candidates accepted
    pub steps: usize,
    /// Candidates tried
    pub attempts: usize,
}

fn lower_ids(process: ProcessId) -> Vec<ProcessId> {
    let mut ids = Vec::with_capacity(3);
    for candidate in [0, process / 2, process.saturating_sub(1)] {
        if candidate < process && !ids.contains(&candidate) {
            ids.push(candidate);
        }
    }
    ids
}

/// Simpler versions of one transaction
///
/// The kind is kept; the process id moves towards 0.
#[must_use]
pub fn shrink_transaction(transaction: Transaction) -> Vec<Transaction> {
    lower_ids(transaction.process())
        .into_iter()
        .map(|p| transaction.with_process(p))
        .collect()
}

/// Every one-step simplification of a sequence, most aggressive first
#[must_use]
pub fn sequence_candidates(sequence: &[Transaction]) -> Vec<Vec<Transaction>> {
    let len = sequence.len();
    let mut candidates = Vec::new();

    let mut chunk = len;
    while chunk > 0 {
        for start in (0..len).step_by(chunk) {
            let end = (start + chunk).min(len);
            let mut candidate = Vec::with_capacity(len - (end - start));
            candidate.extend_from_slice(&sequence[..start]);
            candidate.extend_from_slice(&sequence[end..]);
            candidates.push(candidate);
        }
        chunk /= 2;
    }

    let mut processes: Vec<ProcessId> = sequence
        .iter()
        .map(|tx| tx.process())
        .filter(|&p| p > 0)
        .collect();
    processes.sort_unstable();
    processes.dedup();

    for &from in &processes {
        for to in lower_ids(from) {
            candidates.push(
                sequence
                    .iter()
                    .map(|tx| {
                        if tx.process() == from {
                            tx.with_process(to)
                        } else {
                            *tx
                        }
                    })
                    .collect(),
            );
        }
    }

    for (index, tx) in sequence.iter().enumerate() {
        for simpler in shrink_transaction(*tx) {
            let mut candidate = sequence.to_vec();
            candidate[index] = simpler;
            candidates.push(candidate);
        }
    }

    candidates
}

/// Greedily shrink a failing sequence
///
/// `still_fails` must return true for `sequence`. Shrinking stops when no
/// candidate fails any more or after `max_steps` accepted candidates.
pub fn minimize<F>(sequence: Vec<Transaction>, mut still_fails: F, max_steps: usize) -> Shrunk
where
    F: FnMut(&[Transaction]) -> bool,
{
    let mut current = sequence;
    let mut steps = 0;
    let mut attempts = 0;

    'search: while steps < max_steps {
        for candidate in sequence_candidates(&current) {
            attempts += 1;
            if still_fails(&candidate) {
                current = candidate;
                steps += 1;
                continue 'search;
            }
        }
        break;
    }

    Shrunk {
        transactions: current,
        steps,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Transaction::{Penalise, Reward};

    #[test]
    fn test_shrink_transaction_towards_zero() {
        assert_eq!(
            shrink_transaction(Reward(7)),
            vec![Reward(0), Reward(3), Reward(6)]
        );
        assert_eq!(shrink_transaction(Penalise(1)), vec![Penalise(0)]);
        assert!(shrink_transaction(Penalise(0)).is_empty());
    }

    #[test]
    fn test_candidates_start_with_removals() {
        let seq = vec![Reward(0), Penalise(1), Reward(2), Penalise(0)];
        let candidates = sequence_candidates(&seq);
        assert!(candidates[0].is_empty());
        assert_eq!(candidates[1], vec![Reward(2), Penalise(0)]);
        assert_eq!(candidates[2], vec![Reward(0), Penalise(1)]);
    }

    #[test]
    fn test_candidates_include_relabel() {
        let seq = vec![Penalise(3), Reward(1), Penalise(3)];
        let candidates = sequence_candidates(&seq);
        assert!(candidates.contains(&vec![Penalise(0), Reward(1), Penalise(0)]));
        assert!(candidates.contains(&vec![Penalise(3), Reward(0), Penalise(3)]));
    }

    #[test]
    fn test_empty_sequence_has_no_candidates() {
        assert!(sequence_candidates(&[]).is_empty());
    }

    #[test]
    fn test_minimize_to_single_element() {
        let seq = vec![Penalise(2), Reward(7), Penalise(4), Reward(1)];
        let shrunk = minimize(
            seq,
            |s| s.iter().any(|tx| tx.is_reward() && tx.process() >= 3),
            DEFAULT_MAX_SHRINK_STEPS,
        );
        assert_eq!(shrunk.transactions, vec![Reward(3)]);
        assert!(shrunk.steps > 0);
        assert!(shrunk.attempts >= shrunk.steps);
    }

    #[test]
    fn test_minimize_count_threshold() {
        let mut seq = Vec::new();
        for p in [4, 2, 4, 1, 4, 4, 3, 4, 0, 4] {
            seq.push(Penalise(p));
        }
        // fails once some process is penalised five times
        let fails = |s: &[Transaction]| {
            (0..5).any(|p| s.iter().filter(|tx| **tx == Penalise(p)).count() >= 5)
        };
        let shrunk = minimize(seq, fails, DEFAULT_MAX_SHRINK_STEPS);
        assert_eq!(shrunk.transactions, vec![Penalise(0); 5]);
    }

    #[test]
    fn test_minimize_respects_step_budget() {
        let seq = vec![Reward(9); 8];
        let shrunk = minimize(seq.clone(), |s| !s.is_empty(), 0);
        assert_eq!(shrunk.transactions, seq);
        assert_eq!(shrunk.steps, 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn transaction() -> impl Strategy<Value = Transaction> {
        (any::<bool>(), 0usize..8).prop_map(|(reward, p)| {
            if reward {
                Transaction::Reward(p)
            } else {
                Transaction::Penalise(p)
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_candidates_are_simpler(seq in prop::collection::vec(transaction(), 0..30)) {
            let weight = |s: &[Transaction]| s.iter().map(|tx| tx.process()).sum::<usize>();
            for candidate in sequence_candidates(&seq) {
                prop_assert!(
                    candidate.len() < seq.len()
                        || (candidate.len() == seq.len() && weight(&candidate) < weight(&seq))
                );
            }
        }

        #[test]
        fn prop_minimized_still_fails(seq in prop::collection::vec(transaction(), 1..40)) {
            let target = seq[0];
            let fails = |s: &[Transaction]| s.iter().any(|tx| tx.is_reward() == target.is_reward());
            let shrunk = minimize(seq.clone(), &fails, DEFAULT_MAX_SHRINK_STEPS);
            prop_assert!(fails(&shrunk.transactions));
            prop_assert!(shrunk.transactions.len() <= seq.len());
            prop_assert_eq!(shrunk.transactions.len(), 1);
            prop_assert_eq!(shrunk.transactions[0].process(), 0);
        }
    }
}
