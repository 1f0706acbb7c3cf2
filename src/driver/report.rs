//! Check reports
//!
//! Human-readable and JSON renderings of a property check.

use serde::{Deserialize, Serialize};

use super::{CheckConfig, Counterexample, Replay, Verdict};
use crate::Result;

/// Summary of a property check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Settings the check ran with
    pub config: CheckConfig,
    /// Cases replayed (including the failing one)
    pub cases_run: usize,
    /// Transactions processed across all cases
    pub transactions: usize,
    /// Transactions clamped at a bound
    pub clamped: usize,
    /// Transactions refused at a bound
    pub rejected: usize,
    /// Outcome
    pub verdict: Verdict,
}

impl CheckReport {
    pub(super) fn new(config: CheckConfig) -> Self {
        Self {
            config,
            cases_run: 0,
            transactions: 0,
            clamped: 0,
            rejected: 0,
            verdict: Verdict::Pass,
        }
    }

    pub(super) fn record(&mut self, replay: &Replay) {
        self.cases_run += 1;
        self.transactions += replay.steps();
        self.clamped += replay.clamped;
        self.rejected += replay.rejected;
    }

    /// Whether the invariants held in every case
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self.verdict, Verdict::Pass)
    }

    /// The counterexample, if the check failed
    #[must_use]
    pub fn counterexample(&self) -> Option<&Counterexample> {
        match &self.verdict {
            Verdict::Pass => None,
            Verdict::Fail(cex) => Some(cex),
        }
    }

    /// Pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Multi-line text summary
    #[must_use]
    pub fn render_text(&self) -> String {
        let config = &self.config;
        let mut out = String::new();

        out.push_str("Ledger Property Check\n");
        out.push_str("=====================\n");
        out.push_str(&format!("Processes:        {}\n", config.process_count));
        out.push_str(&format!("Initial tickets:  {}\n", config.initial_tickets));
        out.push_str(&format!("Policy:           {}\n", config.policy));
        out.push_str(&format!(
            "Strategy:         {} (max length {})\n",
            config.strategy.name(),
            config.strategy.max_len()
        ));
        out.push_str(&format!("Seed:             {}\n", config.seed));
        out.push('\n');
        out.push_str(&format!("Cases run:        {}\n", self.cases_run));
        out.push_str(&format!("Transactions:     {}\n", self.transactions));
        out.push_str(&format!("Clamped:          {}\n", self.clamped));
        out.push_str(&format!("Rejected:         {}\n", self.rejected));
        out.push('\n');

        match &self.verdict {
            Verdict::Pass => out.push_str("PASS: invariants held after every transaction\n"),
            Verdict::Fail(cex) => {
                out.push_str(&format!("FAIL: case {} broke an invariant\n", cex.case));
                out.push_str(&format!("  Violation:      {}\n", cex.failure.violation));
                out.push_str(&format!(
                    "  Original:       {} transactions\n",
                    cex.original.len()
                ));
                out.push_str(&format!(
                    "  Minimal:        {} transactions ({} shrink steps)\n",
                    cex.minimal.len(),
                    cex.shrink_steps
                ));
                let script: Vec<String> = cex.minimal.iter().map(ToString::to_string).collect();
                out.push_str(&format!("  Replay:         {}\n", script.join(" ")));
            }
        }

        out
    }
}

impl std::fmt::Display for CheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::StepFailure;
    use crate::ledger::{Transaction, Violation};

    fn failing_report() -> CheckReport {
        let mut report = CheckReport::new(CheckConfig::default());
        report.record(&Replay {
            applied: 5,
            clamped: 0,
            rejected: 0,
            failure: None,
        });
        report.verdict = Verdict::Fail(Counterexample {
            case: 3,
            original: vec![Transaction::Penalise(2); 9],
            minimal: vec![Transaction::Penalise(0); 5],
            failure: StepFailure {
                step: 4,
                transaction: Transaction::Penalise(0),
                violation: Violation::BelowMinimum {
                    process: 0,
                    tickets: 0,
                },
            },
            shrink_steps: 6,
        });
        report
    }

    #[test]
    fn test_new_report_passes() {
        let report = CheckReport::new(CheckConfig::default());
        assert!(report.passed());
        assert!(report.counterexample().is_none());
        assert!(report.render_text().contains("PASS"));
    }

    #[test]
    fn test_record_accumulates() {
        let mut report = CheckReport::new(CheckConfig::default());
        let replay = Replay {
            applied: 3,
            clamped: 2,
            rejected: 1,
            failure: None,
        };
        report.record(&replay);
        report.record(&replay);
        assert_eq!(report.cases_run, 2);
        assert_eq!(report.transactions, 12);
        assert_eq!(report.clamped, 4);
        assert_eq!(report.rejected, 2);
    }

    #[test]
    fn test_render_failure() {
        let text = failing_report().render_text();
        assert!(text.contains("FAIL: case 3"));
        assert!(text.contains("below minimum 1"));
        assert!(text.contains(
            "penalise:0 penalise:0 penalise:0 penalise:0 penalise:0"
        ));
        assert_eq!(text, failing_report().to_string());
    }

    #[test]
    fn test_json_round_trip() {
        let report = failing_report();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"result\": \"fail\""));
        let back: CheckReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
