//! Lottery Check Example
//!
//! Demonstrates how a property check catches a ledger that forgets to clamp.
//!
//! Run with: cargo run --example lottery_check

use lottery_ledger::driver::{CheckConfig, PropertyDriver};
use lottery_ledger::ledger::{BoundaryPolicy, Ledger, Transaction};

fn main() -> lottery_ledger::Result<()> {
    println!("=== Lottery Ledger Example ===\n");

    // Five processes, five tickets each
    let mut ledger = Ledger::new(5, 5)?;
    println!("Fresh ledger: {:?} (total {})", ledger.tickets(), ledger.total_tickets());

    for _ in 0..5 {
        ledger.apply(Transaction::Penalise(0))?;
    }
    println!(
        "After 5 x penalise:0 with clamping: {:?} valid={}",
        ledger.tickets(),
        ledger.is_valid()
    );
    println!();

    for policy in [
        BoundaryPolicy::Clamp,
        BoundaryPolicy::Reject,
        BoundaryPolicy::Unchecked,
    ] {
        println!("--- Policy: {policy} ---");
        let config = CheckConfig::default().with_policy(policy);
        let report = PropertyDriver::new(config)?.check()?;

        match report.counterexample() {
            None => println!(
                "  PASS: {} cases, {} transactions, {} clamped, {} rejected",
                report.cases_run, report.transactions, report.clamped, report.rejected
            ),
            Some(cex) => {
                let script: Vec<String> = cex.minimal.iter().map(ToString::to_string).collect();
                println!("  FAIL: {}", cex.failure.violation);
                println!(
                    "  Shrunk {} -> {} transactions: {}",
                    cex.original.len(),
                    cex.minimal.len(),
                    script.join(" ")
                );
            }
        }
        println!();
    }

    println!("=== Example Complete ===");
    Ok(())
}
