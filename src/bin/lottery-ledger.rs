//! Lottery Ledger CLI - Property checks for lottery-scheduling ticket ledgers
//!
//! Check, replay, and generate ticket transactions.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lottery_ledger::driver::{CheckConfig, ConfigOverrides, PropertyDriver};
use lottery_ledger::generator::{GenerationStrategy, TransactionGenerator};
use lottery_ledger::ledger::{BoundaryPolicy, Ledger, Transaction};
use lottery_ledger::Result;

/// Lottery Ledger - invariant checking for lottery-scheduling tickets
#[derive(Parser)]
#[command(name = "lottery-ledger")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a property check with random transaction sequences
    Check {
        /// JSON config file; flags below override its values
        #[arg(long)]
        config: Option<String>,

        /// Number of processes
        #[arg(short, long)]
        processes: Option<usize>,

        /// Initial tickets per process
        #[arg(short, long)]
        tickets: Option<u32>,

        /// Boundary policy (clamp, reject, unchecked)
        #[arg(long)]
        policy: Option<String>,

        /// Number of generated cases
        #[arg(short, long)]
        cases: Option<usize>,

        /// Maximum sequence length
        #[arg(long)]
        max_len: Option<usize>,

        /// Generation strategy (uniform, runs, exhaustive)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Random seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Replay an explicit transaction script, checking after every step
    Replay {
        /// Number of processes
        #[arg(short, long, default_value = "5")]
        processes: usize,

        /// Initial tickets per process
        #[arg(short, long, default_value = "5")]
        tickets: u32,

        /// Boundary policy (clamp, reject, unchecked)
        #[arg(long, default_value = "clamp")]
        policy: String,

        /// Transactions such as reward:3 or penalise:0
        #[arg(required = true)]
        transactions: Vec<String>,
    },

    /// Print generated transaction sequences
    Generate {
        /// Number of processes
        #[arg(short, long, default_value = "5")]
        processes: usize,

        /// Number of sequences
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Maximum sequence length
        #[arg(long, default_value = "20")]
        max_len: usize,

        /// Generation strategy (uniform, runs, exhaustive)
        #[arg(short, long, default_value = "uniform")]
        strategy: String,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Hold lottery draws on a fresh ledger and print the win distribution
    Draw {
        /// Number of processes
        #[arg(short, long, default_value = "5")]
        processes: usize,

        /// Initial tickets per process
        #[arg(short, long, default_value = "5")]
        tickets: u32,

        /// Number of draws
        #[arg(short, long, default_value = "1000")]
        rounds: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "lottery_ledger=debug"
    } else {
        "lottery_ledger=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_check_config(config: Option<String>, overrides: ConfigOverrides) -> Result<CheckConfig> {
    let base = match config {
        Some(path) => {
            info!(path = %path, "loading config");
            CheckConfig::from_json_file(path)?
        }
        None => CheckConfig::default(),
    };
    overrides.apply(base)
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Check {
            config,
            processes,
            tickets,
            policy,
            cases,
            max_len,
            strategy,
            seed,
            output,
        } => {
            let overrides = ConfigOverrides {
                process_count: processes,
                initial_tickets: tickets,
                policy: policy.map(|p| p.parse::<BoundaryPolicy>()).transpose()?,
                cases,
                strategy,
                max_len,
                seed,
            };
            let config = build_check_config(config, overrides)?;
            let report = PropertyDriver::new(config)?.check()?;

            match output.as_str() {
                "json" => println!("{}", report.to_json()?),
                _ => print!("{report}"),
            }

            Ok(if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Replay {
            processes,
            tickets,
            policy,
            transactions,
        } => {
            let policy: BoundaryPolicy = policy.parse()?;
            let script = transactions
                .iter()
                .map(|s| s.parse::<Transaction>())
                .collect::<Result<Vec<_>>>()?;

            let mut ledger = Ledger::new(processes, tickets)?.with_policy(policy);
            println!(
                "start            {:?} total={}",
                ledger.tickets(),
                ledger.total_tickets()
            );

            for (step, tx) in script.iter().enumerate() {
                let outcome = match ledger.apply(*tx) {
                    Ok(outcome) => format!("{outcome:?}").to_lowercase(),
                    Err(err) if err.is_rejection() => format!("rejected ({err})"),
                    Err(err) => return Err(err),
                };
                println!(
                    "{step:>3} {:<12} {:?} total={} [{outcome}]",
                    tx.to_string(),
                    ledger.tickets(),
                    ledger.total_tickets()
                );

                if let Err(violation) = ledger.check() {
                    println!("INVALID after step {step}: {violation}");
                    return Ok(ExitCode::FAILURE);
                }
            }

            println!("valid after {} transactions", script.len());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Generate {
            processes,
            count,
            max_len,
            strategy,
            seed,
        } => {
            let strategy = GenerationStrategy::from_name(&strategy, max_len)?;
            let mut generator = TransactionGenerator::new(processes, seed)?;

            for (i, sequence) in generator.generate(&strategy, count).iter().enumerate() {
                let script: Vec<String> = sequence.iter().map(ToString::to_string).collect();
                println!("# Sequence {} ({} transactions)", i + 1, sequence.len());
                println!("{}", script.join(" "));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Draw {
            processes,
            tickets,
            rounds,
            seed,
        } => {
            let ledger = Ledger::new(processes, tickets)?;
            let mut rng = StdRng::seed_from_u64(seed);
            let mut wins = vec![0usize; processes];

            for _ in 0..rounds {
                if let Some(winner) = ledger.draw(&mut rng) {
                    wins[winner] += 1;
                }
            }

            println!("Lottery draws: {rounds} (seed {seed})");
            for (process, count) in wins.iter().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let share = if rounds == 0 {
                    0.0
                } else {
                    *count as f64 / rounds as f64 * 100.0
                };
                println!(
                    "  process {process:>3}: {count:>7} wins ({share:5.1}%), {} tickets",
                    ledger.tickets()[process]
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::from(2)
        }
    }
}
