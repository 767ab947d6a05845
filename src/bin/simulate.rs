//! Random shootout batch CLI.
//!
//! Plays random shootouts against a probability table and outputs each one's
//! win-probability trace as JSONL.
//!
//! Usage:
//!   cargo run --release --bin simulate -- [OPTIONS]
//!
//! Options:
//!   --shootouts N   Number of shootouts to play (default: 100)
//!   --rate P        Chance each simulated kick scores (default: 0.690625)
//!   --make P        Make probability used by the resolver (default: 0.690625)
//!   --table FILE    Probability table artifact (default: none, all simulated)
//!   --threads N     Number of parallel threads (default: 4)
//!   --seed N        Random seed, 0 for entropy (default: 0)
//!   --output FILE   Output file path (default: stdout)
//!   --quiet         Suppress progress and summary output

use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use spotkick::resolve::ProbabilityTable;
use spotkick::simulate::{self, SimulationConfig};

struct Args {
    config: SimulationConfig,
    table_path: Option<String>,
    output_path: Option<String>,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    args.get(i)
        .ok_or_else(|| format!("missing value for {}", flag))?
        .parse()
        .map_err(|_| format!("invalid {} value: {}", flag, args[i]))
}

fn parse_probability(args: &[String], i: usize, flag: &str) -> Result<f64, String> {
    let p: f64 = parse_value(args, i, flag)?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{} must be in [0, 1], got {}", flag, p))
    }
}

/// Parses command-line flags. `Ok(None)` means help was requested.
fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut config = SimulationConfig::default();
    let mut table_path = None;
    let mut output_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--shootouts" => {
                i += 1;
                config.num_shootouts = parse_value(args, i, "--shootouts")?;
            }
            "--rate" => {
                i += 1;
                config.kick_success_rate = parse_probability(args, i, "--rate")?;
            }
            "--make" => {
                i += 1;
                config.resolver.make_probability = parse_probability(args, i, "--make")?;
            }
            "--table" => {
                i += 1;
                table_path = Some(parse_value::<String>(args, i, "--table")?);
            }
            "--threads" => {
                i += 1;
                config.threads = parse_value(args, i, "--threads")?;
            }
            "--seed" => {
                i += 1;
                config.seed = parse_value(args, i, "--seed")?;
            }
            "--output" => {
                i += 1;
                output_path = Some(parse_value::<String>(args, i, "--output")?);
            }
            "--quiet" => {
                config.quiet = true;
            }
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }

    Ok(Some(Args {
        config,
        table_path,
        output_path,
    }))
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args) {
        Ok(Some(a)) => a,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let default_level = if args.config.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.config;
    let table = match &args.table_path {
        Some(path) => {
            let table = ProbabilityTable::load(Path::new(path))?;
            table.check_complete()?;
            table
        }
        None => ProbabilityTable::empty(),
    };

    log::info!(
        "simulating {} shootouts, kick rate {:.4}, make probability {:.6}, {} threads",
        config.num_shootouts,
        config.kick_success_rate,
        config.resolver.make_probability,
        config.threads
    );

    let start = Instant::now();
    let records = simulate::run_simulation(&table, &config)?;
    let elapsed = start.elapsed();

    let summary = simulate::summarize(&records);
    log::info!(
        "completed {} shootouts in {:.2}s: team_1 {} wins, team_2 {} wins, {} level after regulation",
        summary.shootouts,
        elapsed.as_secs_f64(),
        summary.wins.team_1,
        summary.wins.team_2,
        summary.regulation_ties
    );

    match args.output_path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(&path)?);
            simulate::write_jsonl(&records, &mut writer)?;
            log::info!("wrote {} shootouts to {}", records.len(), path);
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            simulate::write_jsonl(&records, &mut writer)?;
        }
    }
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: simulate [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --shootouts N   Number of shootouts to play (default: 100)");
    eprintln!("  --rate P        Chance each simulated kick scores (default: 0.690625)");
    eprintln!("  --make P        Make probability used by the resolver (default: 0.690625)");
    eprintln!("  --table FILE    Probability table artifact (default: none, all simulated)");
    eprintln!("  --threads N     Number of parallel threads (default: 4)");
    eprintln!("  --seed N        Random seed, 0 for entropy (default: 0)");
    eprintln!("  --output FILE   Output file path (default: stdout)");
    eprintln!("  --quiet         Suppress progress and summary output");
    eprintln!("  --help          Show this help");
}
