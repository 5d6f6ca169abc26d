//! pipbench CLI: run, symbol resolution, and synthetic data commands.
//!
//! Commands:
//! - `run`: execute a run from a TOML config file and print assessor reports
//! - `symbols`: show which data symbols are needed to price a requested set
//! - `synthesize`: write a seeded random-walk CSV for demos

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pipbench_core::domain::Symbol;
use pipbench_core::symbols::SymbolGraph;
use pipbench_runner::{run_from_config, synthetic, write_csv, RunConfig};

#[derive(Parser)]
#[command(name = "pipbench", about = "pipbench: minute-bar FX predictor benchmarking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a run from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Print the outcome as JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Resolve the data symbols needed to price the requested symbols.
    Symbols {
        /// Symbols to trade (e.g., EURJPY GBPUSD).
        #[arg(long, num_args = 1.., required = true)]
        requested: Vec<String>,

        /// Symbols present in the data set.
        #[arg(long, num_args = 1.., required = true)]
        available: Vec<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write synthetic minute bars as CSV.
    Synthesize {
        #[arg(long, num_args = 1.., required = true)]
        symbols: Vec<String>,

        #[arg(long)]
        minutes: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// First bar's timestamp (RFC 3339).
        #[arg(long, default_value = "2020-01-01T00:00:00Z")]
        start: String,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, json } => cmd_run(config, json),
        Commands::Symbols {
            requested,
            available,
            json,
        } => cmd_symbols(&requested, &available, json),
        Commands::Synthesize {
            symbols,
            minutes,
            seed,
            start,
            out,
        } => cmd_synthesize(&symbols, minutes, seed, &start, out),
    }
}

fn cmd_run(path: PathBuf, json: bool) -> Result<()> {
    let config = RunConfig::from_file(&path)?;
    info!(config = %path.display(), predictor = %config.predictor.predictor_type, "starting run");
    let outcome = run_from_config(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!(
        "tradable: {}",
        outcome.tradable.iter().map(Symbol::to_string).collect::<Vec<_>>().join(" ")
    );
    if !outcome.dropped.is_empty() {
        println!(
            "dropped:  {}",
            outcome.dropped.iter().map(Symbol::to_string).collect::<Vec<_>>().join(" ")
        );
    }
    println!(
        "periods:  {} x {} minutes",
        outcome.periods, outcome.minutes_per_period
    );
    for report in &outcome.reports {
        println!();
        print!("{report}");
    }
    Ok(())
}

fn cmd_symbols(requested: &[String], available: &[String], json: bool) -> Result<()> {
    let requested = Symbol::parse_list(requested)?;
    let available = Symbol::parse_list(available)?;
    let graph = SymbolGraph::new(&available)?;
    let required = graph.required_symbols(&requested)?;

    if json {
        println!("{}", serde_json::to_string(&required)?);
        return Ok(());
    }
    for symbol in &requested {
        match graph.chain(*symbol) {
            Some(chain) => {
                let legs: Vec<String> = chain
                    .iter()
                    .map(|hop| {
                        if hop.inverted {
                            format!("1/{}", hop.symbol)
                        } else {
                            hop.symbol.to_string()
                        }
                    })
                    .collect();
                println!("{symbol}: {}", legs.join(" * "));
            }
            None => println!("{symbol}: unreachable"),
        }
    }
    println!(
        "required: {}",
        required.iter().map(Symbol::to_string).collect::<Vec<_>>().join(" ")
    );
    Ok(())
}

fn cmd_synthesize(
    symbols: &[String],
    minutes: usize,
    seed: u64,
    start: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    if minutes == 0 {
        bail!("--minutes must be at least 1");
    }
    let symbols = Symbol::parse_list(symbols)?;
    let start: DateTime<Utc> = DateTime::parse_from_rfc3339(start)
        .with_context(|| format!("invalid --start '{start}'"))?
        .with_timezone(&Utc);
    let data = synthetic(&symbols, minutes, seed, start);

    match out {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_csv(&data, BufWriter::new(file))?;
            info!(path = %path.display(), bars = data.bar_count(), "wrote synthetic data");
        }
        None => write_csv(&data, io::stdout().lock())?,
    }
    Ok(())
}
