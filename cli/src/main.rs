//! poolsim - two-token liquidity pool simulator
//!
//! Replays JSON command scripts against a simulated pool, writes a CSV
//! report of every intermediate state, and prints the fixed-point exp
//! series used by the on-chain pricing code.

use clap::{Parser, Subcommand};
use pool_model::{ExpParams, Uint};
use std::path::PathBuf;

mod config;
mod exp_terms;
mod report;
mod script;
mod simulate;

use config::SimConfig;

#[derive(Parser)]
#[command(name = "poolsim")]
#[command(about = "Two-token liquidity pool simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./poolsim.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON command script and write a CSV report
    Run {
        /// Script file
        script: PathBuf,

        /// Report path (overrides config)
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Create a pool and print its initial snapshot
    New {
        /// Swap fee in ppm
        #[arg(long)]
        swap_fee: Option<u32>,

        /// Number of simulated users
        #[arg(long)]
        users: Option<usize>,

        /// Reserve tokens minted to each user
        #[arg(long)]
        initial_amount: Option<Uint>,
    },

    /// Print the high and low terms of the exp series
    ExpTerms {
        /// ONE = 2^max_precision
        #[arg(long)]
        max_precision: Option<u32>,

        /// Inputs must stay below 2^max_hi_term_val
        #[arg(long)]
        max_hi_term_val: Option<u32>,

        /// Number of high terms below the top one
        #[arg(long)]
        num_of_hi_terms: Option<u32>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = SimConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { script, report } => {
            simulate::run_script(&config, &script, report.as_deref())?;
        }
        Commands::New { swap_fee, users, initial_amount } => {
            simulate::new_pool_command(&config, swap_fee, users, initial_amount)?;
        }
        Commands::ExpTerms { max_precision, max_hi_term_val, num_of_hi_terms } => {
            let params = ExpParams {
                max_precision: max_precision.unwrap_or(config.exp.max_precision),
                max_hi_term_val: max_hi_term_val.unwrap_or(config.exp.max_hi_term_val),
                num_of_hi_terms: num_of_hi_terms.unwrap_or(config.exp.num_of_hi_terms),
            };
            exp_terms::print_exp_terms(params)?;
        }
    }

    Ok(())
}
