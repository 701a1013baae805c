//! `poolsim run` and `poolsim new`

use anyhow::{Context, Result};
use colored::Colorize;
use pool_model::{new_pool, Pool, Symbol, Uint};
use std::fs;
use std::path::Path;

use crate::config::SimConfig;
use crate::report;
use crate::script::{parse_script, Simulation};

/// Replay a script and write the CSV report
///
/// On a failing command the rows gathered so far are still written before
/// the error is returned.
pub fn run_script(config: &SimConfig, script: &Path, report_path: Option<&Path>) -> Result<()> {
    let data = fs::read_to_string(script)
        .with_context(|| format!("Failed to read script: {}", script.display()))?;
    let commands = parse_script(&data)
        .with_context(|| format!("Failed to parse script: {}", script.display()))?;
    let report_path = report_path.unwrap_or(config.report.as_path());

    println!("{}", "=== Running Script ===".bright_green().bold());
    println!("{} {}", "Script:".bright_cyan(), script.display());
    println!("{} {}", "Commands:".bright_cyan(), commands.len());

    let mut sim = Simulation::new();
    let outcome = sim.run(&commands);

    report::write_csv(report_path, sim.history())?;
    println!("{} {}", "Report:".bright_cyan(), report_path.display());

    if let Err(err) = outcome {
        println!("\n{} {}", "✗".bright_red(), err);
        return Err(err.into());
    }

    if let Some(pool) = sim.pool() {
        print_pool(pool);
    }
    println!("\n{} {} commands applied", "✓".bright_green(), commands.len());
    Ok(())
}

/// Create a pool from flags or config and print its snapshot as JSON
pub fn new_pool_command(
    config: &SimConfig,
    swap_fee: Option<u32>,
    users: Option<usize>,
    initial_amount: Option<Uint>,
) -> Result<()> {
    let swap_fee = swap_fee.unwrap_or(config.swap_fee);
    let users = users.unwrap_or(config.num_of_users);
    let initial_amount = initial_amount.unwrap_or_else(|| config.initial_amount.clone());

    let pool = new_pool(swap_fee, users, &initial_amount).context("Failed to create pool")?;
    let json = serde_json::to_string_pretty(&pool.snapshot())?;
    println!("{}", json);
    Ok(())
}

fn print_pool(pool: &Pool) {
    println!("\n{}", "=== Final Pool ===".bright_green().bold());
    println!("{} {} ppm", "Swap fee:".bright_cyan(), pool.swap_fee());
    for symbol in Symbol::ALL {
        let branch = pool.branch(symbol);
        println!("\n{}", symbol.as_str().bright_yellow().bold());
        println!("  {} {}", "Rate:".bright_cyan(), branch.reserve_rate());
        println!("  {} {}", "Staked:".bright_cyan(), branch.reserve_staked());
        match pool.pool_balance(symbol) {
            Ok(held) => println!("  {} {}", "Held:".bright_cyan(), held),
            Err(err) => println!("  {} {}", "Held:".bright_cyan(), err.to_string().red()),
        }
        println!(
            "  {} {}",
            "Shares:".bright_cyan(),
            branch.pool_token().total_supply()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_script_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.json");
        let report = dir.path().join("out.csv");
        fs::write(&script, include_str!("../scripts/arbitrage.json")).unwrap();

        run_script(&SimConfig::default(), &script, Some(report.as_path())).unwrap();

        let csv = fs::read_to_string(&report).unwrap();
        assert_eq!(csv.lines().count(), 7);
        assert!(csv.lines().next().unwrap().contains("TKN.reserveToken.balanceOf.pool"));
    }

    #[test]
    fn test_failed_script_still_writes_partial_report() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.json");
        let report = dir.path().join("out.csv");
        fs::write(
            &script,
            r#"[
                {"operation": "newPool", "swapFee": 0, "numOfUsers": 1, "initialAmount": 10},
                {"operation": "swap", "sourceToken": "TKN", "targetToken": "TKN", "user": "user1", "amount": 1}
            ]"#,
        )
        .unwrap();

        let err = run_script(&SimConfig::default(), &script, Some(report.as_path())).unwrap_err();

        assert!(err.to_string().contains("swap"));
        assert_eq!(fs::read_to_string(&report).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_script(&SimConfig::default(), &dir.path().join("none.json"), None).unwrap_err();
        assert!(err.to_string().contains("Failed to read script"));
    }
}
