//! `poolsim exp-terms`: print the fixed-point exponential series

use anyhow::{Context, Result};
use colored::Colorize;
use pool_model::{ExpParams, ExpSeries, Uint};

fn hex(value: &Uint) -> String {
    format!("0x{:x}", value)
}

pub fn print_exp_terms(params: ExpParams) -> Result<()> {
    let series = ExpSeries::generate(params).context("Failed to generate exp series")?;

    println!("{}", "=== Exp Series ===".bright_green().bold());
    println!("{} {}", "Max precision:".bright_cyan(), params.max_precision);
    println!("{} {}", "One:".bright_cyan(), hex(series.one()));
    println!("{} {}", "Max input:".bright_cyan(), hex(series.max_input()));

    println!("\n{} ({})", "Hi terms".bright_yellow().bold(), series.hi_terms().len());
    for term in series.hi_terms() {
        println!("  bit {}  num {}  den {}", hex(&term.bit), hex(&term.num), hex(&term.den));
    }

    println!("\n{} ({})", "Lo terms".bright_yellow().bold(), series.lo_terms().len());
    for term in series.lo_terms() {
        println!("  ind {:>3}  val {}", term.ind, hex(&term.val));
    }
    Ok(())
}
