// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use clap::Parser;
use tally::application::{Session, SessionEnd};
use tally::cli::Cli;
use tally::domain::{parse_amount, Cents, Ledger};

/// Amount in cents from a decimal string, for readable fixtures
pub fn cents(amount: &str) -> Cents {
    parse_amount(amount).unwrap()
}

/// Ledger opened with the demo's standard starting balance of 1000.00
pub fn standard_ledger() -> Ledger {
    Ledger::new(cents("1000.00")).unwrap()
}

/// Feed newline-separated menu input to a session over `ledger`.
/// Returns how the session ended and everything it printed.
pub fn run_script(ledger: &mut Ledger, lines: &[&str]) -> Result<(SessionEnd, String)> {
    let input = lines.iter().map(|l| format!("{l}\n")).collect::<String>();
    let mut output = Vec::new();
    let end = Session::new(ledger, input.as_bytes(), &mut output).run()?;
    Ok((end, String::from_utf8(output)?))
}

/// Run the whole program (argument parsing included) over a scripted terminal.
pub fn run_program(args: &[&str], lines: &[&str]) -> Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("tally").chain(args.iter().copied()))?;
    let input = lines.iter().map(|l| format!("{l}\n")).collect::<String>();
    let mut output = Vec::new();
    cli.run_with(input.as_bytes(), &mut output)?;
    Ok(String::from_utf8(output)?)
}
