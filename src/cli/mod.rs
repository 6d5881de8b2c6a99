use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use crate::application::{open_ledger, Session, SessionEnd};
use crate::io::{Exporter, StatementFormat};

/// Tally - single-account ledger with undo
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Deposit, withdraw and undo against one in-memory account")]
#[command(version)]
pub struct Cli {
    /// Balance the account opens with (e.g., "1000.00" or "1000")
    #[arg(short, long, default_value = "1000.00", allow_hyphen_values = true)]
    pub opening_balance: String,

    /// Print the transaction statement in this format when the session ends
    #[arg(short, long, value_enum)]
    pub statement: Option<StatementFormat>,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Run the menu on the process's terminal.
    pub fn run(self) -> Result<()> {
        init_logging(self.verbose);

        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run the menu over arbitrary input and output streams.
    pub fn run_with<R: BufRead, W: Write>(self, input: R, mut output: W) -> Result<()> {
        let mut ledger = open_ledger(&self.opening_balance).with_context(|| {
            format!(
                "Fatal Error: Could not create account with opening balance '{}'",
                self.opening_balance
            )
        })?;

        let end = Session::new(&mut ledger, input, &mut output)
            .run()
            .context("Menu session failed")?;
        if end == SessionEnd::EndOfInput {
            info!("input closed before exit was chosen");
        }

        if let Some(format) = self.statement {
            Exporter::new(&ledger)
                .export(format, &mut output)
                .context("Failed to write statement")?;
        }

        let report = ledger.check_integrity();
        if !report.is_healthy() {
            warn!(issues = ?report.issues, "ledger integrity check failed");
        }

        writeln!(output, "Cleaning up transaction history...")?;
        let released = ledger.close();
        writeln!(
            output,
            "Cleanup complete. Released {} transaction(s). Goodbye!",
            released
        )?;
        output.flush()?;
        Ok(())
    }
}

/// Install the stderr log subscriber. Safe to call more than once.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
