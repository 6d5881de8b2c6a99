use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::domain::{format_cents, Cents, Ledger, TransactionRecord};

/// Output formats for a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatementFormat {
    Csv,
    Json,
}

/// Point-in-time view of the account for JSON export
#[derive(Debug, Clone, Serialize)]
pub struct Statement<'a> {
    pub version: &'static str,
    pub generated_at: DateTime<Utc>,
    pub opening_balance: Cents,
    pub balance: Cents,
    /// Most recent first
    pub transactions: Vec<&'a TransactionRecord>,
}

/// Renders the ledger's history for reading outside the menu
pub struct Exporter<'a> {
    ledger: &'a Ledger,
}

impl<'a> Exporter<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    pub fn export<W: Write>(&self, format: StatementFormat, writer: W) -> Result<usize> {
        match format {
            StatementFormat::Csv => self.export_csv(writer),
            StatementFormat::Json => self
                .export_json(writer)
                .map(|statement| statement.transactions.len()),
        }
    }

    /// Export the history to CSV, one row per transaction, most recent first.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["sequence", "id", "kind", "amount", "recorded_at"])?;

        let mut count = 0;
        for record in self.ledger.history() {
            csv_writer.write_record(&[
                record.sequence().to_string(),
                record.id().to_string(),
                record.kind().as_str().to_string(),
                format_cents(record.amount_cents()),
                record.recorded_at().to_rfc3339(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export balances and history as a pretty-printed JSON document.
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<Statement<'a>> {
        let statement = Statement {
            version: env!("CARGO_PKG_VERSION"),
            generated_at: Utc::now(),
            opening_balance: self.ledger.opening_balance(),
            balance: self.ledger.current_balance(),
            transactions: self.ledger.history().iter().collect(),
        };

        serde_json::to_writer_pretty(&mut writer, &statement)?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(statement)
    }
}
