use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;

use crate::application::{Ledger, LedgerSummary};
use crate::domain::{Clock, ExpenseRecord, format_amount, format_fixed};
use crate::settings::Settings;
use crate::storage::BlobStore;

/// Output formats for the expense report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Text,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

/// File name for a report generated on `day`, e.g. `expense-report-2025-01-15.csv`
pub fn report_file_name(day: NaiveDate, format: ReportFormat) -> String {
    format!(
        "expense-report-{}.{}",
        day.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Presentation choices for human-readable reports
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub currency: String,
    pub date_format: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            currency: "NT$".to_string(),
            date_format: "%Y/%m/%d".to_string(),
        }
    }
}

impl From<&Settings> for ReportOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            currency: settings.currency.clone(),
            date_format: settings.date_format.clone(),
        }
    }
}

/// JSON report document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub summary: LedgerSummary,
    pub records: Vec<ExpenseRecord>,
}

/// Exporter for turning the ledger into a report.
///
/// Every export of an empty ledger writes nothing and returns 0.
pub struct Exporter<'a, S, C> {
    ledger: &'a Ledger<S, C>,
    options: ReportOptions,
}

impl<'a, S: BlobStore, C: Clock> Exporter<'a, S, C> {
    pub fn new(ledger: &'a Ledger<S, C>) -> Self {
        Self {
            ledger,
            options: ReportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    /// Write the report in the given format. Returns the number of records written.
    pub fn export<W: Write>(&self, format: ReportFormat, writer: W) -> Result<usize> {
        match format {
            ReportFormat::Csv => self.export_csv(writer),
            ReportFormat::Text => self.export_text(writer),
            ReportFormat::Json => self.export_json(writer),
        }
    }

    /// One row per record, in ledger order.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let records = self.ledger.records();
        if records.is_empty() {
            return Ok(0);
        }

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["id", "date", "name", "amount"])?;

        for record in records {
            csv_writer.write_record(&[
                record.id.to_string(),
                record.date.format("%Y-%m-%d").to_string(),
                record.name.clone(),
                format_fixed(record.amount),
            ])?;
        }

        csv_writer.flush()?;
        Ok(records.len())
    }

    /// Plain-text table followed by a summary block.
    pub fn export_text<W: Write>(&self, mut writer: W) -> Result<usize> {
        let records = self.ledger.records();
        if records.is_empty() {
            return Ok(0);
        }

        let summary = self.ledger.summary();
        let currency = &self.options.currency;
        let date_format = &self.options.date_format;

        writeln!(
            writer,
            "Expense report, {}",
            format_date(self.ledger.today(), date_format)?
        )?;
        writeln!(writer)?;
        writeln!(writer, "{:<4} {:<12} {:<30} {:>16}", "#", "DATE", "ITEM", "AMOUNT")?;
        writeln!(writer, "{}", "-".repeat(65))?;

        for (index, record) in records.iter().enumerate() {
            writeln!(
                writer,
                "{:<4} {:<12} {:<30} {:>16}",
                index + 1,
                format_date(record.date, date_format)?,
                truncate(&record.name, 30),
                format!("{} {}", currency, format_amount(record.amount)),
            )?;
        }

        writeln!(writer, "{}", "-".repeat(65))?;
        writeln!(writer, "Total:       {} {}", currency, format_amount(summary.total))?;
        writeln!(
            writer,
            "Today:       {} {}",
            currency,
            format_amount(summary.today_total)
        )?;
        writeln!(writer, "Records:     {}", summary.count)?;
        writer.flush()?;

        Ok(records.len())
    }

    /// Summary plus the full record list as one JSON document.
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let records = self.ledger.records();
        if records.is_empty() {
            return Ok(0);
        }

        let snapshot = ReportSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            summary: self.ledger.summary(),
            records: records.to_vec(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(records.len())
    }
}

/// Render `date` with a strftime pattern, failing on an invalid pattern.
fn format_date(date: NaiveDate, pattern: &str) -> Result<String> {
    let mut formatted = String::new();
    write!(formatted, "{}", date.format(pattern))
        .map_err(|_| anyhow!("invalid date format '{}'", pattern))?;
    Ok(formatted)
}

/// Shorten `s` to at most `max_len` characters, marking the cut with "...".
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
