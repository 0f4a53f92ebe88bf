use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufRead, Write, stdin, stdout};

use crate::application::{AppError, Ledger};
use crate::domain::{
    Clock, ExpenseId, ExpenseRecord, SystemClock, format_amount, total_amount,
};
use crate::io::{Exporter, ReportFormat, ReportOptions, report_file_name, truncate};
use crate::settings::{Overrides, Settings};
use crate::storage::{BlobStore, EXPENSES_KEY, Repository, decode_records};

/// Expense Tracker - record daily spending and export reports
#[derive(Parser)]
#[command(name = "expense-tracker")]
#[command(about = "A local-first expense tracker: record expenses, see totals, export reports")]
#[command(version)]
pub struct Cli {
    /// Database file path (overrides the configuration)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Configuration file (defaults to ./expense-tracker.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Ledger(LedgerCommand),

    /// Verify the stored expense data
    Check {
        /// Discard stored data that cannot be read
        #[arg(long)]
        reset: bool,
    },
}

/// Commands that work on the loaded ledger
#[derive(Subcommand)]
pub enum LedgerCommand {
    /// Record a new expense
    Add {
        /// What the money was spent on
        name: String,

        /// Amount spent (e.g., "120" or "120.50")
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// List recorded expenses, newest first
    List {
        /// Maximum number of expenses to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show total, today's total and number of expenses
    Summary,

    /// Delete one expense
    Delete {
        /// Expense ID (see `list`)
        id: ExpenseId,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every expense
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Export a report of all expenses
    Export {
        /// Format: csv, text, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file ("-" for stdout, defaults to expense-report-<date>.<ext>)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    /// Resolve settings from defaults, config file, environment and flags.
    pub fn settings(&self) -> Result<Settings> {
        let overrides = Overrides {
            database: self.database.clone(),
            log_level: self.verbose.then(|| "debug".to_string()),
        };
        Ok(Settings::load(self.config.as_deref(), overrides)?)
    }

    pub async fn run(self, settings: Settings) -> Result<()> {
        let repo = Repository::open(&settings.database)
            .await
            .map_err(AppError::Database)?;

        let command = match self.command {
            Commands::Check { reset } => return run_check_command(&repo, reset).await,
            Commands::Ledger(command) => command,
        };

        let mut ledger = Ledger::init(repo, SystemClock).await;
        run_ledger_command(&mut ledger, command, &settings).await?;

        if !ledger.is_durable() {
            anyhow::bail!(
                "Changes could not be saved to {}; they are lost when this command exits",
                settings.database
            );
        }

        Ok(())
    }
}

/// Dispatch a command that works on an opened ledger.
async fn run_ledger_command<S: BlobStore, C: Clock>(
    ledger: &mut Ledger<S, C>,
    command: LedgerCommand,
    settings: &Settings,
) -> Result<()> {
    match command {
        LedgerCommand::Add { name, amount } => {
            let record = ledger.add(&name, &amount).await.map_err(AppError::from)?;
            println!(
                "Added: {} {} {} ({}, id {})",
                record.name,
                settings.currency,
                format_amount(record.amount),
                settings.format_date(record.date),
                record.id
            );
        }

        LedgerCommand::List { limit } => run_list_command(ledger, limit, settings),

        LedgerCommand::Summary => run_summary_command(ledger, settings),

        LedgerCommand::Delete { id, yes } => {
            let Some(record) = ledger.find(id).cloned() else {
                println!("No expense with id {}", id);
                return Ok(());
            };

            let prompt = format!(
                "Delete '{}' ({} {}, {})?",
                record.name,
                settings.currency,
                format_amount(record.amount),
                settings.format_date(record.date)
            );
            if !yes && !confirm(&prompt)? {
                println!("Cancelled.");
                return Ok(());
            }

            ledger.delete_by_id(id).await;
            println!("Deleted: {}", record.name);
        }

        LedgerCommand::Clear { yes } => {
            if ledger.is_empty() {
                println!("Nothing to clear.");
                return Ok(());
            }

            let prompt = format!(
                "Delete all {} expenses? This cannot be undone.",
                ledger.count()
            );
            if !yes && !confirm(&prompt)? {
                println!("Cancelled.");
                return Ok(());
            }

            let removed = ledger.clear().await;
            println!("Cleared {} expenses.", removed);
        }

        LedgerCommand::Export { format, output } => {
            let format: ReportFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            run_export_command(ledger, format, output.as_deref(), settings)?;
        }
    }

    Ok(())
}

fn run_list_command<S: BlobStore, C: Clock>(
    ledger: &Ledger<S, C>,
    limit: Option<usize>,
    settings: &Settings,
) {
    if ledger.is_empty() {
        println!("No expenses recorded yet.");
        println!("Record your first one with: expense-tracker add <name> <amount>");
        return;
    }

    println!("{} expenses, newest first", ledger.count());
    println!();
    println!(
        "{:<15} {:<12} {:<30} {:>16}",
        "ID", "DATE", "ITEM", "AMOUNT"
    );
    println!("{}", "-".repeat(76));

    let shown = limit.unwrap_or(usize::MAX);
    for record in ledger.records().iter().take(shown) {
        print_record_row(record, settings);
    }
}

fn print_record_row(record: &ExpenseRecord, settings: &Settings) {
    println!(
        "{:<15} {:<12} {:<30} {:>16}",
        record.id,
        settings.format_date(record.date),
        truncate(&record.name, 30),
        format!("{} {}", settings.currency, format_amount(record.amount))
    );
}

fn run_summary_command<S: BlobStore, C: Clock>(ledger: &Ledger<S, C>, settings: &Settings) {
    let summary = ledger.summary();
    println!(
        "Total spent:  {} {}",
        settings.currency,
        format_amount(summary.total)
    );
    println!(
        "Spent today:  {} {}",
        settings.currency,
        format_amount(summary.today_total)
    );
    println!("Expenses:     {}", summary.count);
}

fn run_export_command<S: BlobStore, C: Clock>(
    ledger: &Ledger<S, C>,
    format: ReportFormat,
    output: Option<&str>,
    settings: &Settings,
) -> Result<()> {
    if ledger.is_empty() {
        println!("Nothing to export: no expenses recorded.");
        return Ok(());
    }

    let exporter = Exporter::new(ledger).with_options(ReportOptions::from(settings));

    let count = match output {
        Some("-") => exporter.export(format, stdout().lock())?,
        _ => {
            let path = output
                .map(str::to_string)
                .unwrap_or_else(|| report_file_name(ledger.today(), format));
            let file = File::create(&path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            let count = exporter.export(format, file)?;
            eprintln!("Exported {} expenses to {}", count, path);
            count
        }
    };

    tracing::info!(count, ?format, "exported report");
    Ok(())
}

async fn run_check_command(repo: &Repository, reset: bool) -> Result<()> {
    println!("Checking stored expenses...\n");

    let Some(blob) = repo.get_blob(EXPENSES_KEY).await? else {
        println!("No stored expenses yet.");
        return Ok(());
    };

    match decode_records(&blob) {
        Ok(records) => {
            println!("Records: {}", records.len());
            println!("Total:   {}", format_amount(total_amount(&records)));
            println!();
            println!("Stored expenses are consistent.");
            Ok(())
        }
        Err(err) if reset => {
            println!("Issue found: {}", err);
            repo.remove_blob(EXPENSES_KEY).await?;
            println!("Discarded the unreadable data.");
            Ok(())
        }
        Err(err) => {
            println!("Issue found: {}", err);
            println!("The ledger starts empty while this data is present.");
            println!("Run `expense-tracker check --reset` to discard it.");
            Err(AppError::Persistence(err).into())
        }
    }
}

/// Ask a yes/no question on stdin. Anything but "y"/"yes" means no.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    stdout().flush()?;

    let mut answer = String::new();
    stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
