mod common;

use anyhow::Result;
use common::test_clock;
use expense_tracker::application::Ledger;
use expense_tracker::domain::ManualClock;
use expense_tracker::io::{Exporter, ReportFormat, ReportOptions, ReportSnapshot};
use expense_tracker::storage::MemoryStore;

async fn sample_ledger(store: &MemoryStore) -> Result<Ledger<&MemoryStore, ManualClock>> {
    let mut ledger = Ledger::init(store, test_clock()).await;
    ledger.add("Lunch", "120").await?;
    ledger.add("Taxi, airport", "1085.5").await?;
    Ok(ledger)
}

#[tokio::test]
async fn test_export_csv() -> Result<()> {
    let store = MemoryStore::new();
    let ledger = sample_ledger(&store).await?;

    let mut output = Vec::new();
    let count = Exporter::new(&ledger).export_csv(&mut output)?;
    let csv = String::from_utf8(output)?;

    assert_eq!(count, 2);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "id,date,name,amount");
    // Newest first, commas quoted
    assert!(lines[1].ends_with(",2025-01-15,\"Taxi, airport\",1085.50"));
    assert!(lines[2].ends_with(",2025-01-15,Lunch,120.00"));
    assert_eq!(lines.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_export_text_has_listing_and_summary() -> Result<()> {
    let store = MemoryStore::new();
    let ledger = sample_ledger(&store).await?;

    let mut output = Vec::new();
    let count = Exporter::new(&ledger)
        .with_options(ReportOptions {
            currency: "EUR".into(),
            date_format: "%d.%m.%Y".into(),
        })
        .export(ReportFormat::Text, &mut output)?;
    let text = String::from_utf8(output)?;

    assert_eq!(count, 2);
    assert!(text.starts_with("Expense report, 15.01.2025"));
    assert!(text.contains("EUR 1,085.5"));
    assert!(text.contains("EUR 120"));
    assert!(text.contains("Total:       EUR 1,205.5"));
    assert!(text.contains("Today:       EUR 1,205.5"));
    assert!(text.contains("Records:     2"));

    // Rows follow ledger order
    let taxi = text.find("Taxi, airport").unwrap();
    let lunch = text.find("Lunch").unwrap();
    assert!(taxi < lunch);

    Ok(())
}

#[tokio::test]
async fn test_export_json_snapshot() -> Result<()> {
    let store = MemoryStore::new();
    let ledger = sample_ledger(&store).await?;

    let mut output = Vec::new();
    Exporter::new(&ledger).export(ReportFormat::Json, &mut output)?;
    let snapshot: ReportSnapshot = serde_json::from_slice(&output)?;

    assert_eq!(snapshot.summary, ledger.summary());
    assert_eq!(snapshot.records, ledger.records());
    assert_eq!(snapshot.version, env!("CARGO_PKG_VERSION"));

    Ok(())
}

#[tokio::test]
async fn test_export_empty_ledger_writes_nothing() -> Result<()> {
    let store = MemoryStore::new();
    let ledger = Ledger::init(&store, test_clock()).await;
    let exporter = Exporter::new(&ledger);

    for format in [ReportFormat::Csv, ReportFormat::Text, ReportFormat::Json] {
        let mut output = Vec::new();
        assert_eq!(exporter.export(format, &mut output)?, 0);
        assert!(output.is_empty());
    }

    Ok(())
}

#[tokio::test]
async fn test_export_text_with_invalid_date_format_fails() -> Result<()> {
    let store = MemoryStore::new();
    let ledger = sample_ledger(&store).await?;

    let mut output = Vec::new();
    let result = Exporter::new(&ledger)
        .with_options(ReportOptions {
            currency: "EUR".into(),
            date_format: "%Q".into(),
        })
        .export(ReportFormat::Text, &mut output);

    assert!(result.is_err());

    Ok(())
}

#[tokio::test]
async fn test_export_keeps_exact_amounts() -> Result<()> {
    let store = MemoryStore::new();
    let mut ledger = Ledger::init(&store, test_clock()).await;
    ledger.add("Gum", "0.001").await?;

    let mut output = Vec::new();
    Exporter::new(&ledger).export_csv(&mut output)?;
    let csv = String::from_utf8(output)?;
    assert!(csv.lines().nth(1).unwrap().ends_with(",Gum,0.001"));

    let mut output = Vec::new();
    Exporter::new(&ledger).export_json(&mut output)?;
    let snapshot: ReportSnapshot = serde_json::from_slice(&output)?;
    assert_eq!(snapshot.summary.total, ledger.total());

    Ok(())
}
