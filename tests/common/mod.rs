// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use expense_tracker::domain::ManualClock;
use expense_tracker::storage::Repository;
use tempfile::TempDir;

/// Helper to create a SQLite-backed store in a temporary directory
pub async fn test_repo() -> Result<(Repository, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let repo = Repository::open(db_path.to_str().unwrap()).await?;
    Ok((repo, temp_dir))
}

/// Helper to build a UTC instant
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
}

/// A clock frozen at 2025-01-15 12:00 UTC
pub fn test_clock() -> ManualClock {
    ManualClock::new(at(2025, 1, 15, 12, 0))
}

/// A blob in the format the browser version stored
pub const BROWSER_BLOB: &str = r#"[
    {"id":1736913950000,"name":"Taxi","amount":85,"date":"2025/1/15","timestamp":"2025-01-15T04:05:50.000Z"},
    {"id":1736827506789,"name":"Lunch","amount":120,"date":"2025/1/14","timestamp":"2025-01-14T04:05:06.789Z"}
]"#;
