use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Amount;

pub type ExpenseId = u64;

/// A single recorded expense.
/// Records are immutable once created; the ledger only inserts and removes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Unique among the records held by a ledger
    pub id: ExpenseId,
    /// Trimmed, never empty
    pub name: String,
    /// Exact amount as entered (always positive), stored as a plain JSON number
    #[serde(with = "crate::domain::amount_json")]
    pub amount: Amount,
    /// Calendar day the expense was recorded on, used for "today" bucketing
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    /// When the record was created
    #[serde(rename = "timestamp", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    /// Create a new record. Callers are expected to have validated the input.
    pub fn new(
        id: ExpenseId,
        name: impl Into<String>,
        amount: Amount,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            amount,
            date,
            created_at,
        }
    }

    /// Returns true if the record was made on the given calendar day.
    pub fn is_on(&self, day: NaiveDate) -> bool {
        self.date == day
    }
}

/// Dates are written as ISO `YYYY-MM-DD`. Reading also accepts the `YYYY/M/D`
/// form that older stored data used.
mod calendar_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const ISO_FORMAT: &str = "%Y-%m-%d";
    const LEGACY_FORMAT: &str = "%Y/%m/%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(ISO_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(raw.trim(), ISO_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(raw.trim(), LEGACY_FORMAT))
            .map_err(|_| D::Error::custom(format!("invalid date: {:?}", raw)))
    }
}
