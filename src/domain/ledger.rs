use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::warn;

use super::{Amount, ExpenseId, ExpenseRecord, max_amount, parse_amount};

/// Reasons a new expense is rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter an item name")]
    EmptyName,

    #[error("Please enter a valid amount greater than zero")]
    InvalidAmount,
}

/// Input for a new expense that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidExpense {
    pub name: String,
    pub amount: Amount,
}

/// Validate raw user input for a new expense.
/// The name is checked first, so input with both problems reports `EmptyName`.
pub fn validate_expense(name: &str, amount_text: &str) -> Result<ValidExpense, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    let amount = parse_amount(amount_text).map_err(|_| ValidationError::InvalidAmount)?;
    if amount <= Amount::ZERO || amount > max_amount() {
        return Err(ValidationError::InvalidAmount);
    }

    Ok(ValidExpense {
        name: name.to_string(),
        amount,
    })
}

/// Sum of all amounts.
pub fn total_amount(records: &[ExpenseRecord]) -> Amount {
    sum_amounts(records.iter())
}

/// Sum of the amounts recorded on the given calendar day.
pub fn total_on(day: NaiveDate, records: &[ExpenseRecord]) -> Amount {
    sum_amounts(records.iter().filter(|record| record.is_on(day)))
}

/// Exact sum. Only hand-edited stored data can overflow the decimal range;
/// that is logged and reported as `Amount::MAX`.
fn sum_amounts<'a>(mut records: impl Iterator<Item = &'a ExpenseRecord>) -> Amount {
    records
        .try_fold(Amount::ZERO, |total, record| total.checked_add(record.amount))
        .unwrap_or_else(|| {
            warn!("sum of expenses exceeds the representable range");
            Amount::MAX
        })
}

/// Pick an id for a record created at `now`.
///
/// Ids are Unix milliseconds of the creation instant, bumped past `floor` so
/// that several records created within the same millisecond stay distinct.
pub fn next_expense_id(now: DateTime<Utc>, floor: ExpenseId) -> ExpenseId {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    millis.max(floor.saturating_add(1))
}

/// Check the invariants every stored record must satisfy.
pub fn check_records(records: &[ExpenseRecord]) -> Result<(), RecordError> {
    let mut seen = HashSet::with_capacity(records.len());

    for record in records {
        if record.name.trim().is_empty() {
            return Err(RecordError::EmptyName { id: record.id });
        }
        if record.name.trim() != record.name {
            return Err(RecordError::UntrimmedName { id: record.id });
        }
        if record.amount <= Amount::ZERO {
            return Err(RecordError::NonPositiveAmount {
                id: record.id,
                amount: record.amount,
            });
        }
        if !seen.insert(record.id) {
            return Err(RecordError::DuplicateId(record.id));
        }
    }

    Ok(())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record {id} has an empty name")]
    EmptyName { id: ExpenseId },

    #[error("record {id} has a name with surrounding whitespace")]
    UntrimmedName { id: ExpenseId },

    #[error("record {id} has a non-positive amount ({amount})")]
    NonPositiveAmount { id: ExpenseId, amount: Amount },

    #[error("duplicate record id {0}")]
    DuplicateId(ExpenseId),
}
