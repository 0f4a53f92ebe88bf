use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::domain::{
    Amount, Clock, ExpenseId, ExpenseRecord, SystemClock, ValidationError, next_expense_id,
    total_amount, total_on, validate_expense,
};
use crate::storage::{BlobStore, EXPENSES_KEY, decode_records, encode_records};

/// Aggregates over the ledger at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    #[serde(with = "crate::domain::amount_json")]
    pub total: Amount,
    #[serde(with = "crate::domain::amount_json")]
    pub today_total: Amount,
    pub count: usize,
}

/// The expense ledger: an ordered list of records (newest first) mirrored to a
/// blob store after every mutation.
///
/// This is the primary interface for any front end. Mutations take `&mut self`,
/// so at most one is ever in flight.
pub struct Ledger<S, C = SystemClock> {
    store: S,
    clock: C,
    records: Vec<ExpenseRecord>,
    /// Highest id handed out so far, never reused within a session
    last_id: ExpenseId,
    durable: bool,
}

impl<S: BlobStore, C: Clock> Ledger<S, C> {
    /// Load the ledger from `store`.
    ///
    /// Missing, unreadable or malformed stored data yields an empty ledger; the
    /// problem is logged and never returned to the caller.
    pub async fn init(store: S, clock: C) -> Self {
        let records = load_records(&store).await;
        let last_id = records.iter().map(|record| record.id).max().unwrap_or(0);

        Self {
            store,
            clock,
            records,
            last_id,
            durable: true,
        }
    }

    // ========================
    // Mutations
    // ========================

    /// Validate and record a new expense at the head of the ledger.
    ///
    /// On a validation error nothing changes and nothing is saved.
    pub async fn add(
        &mut self,
        name: &str,
        amount_text: &str,
    ) -> Result<ExpenseRecord, ValidationError> {
        let expense = validate_expense(name, amount_text)
            .inspect_err(|err| debug!(error = %err, "rejected expense"))?;

        let now = self.clock.now();
        let id = next_expense_id(now, self.last_id);
        self.last_id = id;

        let record = ExpenseRecord::new(id, expense.name, expense.amount, self.clock.today(), now);
        self.records.insert(0, record.clone());
        info!(id, amount = %record.amount, "recorded expense");

        self.persist().await;
        Ok(record)
    }

    /// Remove the record with the given id. Unknown ids are a no-op.
    pub async fn delete_by_id(&mut self, id: ExpenseId) -> Option<ExpenseRecord> {
        let Some(position) = self.records.iter().position(|record| record.id == id) else {
            debug!(id, "no expense with this id, nothing deleted");
            return None;
        };

        let removed = self.records.remove(position);
        info!(id, "deleted expense");

        self.persist().await;
        Some(removed)
    }

    /// Remove every record. Returns how many were removed.
    pub async fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        info!(removed, "cleared all expenses");

        self.persist().await;
        removed
    }

    /// Save the full sequence. Failures are logged and reflected in
    /// [`Ledger::is_durable`]; the in-memory state stays authoritative.
    async fn persist(&mut self) {
        let blob = match encode_records(&self.records) {
            Ok(blob) => blob,
            Err(err) => {
                error!(error = %err, "failed to encode expenses");
                self.durable = false;
                return;
            }
        };

        match self.store.set(EXPENSES_KEY, &blob).await {
            Ok(()) => {
                debug!(count = self.records.len(), "saved expenses");
                self.durable = true;
            }
            Err(err) => {
                error!(
                    error = ?err,
                    count = self.records.len(),
                    "failed to save expenses, changes are only held in memory"
                );
                self.durable = false;
            }
        }
    }

    // ========================
    // Queries
    // ========================

    /// All records, newest first.
    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn find(&self, id: ExpenseId) -> Option<&ExpenseRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of every amount.
    pub fn total(&self) -> Amount {
        total_amount(&self.records)
    }

    /// Sum of the amounts recorded on the clock's current day.
    pub fn today_total(&self) -> Amount {
        total_on(self.clock.today(), &self.records)
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            total: self.total(),
            today_total: self.today_total(),
            count: self.count(),
        }
    }

    /// The clock's current calendar day.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// False when the most recent save failed.
    pub fn is_durable(&self) -> bool {
        self.durable
    }
}

async fn load_records<S: BlobStore>(store: &S) -> Vec<ExpenseRecord> {
    match store.get(EXPENSES_KEY).await {
        Ok(Some(blob)) => match decode_records(&blob) {
            Ok(records) => {
                debug!(count = records.len(), "loaded stored expenses");
                records
            }
            Err(err) => {
                warn!(error = %err, "ignoring malformed stored expenses, starting empty");
                Vec::new()
            }
        },
        Ok(None) => {
            debug!("no stored expenses, starting empty");
            Vec::new()
        }
        Err(err) => {
            error!(error = ?err, "failed to read stored expenses, starting empty");
            Vec::new()
        }
    }
}
