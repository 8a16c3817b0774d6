//! # Status and History Persistence
//!
//! Two logical tables back the checker:
//!
//! - `current_status`: one row per object, keyed by `ObjectId`
//! - `history`: append-only audit rows with a monotonic sequence id
//!
//! `StatusStore` and `HistoryStore` expose each table. `Ledger` adds the
//! operations that touch both and must commit as one unit: recording a
//! check, seeding, and object removal.
//!
//! Every write is a full-row upsert or an append, never a partial update,
//! so two runs that redundantly check the same object cannot corrupt it.

mod file;
mod memory;
mod state;

pub use file::FileLedger;
pub use memory::MemoryLedger;

use chrono::{DateTime, Utc};

use super::catalog::CatalogObject;
use super::errors::CheckerResult;
use super::model::{CurrentStatus, HistoryEntry, NewHistoryEntry, ObjectId};
use super::outcome::OutcomeCode;

/// Access to the current-status table.
pub trait StatusStore: Send + Sync {
    /// Look up the status row of one object.
    fn find_status(&self, id: &ObjectId) -> CheckerResult<Option<CurrentStatus>>;

    /// The pending object whose last check ended longest ago.
    ///
    /// Only rows with `to_be_processed = true` qualify. With
    /// `started_before`, rows whose last run started at or after the cutoff
    /// are skipped. Ties on `last_run_end` go to the smaller object id.
    fn find_oldest_pending(
        &self,
        started_before: Option<DateTime<Utc>>,
    ) -> CheckerResult<Option<ObjectId>>;

    /// Insert or fully replace a status row.
    fn upsert_status(&self, status: &CurrentStatus) -> CheckerResult<()>;

    /// Delete a status row. Returns whether a row existed.
    fn delete_status(&self, id: &ObjectId) -> CheckerResult<bool>;

    fn status_count(&self) -> CheckerResult<usize>;
}

/// Access to the append-only history table.
pub trait HistoryStore: Send + Sync {
    /// Append a row, assigning the next sequence id.
    fn insert_history(&self, entry: NewHistoryEntry) -> CheckerResult<HistoryEntry>;

    /// All rows of one object in sequence order.
    fn history_for(&self, id: &ObjectId) -> CheckerResult<Vec<HistoryEntry>>;

    /// Delete every row of one object. Returns the number removed.
    fn delete_history_for(&self, id: &ObjectId) -> CheckerResult<usize>;

    /// Delete rows with the given outcome whose run ended before `cutoff`.
    fn delete_history_before(
        &self,
        outcome: OutcomeCode,
        cutoff: DateTime<Utc>,
    ) -> CheckerResult<usize>;

    fn history_count(&self) -> CheckerResult<usize>;
}

/// Rows created by one seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SeedReport {
    pub status_rows: usize,
    pub history_rows: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.status_rows == 0 && self.history_rows == 0
    }
}

/// Rows deleted by one object-removal notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RemovalReport {
    pub history_rows: usize,
    pub status_row: bool,
}

/// Both tables, plus the cross-table operations.
pub trait Ledger: StatusStore + HistoryStore {
    /// Upsert `status` and append `entry` in one logical transaction.
    fn record_check(
        &self,
        status: &CurrentStatus,
        entry: NewHistoryEntry,
    ) -> CheckerResult<HistoryEntry>;

    /// Create status rows for catalog objects that have none, then a
    /// matching history row for every status row that has no history.
    ///
    /// Idempotent: a second pass over the same catalog creates nothing.
    fn seed_missing(
        &self,
        objects: &[CatalogObject],
        default_algorithm: &str,
    ) -> CheckerResult<SeedReport>;

    /// Delete an object's history rows, then its status row.
    fn remove_object(&self, id: &ObjectId) -> CheckerResult<RemovalReport>;
}
