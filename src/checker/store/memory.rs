//! In-memory ledger for tests and embedding.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::checker::catalog::CatalogObject;
use crate::checker::errors::{CheckerError, CheckerResult};
use crate::checker::model::{CurrentStatus, HistoryEntry, NewHistoryEntry, ObjectId};
use crate::checker::outcome::OutcomeCode;

use super::state::LedgerState;
use super::{HistoryStore, Ledger, RemovalReport, SeedReport, StatusStore};

/// Ledger held entirely in memory.
///
/// Both tables sit behind a single lock, so cross-table operations are
/// atomic with respect to every other caller.
#[derive(Debug)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::new()),
        }
    }

    fn read(&self) -> CheckerResult<RwLockReadGuard<'_, LedgerState>> {
        self.state.read().map_err(|_| CheckerError::LockPoisoned)
    }

    fn write(&self) -> CheckerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state.write().map_err(|_| CheckerError::LockPoisoned)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore for MemoryLedger {
    fn find_status(&self, id: &ObjectId) -> CheckerResult<Option<CurrentStatus>> {
        Ok(self.read()?.find_status(id))
    }

    fn find_oldest_pending(
        &self,
        started_before: Option<DateTime<Utc>>,
    ) -> CheckerResult<Option<ObjectId>> {
        Ok(self.read()?.find_oldest_pending(started_before))
    }

    fn upsert_status(&self, status: &CurrentStatus) -> CheckerResult<()> {
        self.write()?.upsert_status(status);
        Ok(())
    }

    fn delete_status(&self, id: &ObjectId) -> CheckerResult<bool> {
        Ok(self.write()?.delete_status(id))
    }

    fn status_count(&self) -> CheckerResult<usize> {
        Ok(self.read()?.status_count())
    }
}

impl HistoryStore for MemoryLedger {
    fn insert_history(&self, entry: NewHistoryEntry) -> CheckerResult<HistoryEntry> {
        Ok(self.write()?.insert_history(entry))
    }

    fn history_for(&self, id: &ObjectId) -> CheckerResult<Vec<HistoryEntry>> {
        Ok(self.read()?.history_for(id))
    }

    fn delete_history_for(&self, id: &ObjectId) -> CheckerResult<usize> {
        Ok(self.write()?.delete_history_for(id))
    }

    fn delete_history_before(
        &self,
        outcome: OutcomeCode,
        cutoff: DateTime<Utc>,
    ) -> CheckerResult<usize> {
        Ok(self.write()?.delete_history_before(outcome, cutoff))
    }

    fn history_count(&self) -> CheckerResult<usize> {
        Ok(self.read()?.history_count())
    }
}

impl Ledger for MemoryLedger {
    fn record_check(
        &self,
        status: &CurrentStatus,
        entry: NewHistoryEntry,
    ) -> CheckerResult<HistoryEntry> {
        Ok(self.write()?.record_check(status, entry))
    }

    fn seed_missing(
        &self,
        objects: &[CatalogObject],
        default_algorithm: &str,
    ) -> CheckerResult<SeedReport> {
        Ok(self.write()?.seed_missing(objects, default_algorithm))
    }

    fn remove_object(&self, id: &ObjectId) -> CheckerResult<RemovalReport> {
        Ok(self.write()?.remove_object(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_check_writes_both_tables() {
        let ledger = MemoryLedger::new();
        let status = CurrentStatus::seed(ObjectId::new("a").unwrap(), false, None, "SHA-256");

        let entry = ledger.record_check(&status, status.to_history()).unwrap();

        assert_eq!(entry.sequence_id, 1);
        assert_eq!(ledger.status_count().unwrap(), 1);
        assert_eq!(ledger.history_count().unwrap(), 1);
    }

    #[test]
    fn test_upsert_replaces_row() {
        let ledger = MemoryLedger::new();
        let mut status = CurrentStatus::seed(ObjectId::new("a").unwrap(), false, None, "SHA-256");
        ledger.upsert_status(&status).unwrap();

        status.current_digest = "ff".to_string();
        ledger.upsert_status(&status).unwrap();

        assert_eq!(ledger.status_count().unwrap(), 1);
        let stored = ledger.find_status(&status.object_id).unwrap().unwrap();
        assert_eq!(stored.current_digest, "ff");
    }

    #[test]
    fn test_delete_missing_status() {
        let ledger = MemoryLedger::new();
        assert!(!ledger.delete_status(&ObjectId::new("x").unwrap()).unwrap());
    }
}
