//! Least-recently-checked pending object.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::checker::errors::CheckerResult;
use crate::checker::store::StatusStore;

use super::{Dispatcher, Next};

/// Queries the status store on every call; keeps no work list.
///
/// In `once` mode only rows whose last run started before the cutoff are
/// eligible, so a row checked during this run (stamped at or after the
/// cutoff) is never selected again. `continuous` mode has no cutoff and
/// never exhausts while any row is pending; bound it with a limit decorator.
pub struct OldestPending<S: StatusStore + ?Sized> {
    store: Arc<S>,
    started_before: Option<DateTime<Utc>>,
}

impl<S: StatusStore + ?Sized> OldestPending<S> {
    /// Check each pending object at most once, relative to `run_start`.
    pub fn once(store: Arc<S>, run_start: DateTime<Utc>) -> Self {
        Self {
            store,
            started_before: Some(run_start),
        }
    }

    /// Keep cycling through pending objects.
    pub fn continuous(store: Arc<S>) -> Self {
        Self {
            store,
            started_before: None,
        }
    }

    pub fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.started_before
    }
}

impl<S: StatusStore + ?Sized> Dispatcher for OldestPending<S> {
    fn next(&mut self) -> CheckerResult<Next> {
        Ok(match self.store.find_oldest_pending(self.started_before)? {
            Some(id) => Next::Object(id),
            None => Next::Exhausted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::model::{CurrentStatus, ObjectId};
    use crate::checker::store::MemoryLedger;
    use chrono::Duration;

    fn status(id: &str, end: DateTime<Utc>) -> CurrentStatus {
        let mut s = CurrentStatus::seed(ObjectId::new(id).unwrap(), false, None, "SHA-256");
        s.last_run_start = end;
        s.last_run_end = end;
        s
    }

    #[test]
    fn test_selects_oldest_first() {
        let now = Utc::now();
        let ledger = Arc::new(MemoryLedger::new());
        ledger.upsert_status(&status("new", now - Duration::hours(1))).unwrap();
        ledger.upsert_status(&status("old", now - Duration::days(3))).unwrap();

        let mut dispatcher = OldestPending::continuous(ledger);
        assert_eq!(dispatcher.next().unwrap().into_object().unwrap().as_str(), "old");
    }

    #[test]
    fn test_once_mode_exhausts_after_rows_restamped() {
        let run_start = Utc::now();
        let ledger = Arc::new(MemoryLedger::new());
        ledger.upsert_status(&status("a", run_start - Duration::days(1))).unwrap();

        let mut dispatcher = OldestPending::once(ledger.clone(), run_start);
        let id = dispatcher.next().unwrap().into_object().unwrap();

        ledger.upsert_status(&status(id.as_str(), run_start)).unwrap();
        assert!(dispatcher.next().unwrap().is_exhausted());
    }

    #[test]
    fn test_continuous_mode_reselects() {
        let now = Utc::now();
        let ledger = Arc::new(MemoryLedger::new());
        ledger.upsert_status(&status("a", now)).unwrap();

        let mut dispatcher = OldestPending::continuous(ledger);
        assert!(!dispatcher.next().unwrap().is_exhausted());
        assert!(!dispatcher.next().unwrap().is_exhausted());
        assert_eq!(dispatcher.cutoff(), None);
    }

    #[test]
    fn test_empty_store_is_exhausted() {
        let mut dispatcher = OldestPending::once(Arc::new(MemoryLedger::new()), Utc::now());
        assert!(dispatcher.next().unwrap().is_exhausted());
    }
}
