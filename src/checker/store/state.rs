//! Table contents shared by the ledger implementations.
//!
//! `LedgerState` is plain data with no locking or I/O; `MemoryLedger` and
//! `FileLedger` wrap it and decide how mutations become durable.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checker::catalog::CatalogObject;
use crate::checker::model::{CurrentStatus, HistoryEntry, NewHistoryEntry, ObjectId};
use crate::checker::outcome::OutcomeCode;

use super::{RemovalReport, SeedReport};

#[derive(Debug, Clone, Default)]
pub(crate) struct LedgerState {
    statuses: BTreeMap<ObjectId, CurrentStatus>,
    history: Vec<HistoryEntry>,
    next_sequence: u64,
}

/// On-disk form of the ledger.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LedgerSnapshot {
    pub format_version: u32,
    pub next_sequence: u64,
    pub statuses: Vec<CurrentStatus>,
    pub history: Vec<HistoryEntry>,
}

pub(crate) const SNAPSHOT_FORMAT_VERSION: u32 = 1;

impl LedgerState {
    pub fn new() -> Self {
        Self {
            statuses: BTreeMap::new(),
            history: Vec::new(),
            next_sequence: 1,
        }
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, String> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(format!(
                "unsupported ledger format version {}",
                snapshot.format_version
            ));
        }

        let mut statuses = BTreeMap::new();
        for status in snapshot.statuses {
            let id = status.object_id.clone();
            if statuses.insert(id.clone(), status).is_some() {
                return Err(format!("duplicate status row for object {}", id));
            }
        }

        let max_sequence = snapshot
            .history
            .iter()
            .map(|e| e.sequence_id)
            .max()
            .unwrap_or(0);
        if snapshot.next_sequence <= max_sequence {
            return Err(format!(
                "next sequence {} does not exceed stored maximum {}",
                snapshot.next_sequence, max_sequence
            ));
        }

        Ok(Self {
            statuses,
            history: snapshot.history,
            next_sequence: snapshot.next_sequence,
        })
    }

    pub fn to_snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            next_sequence: self.next_sequence,
            statuses: self.statuses.values().cloned().collect(),
            history: self.history.clone(),
        }
    }

    // current_status

    pub fn find_status(&self, id: &ObjectId) -> Option<CurrentStatus> {
        self.statuses.get(id).cloned()
    }

    pub fn find_oldest_pending(&self, started_before: Option<DateTime<Utc>>) -> Option<ObjectId> {
        self.statuses
            .values()
            .filter(|s| s.to_be_processed)
            .filter(|s| started_before.map_or(true, |cutoff| s.last_run_start < cutoff))
            .min_by(|a, b| {
                a.last_run_end
                    .cmp(&b.last_run_end)
                    .then_with(|| a.object_id.cmp(&b.object_id))
            })
            .map(|s| s.object_id.clone())
    }

    pub fn upsert_status(&mut self, status: &CurrentStatus) {
        self.statuses
            .insert(status.object_id.clone(), status.clone());
    }

    pub fn delete_status(&mut self, id: &ObjectId) -> bool {
        self.statuses.remove(id).is_some()
    }

    pub fn status_count(&self) -> usize {
        self.statuses.len()
    }

    // history

    pub fn insert_history(&mut self, entry: NewHistoryEntry) -> HistoryEntry {
        let entry = entry.with_sequence(self.next_sequence);
        self.next_sequence += 1;
        self.history.push(entry.clone());
        entry
    }

    pub fn history_for(&self, id: &ObjectId) -> Vec<HistoryEntry> {
        self.history
            .iter()
            .filter(|e| &e.object_id == id)
            .cloned()
            .collect()
    }

    pub fn delete_history_for(&mut self, id: &ObjectId) -> usize {
        let before = self.history.len();
        self.history.retain(|e| &e.object_id != id);
        before - self.history.len()
    }

    pub fn delete_history_before(&mut self, outcome: OutcomeCode, cutoff: DateTime<Utc>) -> usize {
        let before = self.history.len();
        self.history
            .retain(|e| !(e.outcome == outcome && e.run_end < cutoff));
        before - self.history.len()
    }

    pub fn history_count(&self) -> usize {
        self.history.len()
    }

    // cross-table

    pub fn record_check(&mut self, status: &CurrentStatus, entry: NewHistoryEntry) -> HistoryEntry {
        self.upsert_status(status);
        self.insert_history(entry)
    }

    pub fn seed_missing(&mut self, objects: &[CatalogObject], default_algorithm: &str) -> SeedReport {
        let mut report = SeedReport::default();

        for object in objects {
            if self.statuses.contains_key(&object.id) {
                continue;
            }
            let status = CurrentStatus::seed(
                object.id.clone(),
                object.deleted,
                object.digest.as_deref(),
                object.algorithm.as_deref().unwrap_or(default_algorithm),
            );
            self.upsert_status(&status);
            report.status_rows += 1;
        }

        let with_history: HashSet<&ObjectId> = self.history.iter().map(|e| &e.object_id).collect();
        let missing: Vec<NewHistoryEntry> = self
            .statuses
            .values()
            .filter(|s| !with_history.contains(&s.object_id))
            .map(CurrentStatus::to_history)
            .collect();

        for entry in missing {
            self.insert_history(entry);
            report.history_rows += 1;
        }

        report
    }

    pub fn remove_object(&mut self, id: &ObjectId) -> RemovalReport {
        let history_rows = self.delete_history_for(id);
        let status_row = self.delete_status(id);
        RemovalReport {
            history_rows,
            status_row,
        }
    }
}
