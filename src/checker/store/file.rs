//! # File Ledger
//!
//! Durable ledger stored as a single JSON document at
//! `<data_dir>/fixity/ledger.json`.
//!
//! Several processes may share one ledger directory. Every mutation holds an
//! exclusive lock on `ledger.lock`, reloads the tables from disk, applies the
//! change, writes the result to `ledger.json.tmp`, fsyncs, and renames it over
//! the live file. Reads reload under a shared lock when the live file has
//! changed since it was last seen. A failed write leaves both the file and the
//! in-memory tables as they were.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use fs4::FileExt;

use crate::checker::catalog::CatalogObject;
use crate::checker::errors::{CheckerError, CheckerResult};
use crate::checker::model::{CurrentStatus, HistoryEntry, NewHistoryEntry, ObjectId};
use crate::checker::outcome::OutcomeCode;

use super::state::{LedgerSnapshot, LedgerState};
use super::{HistoryStore, Ledger, RemovalReport, SeedReport, StatusStore};

const LEDGER_DIR: &str = "fixity";
const LEDGER_FILE: &str = "ledger.json";
const LOCK_FILE: &str = "ledger.lock";

/// Identity of the live file as last loaded; `None` when it did not exist.
type Stamp = Option<(SystemTime, u64)>;

#[derive(Debug)]
struct Loaded {
    state: LedgerState,
    stamp: Stamp,
}

/// JSON-file-backed ledger.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    lock_path: PathBuf,
    loaded: RwLock<Loaded>,
}

impl FileLedger {
    /// Opens the ledger under `data_dir`, creating an empty one if missing.
    pub fn open(data_dir: &Path) -> CheckerResult<Self> {
        let dir = data_dir.join(LEDGER_DIR);
        fs::create_dir_all(&dir).map_err(|e| {
            CheckerError::Persistence(format!(
                "Failed to create ledger directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let ledger = Self {
            path: dir.join(LEDGER_FILE),
            lock_path: dir.join(LOCK_FILE),
            loaded: RwLock::new(Loaded {
                state: LedgerState::new(),
                stamp: None,
            }),
        };

        let lock = ledger.lock_file()?;
        lock.lock_shared().map_err(|e| ledger.lock_error(e))?;
        let loaded = Self::load(&ledger.path)?;
        *ledger.loaded.write().map_err(|_| CheckerError::LockPoisoned)? = loaded;

        Ok(ledger)
    }

    /// Path of the live ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn stamp(path: &Path) -> CheckerResult<Stamp> {
        match fs::metadata(path) {
            Ok(meta) => {
                let modified = meta.modified().map_err(|e| {
                    CheckerError::Persistence(format!(
                        "Failed to stat ledger {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(Some((modified, meta.len())))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CheckerError::Persistence(format!(
                "Failed to stat ledger {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Read the live file. Callers hold `ledger.lock`.
    fn load(path: &Path) -> CheckerResult<Loaded> {
        let stamp = Self::stamp(path)?;
        if stamp.is_none() {
            return Ok(Loaded {
                state: LedgerState::new(),
                stamp,
            });
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CheckerError::Persistence(format!("Failed to read ledger {}: {}", path.display(), e))
        })?;

        if content.trim().is_empty() {
            return Ok(Loaded {
                state: LedgerState::new(),
                stamp,
            });
        }

        let snapshot: LedgerSnapshot = serde_json::from_str(&content).map_err(|e| {
            CheckerError::Persistence(format!("Failed to parse ledger {}: {}", path.display(), e))
        })?;

        let state = LedgerState::from_snapshot(snapshot).map_err(|reason| {
            CheckerError::Persistence(format!("Corrupt ledger {}: {}", path.display(), reason))
        })?;

        Ok(Loaded { state, stamp })
    }

    fn persist(&self, state: &LedgerState) -> CheckerResult<Stamp> {
        let content = serde_json::to_vec_pretty(&state.to_snapshot())?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file: File = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| {
                CheckerError::Persistence(format!(
                    "Failed to open {}: {}",
                    tmp_path.display(),
                    e
                ))
            })?;

        file.write_all(&content)
            .map_err(|e| CheckerError::Persistence(format!("Failed to write ledger: {}", e)))?;

        // fsync before the rename makes the new contents visible
        file.sync_all()
            .map_err(|e| CheckerError::Persistence(format!("fsync failed on ledger: {}", e)))?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            CheckerError::Persistence(format!("Failed to replace ledger: {}", e))
        })?;

        Self::stamp(&self.path)
    }

    /// Open the lock file. The lock is released when the handle drops.
    fn lock_file(&self) -> CheckerResult<File> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| self.lock_error(e))
    }

    fn lock_error(&self, e: std::io::Error) -> CheckerError {
        CheckerError::Persistence(format!(
            "Failed to lock ledger {}: {}",
            self.lock_path.display(),
            e
        ))
    }

    /// Current tables, reloaded first if another writer replaced the file.
    fn read(&self) -> CheckerResult<RwLockReadGuard<'_, Loaded>> {
        let stamp = Self::stamp(&self.path)?;
        {
            let guard = self.loaded.read().map_err(|_| CheckerError::LockPoisoned)?;
            if guard.stamp == stamp {
                return Ok(guard);
            }
        }

        let lock = self.lock_file()?;
        lock.lock_shared().map_err(|e| self.lock_error(e))?;
        let fresh = Self::load(&self.path)?;
        *self.loaded.write().map_err(|_| CheckerError::LockPoisoned)? = fresh;
        drop(lock);

        self.loaded.read().map_err(|_| CheckerError::LockPoisoned)
    }

    /// Apply `mutation` to the on-disk tables and commit it durably.
    fn apply<T>(&self, mutation: impl FnOnce(&mut LedgerState) -> T) -> CheckerResult<T> {
        let mut guard = self.loaded.write().map_err(|_| CheckerError::LockPoisoned)?;
        let lock = self.lock_file()?;
        lock.lock_exclusive().map_err(|e| self.lock_error(e))?;

        let mut next = Self::load(&self.path)?;
        let result = mutation(&mut next.state);
        next.stamp = self.persist(&next.state)?;
        *guard = next;
        Ok(result)
    }
}

impl StatusStore for FileLedger {
    fn find_status(&self, id: &ObjectId) -> CheckerResult<Option<CurrentStatus>> {
        Ok(self.read()?.state.find_status(id))
    }

    fn find_oldest_pending(
        &self,
        started_before: Option<DateTime<Utc>>,
    ) -> CheckerResult<Option<ObjectId>> {
        Ok(self.read()?.state.find_oldest_pending(started_before))
    }

    fn upsert_status(&self, status: &CurrentStatus) -> CheckerResult<()> {
        self.apply(|state| state.upsert_status(status))
    }

    fn delete_status(&self, id: &ObjectId) -> CheckerResult<bool> {
        self.apply(|state| state.delete_status(id))
    }

    fn status_count(&self) -> CheckerResult<usize> {
        Ok(self.read()?.state.status_count())
    }
}

impl HistoryStore for FileLedger {
    fn insert_history(&self, entry: NewHistoryEntry) -> CheckerResult<HistoryEntry> {
        self.apply(|state| state.insert_history(entry))
    }

    fn history_for(&self, id: &ObjectId) -> CheckerResult<Vec<HistoryEntry>> {
        Ok(self.read()?.state.history_for(id))
    }

    fn delete_history_for(&self, id: &ObjectId) -> CheckerResult<usize> {
        self.apply(|state| state.delete_history_for(id))
    }

    fn delete_history_before(
        &self,
        outcome: OutcomeCode,
        cutoff: DateTime<Utc>,
    ) -> CheckerResult<usize> {
        self.apply(|state| state.delete_history_before(outcome, cutoff))
    }

    fn history_count(&self) -> CheckerResult<usize> {
        Ok(self.read()?.state.history_count())
    }
}

impl Ledger for FileLedger {
    fn record_check(
        &self,
        status: &CurrentStatus,
        entry: NewHistoryEntry,
    ) -> CheckerResult<HistoryEntry> {
        self.apply(|state| state.record_check(status, entry))
    }

    fn seed_missing(
        &self,
        objects: &[CatalogObject],
        default_algorithm: &str,
    ) -> CheckerResult<SeedReport> {
        self.apply(|state| state.seed_missing(objects, default_algorithm))
    }

    fn remove_object(&self, id: &ObjectId) -> CheckerResult<RemovalReport> {
        self.apply(|state| state.remove_object(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn object(s: &str) -> CatalogObject {
        CatalogObject {
            id: ObjectId::new(s).unwrap(),
            deleted: false,
            digest: Some("abc".to_string()),
            algorithm: None,
        }
    }

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let ledger = FileLedger::open(temp.path()).unwrap();

        assert!(temp.path().join("fixity").is_dir());
        assert_eq!(ledger.status_count().unwrap(), 0);
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp = TempDir::new().unwrap();

        {
            let ledger = FileLedger::open(temp.path()).unwrap();
            ledger.seed_missing(&[object("a"), object("b")], "SHA-256").unwrap();
        }

        let ledger = FileLedger::open(temp.path()).unwrap();
        assert_eq!(ledger.status_count().unwrap(), 2);
        assert_eq!(ledger.history_count().unwrap(), 2);
        let status = ledger
            .find_status(&ObjectId::new("a").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(status.expected_digest, "abc");
    }

    #[test]
    fn test_sequence_continues_after_reopen() {
        let temp = TempDir::new().unwrap();
        let status = CurrentStatus::seed(ObjectId::new("a").unwrap(), false, None, "SHA-256");

        let first = {
            let ledger = FileLedger::open(temp.path()).unwrap();
            ledger.record_check(&status, status.to_history()).unwrap()
        };

        let ledger = FileLedger::open(temp.path()).unwrap();
        let second = ledger.record_check(&status, status.to_history()).unwrap();
        assert!(second.sequence_id > first.sequence_id);
    }

    #[test]
    fn test_corrupt_file_is_persistence_error() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("fixity");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("ledger.json"), b"{not json").unwrap();

        let err = FileLedger::open(temp.path()).unwrap_err();
        assert!(matches!(err, CheckerError::Persistence(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp = TempDir::new().unwrap();
        let ledger = FileLedger::open(temp.path()).unwrap();
        ledger.seed_missing(&[object("a")], "SHA-256").unwrap();

        assert!(ledger.path().exists());
        assert!(!ledger.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_two_ledgers_on_one_directory_keep_both_writes() {
        let temp = TempDir::new().unwrap();
        let first = FileLedger::open(temp.path()).unwrap();
        let second = FileLedger::open(temp.path()).unwrap();

        let a = CurrentStatus::seed(ObjectId::new("a").unwrap(), false, None, "SHA-256");
        let b = CurrentStatus::seed(ObjectId::new("b").unwrap(), false, None, "SHA-256");
        let seq_a = first.record_check(&a, a.to_history()).unwrap().sequence_id;
        let seq_b = second.record_check(&b, b.to_history()).unwrap().sequence_id;

        assert!(seq_b > seq_a);

        let reopened = FileLedger::open(temp.path()).unwrap();
        assert_eq!(reopened.status_count().unwrap(), 2);
        assert_eq!(reopened.history_count().unwrap(), 2);
        assert!(reopened.find_status(&a.object_id).unwrap().is_some());
        assert!(reopened.find_status(&b.object_id).unwrap().is_some());
    }

    #[test]
    fn test_reads_see_other_writers() {
        let temp = TempDir::new().unwrap();
        let reader = FileLedger::open(temp.path()).unwrap();
        let writer = FileLedger::open(temp.path()).unwrap();
        assert_eq!(reader.status_count().unwrap(), 0);

        writer.seed_missing(&[object("a"), object("b")], "SHA-256").unwrap();

        assert_eq!(reader.status_count().unwrap(), 2);
        assert_eq!(
            reader.find_oldest_pending(None).unwrap(),
            Some(ObjectId::new("a").unwrap())
        );
    }

    #[test]
    fn test_seed_from_second_ledger_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let first = FileLedger::open(temp.path()).unwrap();
        let second = FileLedger::open(temp.path()).unwrap();

        let seeded = first.seed_missing(&[object("a")], "SHA-256").unwrap();
        let again = second.seed_missing(&[object("a")], "SHA-256").unwrap();

        assert_eq!(seeded.status_rows, 1);
        assert_eq!(again.status_rows, 0);
        assert_eq!(second.history_count().unwrap(), 1);
    }
}
