//! Fixity data model
//!
//! - `CurrentStatus`: the single authoritative row per object
//! - `HistoryEntry`: one immutable audit row per recorded check
//! - `CheckResult`: a status plus the per-invocation facts that are never persisted

use std::fmt;
use std::time::UNIX_EPOCH;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{CheckerError, CheckerResult};
use super::outcome::OutcomeCode;

/// Opaque, stable identifier of a bitstream in the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Create an object id, rejecting empty or whitespace-only values.
    pub fn new(id: impl Into<String>) -> CheckerResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CheckerError::InvalidObjectId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = CheckerError;

    fn try_from(id: String) -> CheckerResult<Self> {
        Self::new(id)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timestamp given to rows that have never been checked.
///
/// Sorts before every real check time, so seeded rows are picked first by
/// the oldest-pending strategy and fall before any run cutoff.
pub fn never_checked() -> DateTime<Utc> {
    DateTime::<Utc>::from(UNIX_EPOCH)
}

/// Current status of one object.
///
/// At most one row exists per `ObjectId`. Empty digest strings mean
/// "no digest"; they are never null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStatus {
    pub object_id: ObjectId,
    /// Whether future runs should select this object
    pub to_be_processed: bool,
    /// Last-known-good digest
    pub expected_digest: String,
    /// Most recently computed digest
    pub current_digest: String,
    pub digest_algorithm: String,
    pub last_run_start: DateTime<Utc>,
    pub last_run_end: DateTime<Utc>,
    pub matched_previous: bool,
    pub outcome: OutcomeCode,
}

impl CurrentStatus {
    /// Build the seed row for an object seen for the first time.
    pub fn seed(
        object_id: ObjectId,
        deleted: bool,
        digest: Option<&str>,
        algorithm: &str,
    ) -> Self {
        let digest = digest.unwrap_or_default().to_string();
        Self {
            object_id,
            to_be_processed: !deleted,
            expected_digest: digest.clone(),
            current_digest: digest,
            digest_algorithm: algorithm.to_string(),
            last_run_start: never_checked(),
            last_run_end: never_checked(),
            matched_previous: true,
            outcome: if deleted {
                OutcomeCode::MarkedDeleted
            } else {
                OutcomeCode::DigestMatch
            },
        }
    }

    /// The audit row describing this status.
    pub fn to_history(&self) -> NewHistoryEntry {
        NewHistoryEntry {
            object_id: self.object_id.clone(),
            run_start: self.last_run_start,
            run_end: self.last_run_end,
            expected_digest: self.expected_digest.clone(),
            current_digest: self.current_digest.clone(),
            outcome: self.outcome,
        }
    }
}

/// A history row that has not been assigned a sequence id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub object_id: ObjectId,
    pub run_start: DateTime<Utc>,
    pub run_end: DateTime<Utc>,
    pub expected_digest: String,
    pub current_digest: String,
    pub outcome: OutcomeCode,
}

impl NewHistoryEntry {
    /// Attach a system-assigned sequence id.
    pub fn with_sequence(self, sequence_id: u64) -> HistoryEntry {
        HistoryEntry {
            sequence_id,
            object_id: self.object_id,
            run_start: self.run_start,
            run_end: self.run_end,
            expected_digest: self.expected_digest,
            current_digest: self.current_digest,
            outcome: self.outcome,
        }
    }
}

/// Immutable audit-log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Monotonic, assigned by the history store
    pub sequence_id: u64,
    pub object_id: ObjectId,
    pub run_start: DateTime<Utc>,
    pub run_end: DateTime<Utc>,
    pub expected_digest: String,
    pub current_digest: String,
    pub outcome: OutcomeCode,
}

/// Outcome of one `FixityChecker::check` invocation.
///
/// `status_row_found` and `object_found` describe this invocation only and
/// are never written to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub status: CurrentStatus,
    pub status_row_found: bool,
    pub object_found: bool,
}

impl CheckResult {
    pub fn outcome(&self) -> OutcomeCode {
        self.status.outcome
    }

    pub fn object_id(&self) -> &ObjectId {
        &self.status.object_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_rejects_blank() {
        assert!(ObjectId::new("").is_err());
        assert!(ObjectId::new("   ").is_err());
        assert_eq!(ObjectId::new("B1").unwrap().as_str(), "B1");
    }

    #[test]
    fn test_object_id_deserialize_validates() {
        let id: ObjectId = serde_json::from_str("\"B1\"").unwrap();
        assert_eq!(id.as_str(), "B1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"B1\"");

        assert!(serde_json::from_str::<ObjectId>("\"\"").is_err());
        assert!(serde_json::from_str::<ObjectId>("\"  \"").is_err());
    }

    #[test]
    fn test_seed_live_object() {
        let status = CurrentStatus::seed(ObjectId::new("B1").unwrap(), false, None, "SHA-256");
        assert!(status.to_be_processed);
        assert_eq!(status.expected_digest, "");
        assert_eq!(status.current_digest, "");
        assert_eq!(status.outcome, OutcomeCode::DigestMatch);
        assert_eq!(status.last_run_end, never_checked());
    }

    #[test]
    fn test_seed_deleted_object_is_frozen() {
        let status =
            CurrentStatus::seed(ObjectId::new("B2").unwrap(), true, Some("abc"), "SHA-256");
        assert!(!status.to_be_processed);
        assert_eq!(status.outcome, OutcomeCode::MarkedDeleted);
        assert_eq!(status.expected_digest, "abc");
    }

    #[test]
    fn test_history_mirrors_status() {
        let status = CurrentStatus::seed(ObjectId::new("B3").unwrap(), false, Some("d"), "CRC32");
        let entry = status.to_history().with_sequence(7);
        assert_eq!(entry.sequence_id, 7);
        assert_eq!(entry.object_id, status.object_id);
        assert_eq!(entry.outcome, status.outcome);
        assert_eq!(entry.run_end, status.last_run_end);
    }

    #[test]
    fn test_object_id_serializes_as_string() {
        let id = ObjectId::new("123/4").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"123/4\"");
    }
}
