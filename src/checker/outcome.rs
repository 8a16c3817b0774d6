//! Outcome taxonomy for fixity checks
//!
//! Every verification cycle ends in exactly one `OutcomeCode`. The set is
//! closed: codes are never created at runtime, and each carries a fixed
//! human-readable description.
//!
//! Codes serialize as their upper-case names (`DIGEST_MATCH`, ...), which is
//! also the form used in configuration files and log lines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::CheckerError;

/// Classification of a single fixity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeCode {
    /// The storage backend has no bytes for the object
    ObjectNotFound,
    /// No status row exists, or local metadata could not be read
    StatusNotFound,
    /// The status row is frozen (`to_be_processed = false`)
    NotProcessed,
    /// The catalog flags the object as deleted
    MarkedDeleted,
    /// Recomputed digest equals the expected digest
    DigestMatch,
    /// Recomputed digest differs from the expected digest
    DigestNoMatch,
    /// No expected digest was on record to compare against
    PreviousDigestNotFound,
    /// The digest algorithm is not supported
    AlgorithmInvalid,
}

impl OutcomeCode {
    /// Every code, in declaration order.
    pub const ALL: [OutcomeCode; 8] = [
        OutcomeCode::ObjectNotFound,
        OutcomeCode::StatusNotFound,
        OutcomeCode::NotProcessed,
        OutcomeCode::MarkedDeleted,
        OutcomeCode::DigestMatch,
        OutcomeCode::DigestNoMatch,
        OutcomeCode::PreviousDigestNotFound,
        OutcomeCode::AlgorithmInvalid,
    ];

    /// Returns the stable code name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCode::ObjectNotFound => "OBJECT_NOT_FOUND",
            OutcomeCode::StatusNotFound => "STATUS_NOT_FOUND",
            OutcomeCode::NotProcessed => "NOT_PROCESSED",
            OutcomeCode::MarkedDeleted => "MARKED_DELETED",
            OutcomeCode::DigestMatch => "DIGEST_MATCH",
            OutcomeCode::DigestNoMatch => "DIGEST_NO_MATCH",
            OutcomeCode::PreviousDigestNotFound => "PREVIOUS_DIGEST_NOT_FOUND",
            OutcomeCode::AlgorithmInvalid => "ALGORITHM_INVALID",
        }
    }

    /// Returns the human-readable description for this outcome.
    pub fn description(&self) -> &'static str {
        match self {
            OutcomeCode::ObjectNotFound => "Bitstream bytes could not be found in the storage backend",
            OutcomeCode::StatusNotFound => "Bitstream status information could not be found",
            OutcomeCode::NotProcessed => "Bitstream is marked to not be processed",
            OutcomeCode::MarkedDeleted => "Bitstream is marked deleted",
            OutcomeCode::DigestMatch => "Current digest matched previous digest",
            OutcomeCode::DigestNoMatch => "Current digest does not match previous digest",
            OutcomeCode::PreviousDigestNotFound => "Previous digest was not found",
            OutcomeCode::AlgorithmInvalid => "Digest algorithm is not supported",
        }
    }

    /// Whether this outcome freezes the object against future selection.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutcomeCode::ObjectNotFound | OutcomeCode::MarkedDeleted)
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutcomeCode {
    type Err = CheckerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutcomeCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| CheckerError::UnknownOutcome(s.to_string()))
    }
}
