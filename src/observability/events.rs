//! Observable events
//!
//! Every log line the checker emits names one of these events.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded and validated
    ConfigLoaded,

    // Runs
    /// A check run started
    RunBegin,
    /// Dispatcher exhausted, run finished cleanly
    RunComplete,
    /// Infrastructure failure ended the run
    RunAborted,

    // Seeding
    /// Missing status/history rows created
    SeedComplete,

    // Per-object
    /// One check result forwarded to the collector
    CheckResult,
    /// Checked object had no status row; nothing persisted
    StatusNotFound,
    /// Digest computation failed for a reason other than missing bytes
    DigestFailed,
    /// Computed algorithm differs from the one recorded for the object
    AlgorithmMismatch,
    /// Object-removal notification processed
    ObjectRemoved,

    // Retention
    /// Pruning started
    PruneBegin,
    /// One outcome batch failed; remaining batches continue
    PruneBatchFailed,
    /// Pruning finished
    PruneComplete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::RunBegin => "RUN_BEGIN",
            Event::RunComplete => "RUN_COMPLETE",
            Event::RunAborted => "RUN_ABORTED",
            Event::SeedComplete => "SEED_COMPLETE",
            Event::CheckResult => "CHECK_RESULT",
            Event::StatusNotFound => "STATUS_NOT_FOUND",
            Event::DigestFailed => "DIGEST_FAILED",
            Event::AlgorithmMismatch => "ALGORITHM_MISMATCH",
            Event::ObjectRemoved => "OBJECT_REMOVED",
            Event::PruneBegin => "PRUNE_BEGIN",
            Event::PruneBatchFailed => "PRUNE_BATCH_FAILED",
            Event::PruneComplete => "PRUNE_COMPLETE",
        }
    }

    /// Events that mean the run could not finish.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::RunAborted)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
