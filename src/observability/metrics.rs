//! Fixity counters
//!
//! - Counters only, monotonic, reset on process start
//! - Atomic, Relaxed ordering; exact totals are read after a run

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::checker::OutcomeCode;

/// Counters for one process.
#[derive(Debug, Default)]
pub struct FixityMetrics {
    checks_performed: AtomicU64,
    results_forwarded: AtomicU64,
    status_rows_seeded: AtomicU64,
    history_rows_seeded: AtomicU64,
    history_rows_pruned: AtomicU64,
    prune_batches_failed: AtomicU64,
    algorithm_mismatches: AtomicU64,
    outcomes: [AtomicU64; 8],
}

fn outcome_index(code: OutcomeCode) -> usize {
    OutcomeCode::ALL
        .iter()
        .position(|c| *c == code)
        .unwrap_or(0)
}

impl FixityMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_check(&self, outcome: OutcomeCode) {
        self.checks_performed.fetch_add(1, Ordering::Relaxed);
        self.outcomes[outcome_index(outcome)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_forwarded(&self) {
        self.results_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_seeded(&self, status_rows: usize, history_rows: usize) {
        self.status_rows_seeded
            .fetch_add(status_rows as u64, Ordering::Relaxed);
        self.history_rows_seeded
            .fetch_add(history_rows as u64, Ordering::Relaxed);
    }

    pub fn add_pruned(&self, rows: usize) {
        self.history_rows_pruned
            .fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn increment_prune_failures(&self) {
        self.prune_batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_algorithm_mismatches(&self) {
        self.algorithm_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn checks_performed(&self) -> u64 {
        self.checks_performed.load(Ordering::Relaxed)
    }

    pub fn outcome_count(&self, outcome: OutcomeCode) -> u64 {
        self.outcomes[outcome_index(outcome)].load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let outcomes = OutcomeCode::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), self.outcome_count(*c)))
            .filter(|(_, n)| *n > 0)
            .collect();

        MetricsSnapshot {
            checks_performed: self.checks_performed(),
            results_forwarded: self.results_forwarded.load(Ordering::Relaxed),
            status_rows_seeded: self.status_rows_seeded.load(Ordering::Relaxed),
            history_rows_seeded: self.history_rows_seeded.load(Ordering::Relaxed),
            history_rows_pruned: self.history_rows_pruned.load(Ordering::Relaxed),
            prune_batches_failed: self.prune_batches_failed.load(Ordering::Relaxed),
            algorithm_mismatches: self.algorithm_mismatches.load(Ordering::Relaxed),
            outcomes,
        }
    }
}

/// Copy of the counters, serializable for CLI output.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub checks_performed: u64,
    pub results_forwarded: u64,
    pub status_rows_seeded: u64,
    pub history_rows_seeded: u64,
    pub history_rows_pruned: u64,
    pub prune_batches_failed: u64,
    pub algorithm_mismatches: u64,
    /// Non-zero outcome counts keyed by code name
    pub outcomes: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_outcome() {
        let metrics = FixityMetrics::new();
        metrics.record_check(OutcomeCode::DigestMatch);
        metrics.record_check(OutcomeCode::DigestMatch);
        metrics.record_check(OutcomeCode::ObjectNotFound);

        assert_eq!(metrics.checks_performed(), 3);
        assert_eq!(metrics.outcome_count(OutcomeCode::DigestMatch), 2);
        assert_eq!(metrics.outcome_count(OutcomeCode::ObjectNotFound), 1);
        assert_eq!(metrics.outcome_count(OutcomeCode::DigestNoMatch), 0);
    }

    #[test]
    fn test_snapshot_omits_zero_outcomes() {
        let metrics = FixityMetrics::new();
        metrics.record_check(OutcomeCode::DigestNoMatch);
        metrics.add_seeded(4, 5);
        metrics.add_pruned(9);

        let snap = metrics.snapshot();
        assert_eq!(snap.outcomes.len(), 1);
        assert_eq!(snap.outcomes["DIGEST_NO_MATCH"], 1);
        assert_eq!(snap.status_rows_seeded, 4);
        assert_eq!(snap.history_rows_seeded, 5);
        assert_eq!(snap.history_rows_pruned, 9);
    }

    #[test]
    fn test_outcome_slots_cover_taxonomy() {
        let metrics = FixityMetrics::new();
        for code in OutcomeCode::ALL {
            metrics.record_check(code);
        }
        for code in OutcomeCode::ALL {
            assert_eq!(metrics.outcome_count(code), 1);
        }
    }
}
