//! # Fixity Checker
//!
//! One call to `FixityChecker::check` is one verification cycle:
//!
//! 1. No status row: `STATUS_NOT_FOUND`, nothing persisted
//! 2. Row frozen (`to_be_processed = false`): `NOT_PROCESSED`, nothing persisted
//! 3. Catalog says deleted: `MARKED_DELETED`, row frozen, persisted
//! 4. Otherwise recompute the digest and compare, then persist
//!
//! Digest failures become outcomes. Bytes that are gone freeze the row;
//! any other failure leaves it pending so the next cycle retries it.
//! Persistence and catalog failures are returned as errors.
//!
//! The digest is computed before the ledger is touched, so no store lock is
//! held while an object is streamed.

use std::sync::Arc;

use super::catalog::Catalog;
use super::clock::Clock;
use super::digest::{DigestError, DigestSource};
use super::errors::CheckerResult;
use super::model::{CheckResult, CurrentStatus, ObjectId};
use super::outcome::OutcomeCode;
use super::store::Ledger;
use crate::observability::{Event, FixityMetrics, Logger};

/// Compare an expected digest with a freshly computed one.
///
/// A missing or empty value on either side means there is nothing to
/// compare against. Never fails.
pub fn compare_digests(expected: Option<&str>, current: Option<&str>) -> OutcomeCode {
    let expected = expected.filter(|s| !s.is_empty());
    let current = current.filter(|s| !s.is_empty());

    match (expected, current) {
        (Some(e), Some(c)) if e == c => OutcomeCode::DigestMatch,
        (Some(_), Some(_)) => OutcomeCode::DigestNoMatch,
        _ => OutcomeCode::PreviousDigestNotFound,
    }
}

/// Per-object check/compare/record state machine.
pub struct FixityChecker {
    ledger: Arc<dyn Ledger>,
    catalog: Arc<dyn Catalog>,
    digests: Arc<dyn DigestSource>,
    clock: Arc<dyn Clock>,
    metrics: Arc<FixityMetrics>,
}

impl FixityChecker {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        catalog: Arc<dyn Catalog>,
        digests: Arc<dyn DigestSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            digests,
            clock,
            metrics: Arc::new(FixityMetrics::new()),
        }
    }

    /// Share a metrics registry with other components.
    pub fn with_metrics(mut self, metrics: Arc<FixityMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn metrics(&self) -> &Arc<FixityMetrics> {
        &self.metrics
    }

    /// Run one verification cycle for `id`.
    pub fn check(&self, id: &ObjectId) -> CheckerResult<CheckResult> {
        let result = match self.ledger.find_status(id)? {
            None => self.status_not_found(id),
            Some(status) if !status.to_be_processed => Self::not_processed(status),
            Some(status) => {
                if self.catalog.is_deleted(id)? {
                    self.mark_deleted(status)?
                } else {
                    self.verify(status)?
                }
            }
        };

        self.metrics.record_check(result.outcome());
        Ok(result)
    }

    fn status_not_found(&self, id: &ObjectId) -> CheckResult {
        let now = self.clock.now();
        Logger::warn(
            Event::StatusNotFound.as_str(),
            &[("object_id", id.as_str())],
        );

        CheckResult {
            status: CurrentStatus {
                object_id: id.clone(),
                to_be_processed: false,
                expected_digest: String::new(),
                current_digest: String::new(),
                digest_algorithm: String::new(),
                last_run_start: now,
                last_run_end: now,
                matched_previous: false,
                outcome: OutcomeCode::StatusNotFound,
            },
            status_row_found: false,
            object_found: false,
        }
    }

    /// Frozen rows are reported but never rewritten.
    fn not_processed(mut status: CurrentStatus) -> CheckResult {
        status.outcome = OutcomeCode::NotProcessed;
        CheckResult {
            status,
            status_row_found: true,
            object_found: false,
        }
    }

    fn mark_deleted(&self, mut status: CurrentStatus) -> CheckerResult<CheckResult> {
        let now = self.clock.now();
        status.outcome = OutcomeCode::MarkedDeleted;
        status.to_be_processed = false;
        status.last_run_start = now;
        status.last_run_end = now;

        self.ledger.record_check(&status, status.to_history())?;

        Ok(CheckResult {
            status,
            status_row_found: true,
            object_found: false,
        })
    }

    fn verify(&self, mut status: CurrentStatus) -> CheckerResult<CheckResult> {
        status.last_run_start = self.clock.now();
        let mut object_found = false;

        match self.digests.compute_digest(&status.object_id) {
            Ok(digest) if !digest.value.is_empty() => {
                object_found = true;
                if !status.digest_algorithm.is_empty()
                    && !status.digest_algorithm.eq_ignore_ascii_case(&digest.algorithm)
                {
                    Logger::warn(
                        Event::AlgorithmMismatch.as_str(),
                        &[
                            ("object_id", status.object_id.as_str()),
                            ("recorded_algorithm", &status.digest_algorithm),
                            ("computed_algorithm", &digest.algorithm),
                        ],
                    );
                    self.metrics.increment_algorithm_mismatches();
                }
                status.current_digest = digest.value;
                status.digest_algorithm = digest.algorithm;
                status.outcome = compare_digests(
                    Some(status.expected_digest.as_str()),
                    Some(status.current_digest.as_str()),
                );
                status.matched_previous = status.outcome == OutcomeCode::DigestMatch;
            }
            Ok(_) => {
                status.outcome = OutcomeCode::StatusNotFound;
                status.matched_previous = false;
            }
            Err(DigestError::NotFound(_)) => {
                status.outcome = OutcomeCode::ObjectNotFound;
                status.to_be_processed = false;
                status.matched_previous = false;
            }
            Err(e) => {
                Logger::warn(
                    Event::DigestFailed.as_str(),
                    &[
                        ("object_id", status.object_id.as_str()),
                        ("digest_error", &e.to_string()),
                    ],
                );
                status.outcome = OutcomeCode::StatusNotFound;
                status.matched_previous = false;
            }
        }

        status.last_run_end = self.clock.now();

        self.ledger.record_check(&status, status.to_history())?;

        Ok(CheckResult {
            status,
            status_row_found: true,
            object_found,
        })
    }
}
