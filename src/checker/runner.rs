//! # Run Controller
//!
//! Drives one run: seed, then pull objects from a dispatcher until it is
//! exhausted, checking each and forwarding the interesting results.
//!
//! A run either completes or aborts. Infrastructure failures (ledger,
//! catalog) end the run with `RUN_ABORTED` and are returned to the caller;
//! object-level problems are outcomes and never abort.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::checker::FixityChecker;
use super::collector::ResultsCollector;
use super::dispatcher::{Dispatcher, Next};
use super::errors::CheckerResult;
use super::model::ObjectId;
use super::outcome::OutcomeCode;
use super::store::{RemovalReport, SeedReport};
use crate::observability::{log_event_with_fields, Event};

/// What one run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub seeded: SeedReport,
    /// Objects pulled from the dispatcher and checked
    pub checked: usize,
    /// Results forwarded to the collector
    pub reported: usize,
    pub outcomes: BTreeMap<OutcomeCode, usize>,
}

impl RunSummary {
    fn begin(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: started_at,
            seeded: SeedReport::default(),
            checked: 0,
            reported: 0,
            outcomes: BTreeMap::new(),
        }
    }

    pub fn count(&self, outcome: OutcomeCode) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }
}

pub struct RunController {
    checker: FixityChecker,
    default_algorithm: String,
}

impl RunController {
    /// `default_algorithm` names the algorithm recorded on seeded rows whose
    /// catalog entry carries none.
    pub fn new(checker: FixityChecker, default_algorithm: impl Into<String>) -> Self {
        Self {
            checker,
            default_algorithm: default_algorithm.into(),
        }
    }

    pub fn checker(&self) -> &FixityChecker {
        &self.checker
    }

    /// Create status and history rows for catalog objects the ledger has
    /// never seen. Safe to call any number of times.
    pub fn seed(&self) -> CheckerResult<SeedReport> {
        let objects = self.checker.catalog().objects()?;
        let report = self
            .checker
            .ledger()
            .seed_missing(&objects, &self.default_algorithm)?;

        self.checker
            .metrics()
            .add_seeded(report.status_rows, report.history_rows);
        log_event_with_fields(
            Event::SeedComplete,
            &[
                ("catalog_objects", &objects.len().to_string()),
                ("status_rows", &report.status_rows.to_string()),
                ("history_rows", &report.history_rows.to_string()),
            ],
        );
        Ok(report)
    }

    /// Seed, then check objects until `dispatcher` is exhausted.
    ///
    /// Results are forwarded to `collector` when `verbose` is set or the
    /// outcome is anything other than `DIGEST_MATCH`.
    pub fn run(
        &self,
        dispatcher: &mut dyn Dispatcher,
        collector: &mut dyn ResultsCollector,
        verbose: bool,
    ) -> CheckerResult<RunSummary> {
        let run_id = Uuid::new_v4();
        let mut summary = RunSummary::begin(run_id, self.checker.clock().now());
        let run_id = run_id.to_string();

        log_event_with_fields(
            Event::RunBegin,
            &[("run_id", &run_id), ("verbose", &verbose.to_string())],
        );

        if let Err(e) = self.drive(dispatcher, collector, verbose, &mut summary) {
            log_event_with_fields(
                Event::RunAborted,
                &[
                    ("run_id", &run_id),
                    ("code", e.code()),
                    ("reason", &e.to_string()),
                    ("checked", &summary.checked.to_string()),
                ],
            );
            return Err(e);
        }

        summary.finished_at = self.checker.clock().now();
        log_event_with_fields(
            Event::RunComplete,
            &[
                ("run_id", &run_id),
                ("checked", &summary.checked.to_string()),
                ("reported", &summary.reported.to_string()),
            ],
        );
        Ok(summary)
    }

    fn drive(
        &self,
        dispatcher: &mut dyn Dispatcher,
        collector: &mut dyn ResultsCollector,
        verbose: bool,
        summary: &mut RunSummary,
    ) -> CheckerResult<()> {
        summary.seeded = self.seed()?;

        while let Next::Object(id) = dispatcher.next()? {
            let result = self.checker.check(&id)?;
            summary.checked += 1;
            *summary.outcomes.entry(result.outcome()).or_insert(0) += 1;

            if verbose || result.outcome() != OutcomeCode::DigestMatch {
                collector.collect(&result);
                summary.reported += 1;
                self.checker.metrics().increment_forwarded();
            }
        }
        Ok(())
    }

    /// Handle an object-removal notification: drop its history, then its
    /// status row.
    pub fn remove_object(&self, id: &ObjectId) -> CheckerResult<RemovalReport> {
        let report = self.checker.ledger().remove_object(id)?;
        log_event_with_fields(
            Event::ObjectRemoved,
            &[
                ("object_id", id.as_str()),
                ("history_rows", &report.history_rows.to_string()),
                ("status_row", &report.status_row.to_string()),
            ],
        );
        Ok(report)
    }
}
