//! # History Retention
//!
//! Deletes history rows older than a per-outcome maximum age. Every outcome
//! in the taxonomy is pruned on every pass, using the default age for codes
//! the policy does not name.
//!
//! Pruning is best-effort per outcome batch. Each batch is one store call
//! and commits on its own; a failed batch is recorded in the report and the
//! remaining batches still run. Re-running a pass is idempotent.
//!
//! Current-status rows are never touched.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use chrono::Duration;
use regex::Regex;

use super::clock::Clock;
use super::errors::{CheckerError, CheckerResult};
use super::outcome::OutcomeCode;
use super::store::HistoryStore;
use crate::observability::{log_event_with_fields, Event, FixityMetrics, Logger};

/// Default maximum age: ten years.
pub const DEFAULT_RETENTION_DAYS: i64 = 3650;

static DURATION_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn duration_pattern() -> Option<&'static Regex> {
    DURATION_PATTERN
        .get_or_init(|| Regex::new(r"^\s*(\d+)\s*([smhdwy])\s*$").ok())
        .as_ref()
}

/// Parse `<n><unit>` where unit is one of `s m h d w y`.
///
/// A week is 7 days and a year is 365 days.
pub fn parse_duration(input: &str) -> CheckerResult<Duration> {
    let invalid = || CheckerError::InvalidDuration(input.to_string());

    let caps = duration_pattern()
        .and_then(|re| re.captures(input))
        .ok_or_else(invalid)?;

    let amount: i64 = caps[1].parse().map_err(|_| invalid())?;
    let unit_secs: i64 = match &caps[2] {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 7 * 86_400,
        "y" => 365 * 86_400,
        _ => return Err(invalid()),
    };

    let secs = amount.checked_mul(unit_secs).ok_or_else(invalid)?;
    // chrono caps durations at i64::MAX milliseconds
    if secs > i64::MAX / 1_000 {
        return Err(invalid());
    }
    Ok(Duration::seconds(secs))
}

/// Maximum history age per outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    by_outcome: BTreeMap<OutcomeCode, Duration>,
    default: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_RETENTION_DAYS))
    }
}

impl RetentionPolicy {
    pub fn new(default: Duration) -> Self {
        Self {
            by_outcome: BTreeMap::new(),
            default,
        }
    }

    pub fn with_outcome(mut self, outcome: OutcomeCode, max_age: Duration) -> Self {
        self.by_outcome.insert(outcome, max_age);
        self
    }

    pub fn default_age(&self) -> Duration {
        self.default
    }

    pub fn max_age(&self, outcome: OutcomeCode) -> Duration {
        self.by_outcome.get(&outcome).copied().unwrap_or(self.default)
    }
}

/// Result of one pruning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PruneReport {
    pub removed_by_outcome: BTreeMap<OutcomeCode, usize>,
    /// Batches that failed, with the error code and message
    pub failures: BTreeMap<OutcomeCode, String>,
}

impl PruneReport {
    pub fn total_removed(&self) -> usize {
        self.removed_by_outcome.values().sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies a `RetentionPolicy` to a history store.
pub struct RetentionPruner {
    history: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<FixityMetrics>>,
}

impl RetentionPruner {
    pub fn new(history: Arc<dyn HistoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            history,
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<FixityMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Prune every outcome once. Never fails; see `PruneReport::failures`.
    pub fn prune(&self, policy: &RetentionPolicy) -> PruneReport {
        let now = self.clock.now();
        let mut report = PruneReport::default();

        log_event_with_fields(Event::PruneBegin, &[("now", &now.to_rfc3339())]);

        for outcome in OutcomeCode::ALL {
            // an age reaching past the representable range removes nothing
            let Some(cutoff) = now.checked_sub_signed(policy.max_age(outcome)) else {
                report.removed_by_outcome.insert(outcome, 0);
                continue;
            };

            match self.history.delete_history_before(outcome, cutoff) {
                Ok(removed) => {
                    report.removed_by_outcome.insert(outcome, removed);
                    if let Some(metrics) = &self.metrics {
                        metrics.add_pruned(removed);
                    }
                }
                Err(e) => {
                    Logger::error(
                        Event::PruneBatchFailed.as_str(),
                        &[
                            ("outcome", outcome.as_str()),
                            ("code", e.code()),
                            ("reason", &e.to_string()),
                        ],
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.increment_prune_failures();
                    }
                    report.failures.insert(outcome, format!("{}: {}", e.code(), e));
                }
            }
        }

        log_event_with_fields(
            Event::PruneComplete,
            &[
                ("removed", &report.total_removed().to_string()),
                ("failed_batches", &report.failures.len().to_string()),
            ],
        );

        report
    }
}
