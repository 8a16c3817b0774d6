//! Result sinks
//!
//! A `ResultsCollector` receives check results chosen for reporting. It has
//! no return value and must not fail: a reporting problem never aborts a run.

use crate::observability::{Event, Logger, Severity};

use super::model::CheckResult;

/// Receives reported check results.
pub trait ResultsCollector: Send {
    fn collect(&mut self, result: &CheckResult);
}

/// Emits one `CHECK_RESULT` log line per result.
///
/// Matches log at INFO; every other outcome logs at WARN.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCollector;

impl LoggingCollector {
    pub fn new() -> Self {
        Self
    }

    fn severity(result: &CheckResult) -> Severity {
        match result.outcome() {
            super::OutcomeCode::DigestMatch => Severity::Info,
            _ => Severity::Warn,
        }
    }
}

impl ResultsCollector for LoggingCollector {
    fn collect(&mut self, result: &CheckResult) {
        let status = &result.status;
        let start = status.last_run_start.to_rfc3339();
        let end = status.last_run_end.to_rfc3339();
        let to_be_processed = status.to_be_processed.to_string();
        let matched = status.matched_previous.to_string();

        Logger::log(
            Self::severity(result),
            Event::CheckResult.as_str(),
            &[
                ("object_id", status.object_id.as_str()),
                ("outcome", status.outcome.as_str()),
                ("description", status.outcome.description()),
                ("expected_digest", &status.expected_digest),
                ("current_digest", &status.current_digest),
                ("algorithm", &status.digest_algorithm),
                ("run_start", &start),
                ("run_end", &end),
                ("to_be_processed", &to_be_processed),
                ("matched_previous", &matched),
            ],
        );
    }
}

/// Keeps every collected result in memory.
#[derive(Debug, Default)]
pub struct MemoryCollector {
    results: Vec<CheckResult>,
}

impl MemoryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl ResultsCollector for MemoryCollector {
    fn collect(&mut self, result: &CheckResult) {
        self.results.push(result.clone());
    }
}
