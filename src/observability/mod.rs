//! Observability for fixity runs
//!
//! - Structured logging (JSON, one line per event)
//! - Typed event names
//! - Monotonic counters
//!
//! Observability is read-only: a logging or counting failure never changes
//! what the checker does.
//!
//! ```ignore
//! use fixity::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::SeedComplete, &[("status_rows", "12")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{FixityMetrics, MetricsSnapshot};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // verifies no panic
        log_event(Event::RunBegin);
        log_event(Event::RunComplete);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("data_dir", "/tmp/test")]);
    }
}
