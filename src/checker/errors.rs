//! # Checker Errors
//!
//! Only infrastructure failures are errors. Object-level failures (missing
//! bytes, deleted objects, frozen rows) are recorded as outcomes and never
//! surface here.

use thiserror::Error;

/// Result type for checker operations
pub type CheckerResult<T> = Result<T, CheckerError>;

/// Checker errors
#[derive(Debug, Clone, Error)]
pub enum CheckerError {
    // Infrastructure
    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Catalog failure: {0}")]
    Catalog(String),

    #[error("Lock poisoned")]
    LockPoisoned,

    // Lookup
    #[error("Handle not found: {0}")]
    HandleNotFound(String),

    #[error("Invalid object id: {0:?}")]
    InvalidObjectId(String),

    // Parsing
    #[error("Unknown outcome code: {0}")]
    UnknownOutcome(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckerError {
    /// Returns the stable error code string.
    pub fn code(&self) -> &'static str {
        match self {
            CheckerError::Persistence(_) => "FIXITY_PERSISTENCE_FAILED",
            CheckerError::Catalog(_) => "FIXITY_CATALOG_FAILED",
            CheckerError::LockPoisoned => "FIXITY_LOCK_POISONED",
            CheckerError::HandleNotFound(_) => "FIXITY_HANDLE_NOT_FOUND",
            CheckerError::InvalidObjectId(_) => "FIXITY_INVALID_OBJECT_ID",
            CheckerError::UnknownOutcome(_) => "FIXITY_UNKNOWN_OUTCOME",
            CheckerError::InvalidDuration(_) => "FIXITY_INVALID_DURATION",
            CheckerError::Config(_) => "FIXITY_CONFIG_ERROR",
        }
    }

    /// Whether this error means the audit trail can no longer be trusted.
    ///
    /// Fatal errors abort a run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CheckerError::Persistence(_) | CheckerError::Catalog(_) | CheckerError::LockPoisoned
        )
    }
}

impl From<serde_json::Error> for CheckerError {
    fn from(e: serde_json::Error) -> Self {
        CheckerError::Persistence(format!("JSON error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CheckerError::Persistence("x".into()).code(),
            "FIXITY_PERSISTENCE_FAILED"
        );
        assert_eq!(
            CheckerError::HandleNotFound("123/4".into()).code(),
            "FIXITY_HANDLE_NOT_FOUND"
        );
    }

    #[test]
    fn test_infrastructure_errors_are_fatal() {
        assert!(CheckerError::Persistence("disk".into()).is_fatal());
        assert!(CheckerError::Catalog("down".into()).is_fatal());
        assert!(CheckerError::LockPoisoned.is_fatal());
        assert!(!CheckerError::InvalidDuration("5q".into()).is_fatal());
    }

    #[test]
    fn test_display() {
        let err = CheckerError::InvalidObjectId("".into());
        assert!(err.to_string().contains("Invalid object id"));
    }
}
