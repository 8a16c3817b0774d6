//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::checker::CheckerError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout, files)
    IoError,
    /// Bad command-line value (object id, handle, duration)
    InvalidArgument,
    /// Ledger or catalog failure ended the command
    Aborted,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "FIXITY_CLI_CONFIG_ERROR",
            Self::IoError => "FIXITY_CLI_IO_ERROR",
            Self::InvalidArgument => "FIXITY_CLI_INVALID_ARGUMENT",
            Self::Aborted => "FIXITY_CLI_ABORTED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidArgument, msg)
    }

    pub fn aborted(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::Aborted, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<CheckerError> for CliError {
    fn from(e: CheckerError) -> Self {
        let message = format!("{}: {}", e.code(), e);
        match e {
            CheckerError::Config(_) => Self::config_error(message),
            CheckerError::InvalidObjectId(_)
            | CheckerError::InvalidDuration(_)
            | CheckerError::HandleNotFound(_)
            | CheckerError::UnknownOutcome(_) => Self::invalid_argument(message),
            CheckerError::Persistence(_)
            | CheckerError::Catalog(_)
            | CheckerError::LockPoisoned => Self::aborted(message),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_errors_map_to_cli_codes() {
        let e: CliError = CheckerError::Persistence("disk full".into()).into();
        assert_eq!(e.code(), &CliErrorCode::Aborted);
        assert!(e.message().contains("disk full"));

        let e: CliError = CheckerError::HandleNotFound("123/4".into()).into();
        assert_eq!(e.code_str(), "FIXITY_CLI_INVALID_ARGUMENT");

        let e: CliError = CheckerError::Config("bad".into()).into();
        assert_eq!(e.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_display_includes_code() {
        let e = CliError::io_error("stdout closed");
        assert_eq!(e.to_string(), "FIXITY_CLI_IO_ERROR: stdout closed");
    }
}
