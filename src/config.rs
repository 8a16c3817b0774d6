//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/fixity",
//!   "object_root": "/var/lib/assetstore",
//!   "catalog_path": "/var/lib/fixity/catalog.json",
//!   "digest_algorithm": "SHA-256",
//!   "log_level": "INFO",
//!   "retention": { "default": "10y", "DIGEST_MATCH": "8w" }
//! }
//! ```
//!
//! Only `data_dir` and `object_root` are required.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checker::{
    parse_duration, CheckerError, CheckerResult, DigestAlgorithm, OutcomeCode, RetentionPolicy,
};
use crate::observability::Severity;

/// Key in the `retention` map that sets the fallback age.
pub const DEFAULT_RETENTION_KEY: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixityConfig {
    /// Ledger location (required)
    pub data_dir: String,

    /// Root directory holding the stored objects (required)
    pub object_root: String,

    /// Catalog manifest (optional, default `<data_dir>/catalog.json`)
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// "SHA-256" or "CRC32"
    #[serde(default = "default_digest_algorithm")]
    pub digest_algorithm: String,

    /// TRACE, INFO, WARN or ERROR
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Outcome code name (or "default") to maximum history age
    #[serde(default)]
    pub retention: BTreeMap<String, String>,
}

fn default_digest_algorithm() -> String {
    DigestAlgorithm::default().name().to_string()
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl FixityConfig {
    /// Minimal configuration with every optional field defaulted.
    pub fn new(data_dir: impl Into<String>, object_root: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            object_root: object_root.into(),
            catalog_path: None,
            digest_algorithm: default_digest_algorithm(),
            log_level: default_log_level(),
            retention: BTreeMap::new(),
        }
    }

    /// Load and validate configuration from a JSON file.
    pub fn load(path: &Path) -> CheckerResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CheckerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: FixityConfig = serde_json::from_str(&content)
            .map_err(|e| CheckerError::Config(format!("invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CheckerResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CheckerError::Config("data_dir must not be empty".into()));
        }
        if self.object_root.trim().is_empty() {
            return Err(CheckerError::Config("object_root must not be empty".into()));
        }

        self.algorithm()?;
        self.severity()?;
        self.retention_policy()?;
        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn object_root_path(&self) -> &Path {
        Path::new(&self.object_root)
    }

    pub fn catalog_path(&self) -> PathBuf {
        match &self.catalog_path {
            Some(p) => PathBuf::from(p),
            None => self.data_path().join("catalog.json"),
        }
    }

    pub fn algorithm(&self) -> CheckerResult<DigestAlgorithm> {
        self.digest_algorithm.parse()
    }

    pub fn severity(&self) -> CheckerResult<Severity> {
        let severity: Severity = self
            .log_level
            .parse()
            .map_err(CheckerError::Config)?;

        // FATAL would silence run-level events
        if severity == Severity::Fatal {
            return Err(CheckerError::Config(format!(
                "invalid log_level: '{}'",
                self.log_level
            )));
        }
        Ok(severity)
    }

    /// Build the retention policy. Unknown outcome names are rejected.
    pub fn retention_policy(&self) -> CheckerResult<RetentionPolicy> {
        let retention_error = |key: &str, e: CheckerError| {
            CheckerError::Config(format!("retention.{}: {}", key, e))
        };

        let mut policy = match self.retention.get(DEFAULT_RETENTION_KEY) {
            Some(v) => RetentionPolicy::new(
                parse_duration(v).map_err(|e| retention_error(DEFAULT_RETENTION_KEY, e))?,
            ),
            None => RetentionPolicy::default(),
        };

        for (key, value) in &self.retention {
            if key == DEFAULT_RETENTION_KEY {
                continue;
            }
            let outcome: OutcomeCode = key.parse().map_err(|e| retention_error(key, e))?;
            let max_age = parse_duration(value).map_err(|e| retention_error(key, e))?;
            policy = policy.with_outcome(outcome, max_age);
        }

        Ok(policy)
    }
}
