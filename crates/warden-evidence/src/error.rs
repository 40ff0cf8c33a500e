//! Evidence layer errors

use std::path::PathBuf;
use warden_hash::HashError;

/// Errors raised while building, storing or exporting evidence
#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    /// A required field is empty
    #[error("{0} must be non-empty")]
    EmptyField(&'static str),

    /// A timestamp is not a positive epoch value
    #[error("{field} must be positive, got {value}")]
    InvalidTimestamp {
        /// Field name
        field: &'static str,
        /// Offending value
        value: i64,
    },

    /// Bundle has no execution snapshot
    #[error("execution_snapshots must be non-empty")]
    NoExecutionSnapshots,

    /// Both `failure_composition` and `results` were supplied
    #[error("bundle has both failure_composition and results")]
    BothOutcomes,

    /// Neither `failure_composition` nor `results` was supplied
    #[error("bundle has neither failure_composition nor results")]
    NeitherOutcome,

    /// Execution snapshot fields disagree with `is_success`
    #[error("inconsistent execution snapshot: {0}")]
    InconsistentExecution(String),

    /// No bundle stored under this id
    #[error("bundle not found: {0}")]
    BundleNotFound(String),

    /// Bundle could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Reading or writing an exported bundle failed
    #[error("io error on {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Hash parse error
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl From<serde_json::Error> for EvidenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
