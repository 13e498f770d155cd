//! Error types for dbx-inventory
//!
//! This module defines the error hierarchy covering:
//! - REST API and transport errors
//! - Credential resolution errors
//! - Configuration and CLI errors
//! - Checkpoint persistence errors
//! - Report/CSV export errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include context about what to do
//! - Expected remote conditions (404, 429, 5xx) are handled inside the
//!   request client and never surface as errors

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the dbx-inventory application
#[derive(Error, Debug)]
pub enum InventoryError {
    /// REST API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Credential resolution errors
    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Checkpoint persistence errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Report export errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The scan stopped before every subject completed.
    ///
    /// Completed results are preserved in the checkpoint file; the run can
    /// be continued with `--resume`.
    #[error(
        "scan interrupted: {completed} of {total} subject(s) completed; \
         progress saved to '{checkpoint}' - re-run with --resume to continue, \
         or split the subject list into smaller batches"
    )]
    Interrupted {
        completed: usize,
        total: usize,
        checkpoint: PathBuf,
    },
}

/// REST API and transport errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Failed to construct the HTTP client
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    /// Transport-level failure (connection refused, DNS, timeout)
    #[error("Request to '{endpoint}' failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Unexpected HTTP status from an endpoint
    #[error("Unexpected status {status} from '{endpoint}'")]
    Status { endpoint: String, status: u16 },

    /// Response body did not match the expected shape
    #[error("Malformed response from '{endpoint}': {detail}")]
    Decode { endpoint: String, detail: String },

    /// Listing a directory failed after retries were exhausted
    #[error("Listing failed for '{path}': {detail}")]
    ListingFailed { path: String, detail: String },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Check if this error means the root of a walk was unreachable
    pub fn is_listing_failure(&self) -> bool {
        matches!(self, ApiError::ListingFailed { .. })
    }
}

/// Credential resolution errors
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Profile file exists but could not be read
    #[error("Could not read profile file '{path}': {reason}")]
    ProfileFile { path: PathBuf, reason: String },

    /// Workspace URL was present but unusable
    #[error("Invalid workspace URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No source produced the required value
    #[error(
        "No {what} found. Provide --workspace-url/--token, configure a \
         profile in ~/.databrickscfg, or set DATABRICKS_HOST and \
         DATABRICKS_TOKEN environment variables"
    )]
    Missing { what: &'static str },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid traversal depth
    #[error("Invalid max depth {depth}: must be between 1 and {max}")]
    InvalidMaxDepth { depth: u32, max: u32 },

    /// Invalid request timeout
    #[error("Invalid timeout {secs}s: must be at least 1 second")]
    InvalidTimeout { secs: u64 },

    /// Subjects file missing or unreadable
    #[error("Cannot read subjects file '{path}': {reason}")]
    SubjectsFile { path: PathBuf, reason: String },

    /// Subjects file parsed but contained no usable entries
    #[error("Subjects file '{path}' contains no subjects")]
    NoSubjects { path: PathBuf },
}

/// Checkpoint persistence errors
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// I/O failure reading or writing the checkpoint file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Checkpoint document failed to (de)serialize
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Checkpoint violates its own consistency invariant
    #[error("Inconsistent checkpoint: processed_count={expected} but {actual} result(s) present")]
    Inconsistent { expected: usize, actual: usize },
}

/// Report export errors
#[derive(Error, Debug)]
pub enum ReportError {
    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure writing the report
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for InventoryError
pub type Result<T> = std::result::Result<T, InventoryError>;

/// Result type alias for ApiError
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Result type alias for CheckpointError
pub type CheckpointResult<T> = std::result::Result<T, CheckpointError>;
