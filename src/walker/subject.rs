//! Per-subject processing
//!
//! One subject (a workspace user) is walked across every configured
//! namespace; the per-namespace stats merge by addition into a single
//! [`SubjectResult`]. A namespace whose root cannot be listed contributes
//! nothing but does not sink the subject - only when every namespace fails
//! does the subject come back as an error.

use crate::api::namespace::{DbfsNamespace, Namespace, WorkspaceNamespace};
use crate::api::types::NamespaceKind;
use crate::api::ApiClient;
use crate::config::NamespaceSelection;
use crate::credentials::Credentials;
use crate::walker::backend::SubjectTask;
use crate::walker::walk::{WalkStats, Walker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome classification for one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
    /// At least one file was found
    Success,
    /// No files and no failure
    Empty,
    /// Processing failed; counts are zeroed
    Error,
}

impl SubjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectStatus::Success => "success",
            SubjectStatus::Empty => "empty",
            SubjectStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SubjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which namespace(s) contributed files to a subject's totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceBreakdown {
    None,
    Dbfs,
    Workspace,
    Both,
}

impl SourceBreakdown {
    pub fn from_counts(dbfs_files: u64, workspace_files: u64) -> Self {
        match (dbfs_files > 0, workspace_files > 0) {
            (false, false) => SourceBreakdown::None,
            (true, false) => SourceBreakdown::Dbfs,
            (false, true) => SourceBreakdown::Workspace,
            (true, true) => SourceBreakdown::Both,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceBreakdown::None => "none",
            SourceBreakdown::Dbfs => "dbfs",
            SourceBreakdown::Workspace => "workspace",
            SourceBreakdown::Both => "both",
        }
    }

    /// True if any contribution came from the size-less workspace namespace
    pub fn includes_estimates(&self) -> bool {
        matches!(self, SourceBreakdown::Workspace | SourceBreakdown::Both)
    }
}

impl std::fmt::Display for SourceBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated outcome for one subject, immutable once produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectResult {
    pub subject_id: String,
    pub file_count: u64,
    pub dir_count: u64,
    pub total_size_bytes: u64,
    pub status: SubjectStatus,
    pub error_detail: Option<String>,
    pub source_breakdown: SourceBreakdown,

    /// True if any namespace walk was cut off by the depth bound
    pub truncated: bool,

    /// Provenance and timing
    pub worker_id: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
}

impl SubjectResult {
    fn finish(
        subject_id: &str,
        worker_id: usize,
        start_time: DateTime<Utc>,
        merged: WalkStats,
        dbfs_files: u64,
        workspace_files: u64,
    ) -> Self {
        let end_time = Utc::now();
        let status = if merged.file_count > 0 {
            SubjectStatus::Success
        } else {
            SubjectStatus::Empty
        };
        Self {
            subject_id: subject_id.to_string(),
            file_count: merged.file_count,
            dir_count: merged.dir_count,
            total_size_bytes: merged.total_size_bytes,
            status,
            error_detail: None,
            source_breakdown: SourceBreakdown::from_counts(dbfs_files, workspace_files),
            truncated: merged.truncated,
            worker_id,
            start_time,
            end_time,
            duration_seconds: elapsed_seconds(start_time, end_time),
        }
    }

    /// An error result: counts are zeroed, detail captured
    pub fn failed(
        subject_id: &str,
        worker_id: usize,
        start_time: DateTime<Utc>,
        detail: String,
    ) -> Self {
        let end_time = Utc::now();
        Self {
            subject_id: subject_id.to_string(),
            file_count: 0,
            dir_count: 0,
            total_size_bytes: 0,
            status: SubjectStatus::Error,
            error_detail: Some(detail),
            source_breakdown: SourceBreakdown::None,
            truncated: false,
            worker_id,
            start_time,
            end_time,
            duration_seconds: elapsed_seconds(start_time, end_time),
        }
    }
}

fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}

/// Walk every configured namespace for one subject and merge the results
pub fn process_subject(
    subject_id: &str,
    worker_id: usize,
    namespaces: &[&dyn Namespace],
    walker: &Walker,
) -> SubjectResult {
    let start_time = Utc::now();
    debug!(worker = worker_id, subject = %subject_id, "subject starting");

    let mut merged = WalkStats::default();
    let mut dbfs_files = 0u64;
    let mut workspace_files = 0u64;
    let mut failures: Vec<String> = Vec::new();

    for namespace in namespaces {
        let root = namespace.home_path(subject_id);
        match walker.walk(*namespace, &root) {
            Ok(stats) => {
                match namespace.kind() {
                    NamespaceKind::Dbfs => dbfs_files += stats.file_count,
                    NamespaceKind::Workspace => workspace_files += stats.file_count,
                }
                merged.merge(&stats);
            }
            Err(e) => {
                warn!(
                    worker = worker_id,
                    subject = %subject_id,
                    namespace = %namespace.kind(),
                    error = %e,
                    "namespace walk failed"
                );
                failures.push(format!("{}: {e}", namespace.kind()));
            }
        }
    }

    // Partial failure tolerance: only when no namespace walked at all does
    // the subject become an error.
    let result = if !namespaces.is_empty() && failures.len() == namespaces.len() {
        SubjectResult::failed(subject_id, worker_id, start_time, failures.join("; "))
    } else {
        SubjectResult::finish(
            subject_id,
            worker_id,
            start_time,
            merged,
            dbfs_files,
            workspace_files,
        )
    };

    info!(
        worker = worker_id,
        subject = %subject_id,
        files = result.file_count,
        dirs = result.dir_count,
        bytes = result.total_size_bytes,
        status = %result.status,
        duration_secs = result.duration_seconds,
        "subject complete"
    );

    result
}

/// The production task: one fresh API client per subject
///
/// Each subject gets its own client so pacing state starts from the
/// baseline, mirroring one worker's handling of one user.
pub struct ApiSubjectProcessor {
    credentials: Credentials,
    timeout: Duration,
    max_depth: u32,
    selection: NamespaceSelection,
}

impl ApiSubjectProcessor {
    pub fn new(
        credentials: Credentials,
        timeout: Duration,
        max_depth: u32,
        selection: NamespaceSelection,
    ) -> Self {
        Self {
            credentials,
            timeout,
            max_depth,
            selection,
        }
    }
}

impl SubjectTask for ApiSubjectProcessor {
    fn process(&self, subject_id: &str, worker_id: usize) -> SubjectResult {
        let start_time = Utc::now();
        let client = match ApiClient::new(&self.credentials, self.timeout) {
            Ok(client) => client,
            Err(e) => {
                return SubjectResult::failed(subject_id, worker_id, start_time, e.to_string())
            }
        };

        let walker = Walker::new(self.max_depth);
        let dbfs = DbfsNamespace::new(&client);
        let workspace = WorkspaceNamespace::new(&client);

        let namespaces: Vec<&dyn Namespace> = match self.selection {
            NamespaceSelection::Dbfs => vec![&dbfs],
            NamespaceSelection::Workspace => vec![&workspace],
            NamespaceSelection::Both => vec![&dbfs, &workspace],
        };

        process_subject(subject_id, worker_id, &namespaces, &walker)
    }
}
