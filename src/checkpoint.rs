//! Checkpoint persistence for resumable runs
//!
//! The checkpoint is a single JSON document overwritten after every
//! completed subject. Writes go through a temp file and rename so a reader
//! always sees one complete, self-consistent document. It is run state,
//! not a long-term artifact: it is deleted after a fully successful run.
//!
//! Only the coordinator writes the checkpoint, and only one coordinator
//! may use a given checkpoint path at a time; concurrent runs sharing a
//! path are unsupported.

use crate::error::{CheckpointError, CheckpointResult};
use crate::walker::subject::SubjectResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable snapshot of partial progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Size of the original input set
    pub total_subjects: usize,

    /// Results persisted so far; always equals `results.len()`
    pub processed_count: usize,

    /// Subject id of the most recently completed result, empty when none
    pub last_completed_subject: String,

    /// ISO-8601 write timestamp
    pub timestamp: String,

    /// True if the last write was due to an abnormal termination
    pub interrupted: bool,

    /// Completed results in completion order
    pub results: Vec<SubjectResult>,
}

impl CheckpointRecord {
    /// Build a record snapshotting the results accumulated so far
    pub fn new(total_subjects: usize, results: &[SubjectResult], interrupted: bool) -> Self {
        Self {
            total_subjects,
            processed_count: results.len(),
            last_completed_subject: results
                .last()
                .map(|r| r.subject_id.clone())
                .unwrap_or_default(),
            timestamp: Utc::now().to_rfc3339(),
            interrupted,
            results: results.to_vec(),
        }
    }

    /// Subjects not yet processed, preserving the input order
    pub fn remaining<'a>(&self, subjects: &'a [String]) -> Vec<&'a String> {
        let done: std::collections::HashSet<&str> =
            self.results.iter().map(|r| r.subject_id.as_str()).collect();
        subjects
            .iter()
            .filter(|s| !done.contains(s.as_str()))
            .collect()
    }

    fn check_consistency(&self) -> CheckpointResult<()> {
        if self.processed_count != self.results.len() {
            return Err(CheckpointError::Inconsistent {
                expected: self.processed_count,
                actual: self.results.len(),
            });
        }
        Ok(())
    }
}

/// Whole-file-overwrite checkpoint store at a fixed path
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the checkpoint with a new record
    pub fn save(&self, record: &CheckpointRecord) -> CheckpointResult<()> {
        let json = serde_json::to_string_pretty(record)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(
            path = %self.path.display(),
            processed = record.processed_count,
            "checkpoint saved"
        );
        Ok(())
    }

    /// Load the prior record, or `None` when no checkpoint exists
    pub fn load(&self) -> CheckpointResult<Option<CheckpointRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: CheckpointRecord = serde_json::from_str(&content)?;
        record.check_consistency()?;
        Ok(Some(record))
    }

    /// Remove the checkpoint; missing file is fine
    pub fn clear(&self) -> CheckpointResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "checkpoint cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
