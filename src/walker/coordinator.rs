//! Fan-out coordinator
//!
//! Owns the lifecycle of one scan: resume bookkeeping, handing the subject
//! list to an execution backend, consuming the result stream incrementally,
//! checkpointing after every completed subject, and surfacing interruption
//! as a resumable failure instead of losing completed work.
//!
//! The coordinator is the only writer of the checkpoint file; workers never
//! touch it.

use crate::checkpoint::{CheckpointRecord, CheckpointStore};
use crate::error::{InventoryError, Result};
use crate::walker::backend::{ExecutionBackend, SubjectTask};
use crate::walker::subject::SubjectResult;
use crossbeam_channel::RecvTimeoutError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How often the consume loop re-checks the shutdown flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a completed scan
#[derive(Debug)]
pub struct ScanOutcome {
    /// All results: resumed results first, then this run's, in completion order
    pub results: Vec<SubjectResult>,

    /// How many results were carried over from a prior checkpoint
    pub resumed_count: usize,

    /// Wall-clock time of this run
    pub duration: Duration,
}

/// Coordinates one scan over a subject list
pub struct InventoryCoordinator {
    store: CheckpointStore,
    shutdown: Arc<AtomicBool>,
    resume: bool,
}

impl InventoryCoordinator {
    pub fn new(store: CheckpointStore, shutdown: Arc<AtomicBool>, resume: bool) -> Self {
        Self {
            store,
            shutdown,
            resume,
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the scan, streaming per-subject results into `on_result`
    ///
    /// `on_result` receives each result as it completes along with the
    /// running completed count and the total subject count.
    pub fn run<F>(
        &self,
        subjects: &[String],
        backend: &dyn ExecutionBackend,
        task: Arc<dyn SubjectTask>,
        mut on_result: F,
    ) -> Result<ScanOutcome>
    where
        F: FnMut(&SubjectResult, usize, usize),
    {
        let started = Instant::now();
        let total = subjects.len();

        let (mut results, remaining) = self.prepare(subjects)?;
        let resumed_count = results.len();

        if remaining.is_empty() {
            info!(total = total, "nothing to do, all subjects already processed");
            self.store.clear()?;
            return Ok(ScanOutcome {
                results,
                resumed_count,
                duration: started.elapsed(),
            });
        }

        info!(
            total = total,
            remaining = remaining.len(),
            resumed = resumed_count,
            "scan starting"
        );

        let fan = backend.fan_out(&remaining, task, Arc::clone(&self.shutdown));
        let mut completed_this_run = 0usize;
        let mut winding_down = false;

        // Consume until every worker is done. Workers stop at the next
        // subject boundary once the shutdown flag is set, so in-flight
        // results still arrive and get checkpointed before the stream
        // disconnects.
        loop {
            match fan.receiver().recv_timeout(POLL_INTERVAL) {
                Ok(result) => {
                    completed_this_run += 1;
                    results.push(result);
                    if let Some(result) = results.last() {
                        on_result(result, results.len(), total);
                    }
                    self.store
                        .save(&CheckpointRecord::new(total, &results, false))?;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.shutdown.load(Ordering::Relaxed) && !winding_down {
                        winding_down = true;
                        warn!(
                            completed = results.len(),
                            total = total,
                            "interrupt received, waiting for in-flight subjects"
                        );
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        fan.join();

        // A disconnect before every remaining subject completed means the
        // workers stopped early (interrupted, or they died).
        if completed_this_run < remaining.len() {
            warn!(
                completed = results.len(),
                expected = total,
                "workers stopped before finishing the batch"
            );
            return self.interrupt(total, &results);
        }

        self.store.clear()?;

        let duration = started.elapsed();
        info!(
            subjects = results.len(),
            duration_secs = duration.as_secs(),
            "scan complete"
        );

        Ok(ScanOutcome {
            results,
            resumed_count,
            duration,
        })
    }

    /// Resolve resume state: prior results plus the subjects still to do
    fn prepare(&self, subjects: &[String]) -> Result<(Vec<SubjectResult>, Vec<String>)> {
        if !self.resume {
            return Ok((Vec::new(), subjects.to_vec()));
        }

        match self.store.load()? {
            None => {
                info!(
                    path = %self.store.path().display(),
                    "resume requested but no checkpoint found, starting fresh"
                );
                Ok((Vec::new(), subjects.to_vec()))
            }
            Some(record) => {
                let remaining: Vec<String> = record
                    .remaining(subjects)
                    .into_iter()
                    .cloned()
                    .collect();
                info!(
                    completed = record.processed_count,
                    remaining = remaining.len(),
                    interrupted = record.interrupted,
                    last = %record.last_completed_subject,
                    "resuming from checkpoint"
                );
                Ok((record.results, remaining))
            }
        }
    }

    /// Persist an interrupted checkpoint and surface the resumable failure
    fn interrupt(&self, total: usize, results: &[SubjectResult]) -> Result<ScanOutcome> {
        self.store
            .save(&CheckpointRecord::new(total, results, true))?;
        Err(InventoryError::Interrupted {
            completed: results.len(),
            total,
            checkpoint: self.store.path().to_path_buf(),
        })
    }
}
