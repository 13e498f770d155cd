//! Execution backends
//!
//! The coordinator hands a list of subjects and a [`SubjectTask`] to an
//! [`ExecutionBackend`] and consumes a stream of results. Two backends
//! exist, selected by configuration:
//!
//! - [`SequentialBackend`]: one worker, input order preserved
//! - [`ThreadedBackend`]: subjects are partitioned round-robin across up to
//!   `min(len, min(workers, 200))` partitions; partitions run concurrently,
//!   subjects within a partition run sequentially
//!
//! Workers check the shutdown flag between subjects, so an interrupt stops
//! the fan-out at the next subject boundary without losing completed work.

use crate::walker::subject::SubjectResult;
use crossbeam_channel::{unbounded, Receiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Cap on fan-out width regardless of input size
pub const MAX_PARTITIONS: usize = 200;

/// A unit of work: process one subject and produce its result
pub trait SubjectTask: Send + Sync + 'static {
    fn process(&self, subject_id: &str, worker_id: usize) -> SubjectResult;
}

/// A running fan-out: a stream of results plus the worker handles
pub struct FanOut {
    receiver: Receiver<SubjectResult>,
    handles: Vec<JoinHandle<()>>,
}

impl FanOut {
    /// The result stream; disconnects once every worker has finished
    pub fn receiver(&self) -> &Receiver<SubjectResult> {
        &self.receiver
    }

    /// Wait for all workers to finish
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

/// Distributes subjects across workers and streams results back
pub trait ExecutionBackend {
    fn fan_out(
        &self,
        subjects: &[String],
        task: Arc<dyn SubjectTask>,
        shutdown: Arc<AtomicBool>,
    ) -> FanOut;
}

/// Compute the fan-out width for an input size and worker count
pub fn partition_count(subject_count: usize, worker_count: usize) -> usize {
    subject_count.min(worker_count.min(MAX_PARTITIONS)).max(1)
}

/// Round-robin subjects into `partitions` buckets, preserving relative order
fn partition_subjects(subjects: &[String], partitions: usize) -> Vec<Vec<String>> {
    let mut buckets: Vec<Vec<String>> = vec![Vec::new(); partitions];
    for (index, subject) in subjects.iter().enumerate() {
        buckets[index % partitions].push(subject.clone());
    }
    buckets
}

/// Spawn one worker; a failed spawn is logged and surfaces downstream as an
/// incomplete batch, which the coordinator turns into a resumable failure
fn spawn_worker(
    worker_id: usize,
    bucket: Vec<String>,
    task: Arc<dyn SubjectTask>,
    sender: crossbeam_channel::Sender<SubjectResult>,
    shutdown: Arc<AtomicBool>,
) -> Option<JoinHandle<()>> {
    let spawned = thread::Builder::new()
        .name(format!("inventory-{worker_id}"))
        .spawn(move || {
            debug!(worker = worker_id, subjects = bucket.len(), "worker starting");
            for subject_id in bucket {
                if shutdown.load(Ordering::Relaxed) {
                    debug!(worker = worker_id, "shutdown requested, stopping");
                    break;
                }
                let result = task.process(&subject_id, worker_id);
                // The coordinator may have stopped consuming; nothing to do
                if sender.send(result).is_err() {
                    break;
                }
            }
            debug!(worker = worker_id, "worker finished");
        });

    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            error!(worker = worker_id, error = %e, "failed to spawn worker thread");
            None
        }
    }
}

/// One worker processing subjects in input order
pub struct SequentialBackend;

impl ExecutionBackend for SequentialBackend {
    fn fan_out(
        &self,
        subjects: &[String],
        task: Arc<dyn SubjectTask>,
        shutdown: Arc<AtomicBool>,
    ) -> FanOut {
        let (sender, receiver) = unbounded();
        info!(subjects = subjects.len(), "sequential fan-out starting");
        let handles = spawn_worker(0, subjects.to_vec(), task, sender, shutdown)
            .into_iter()
            .collect();
        FanOut { receiver, handles }
    }
}

/// Partitioned concurrent fan-out
pub struct ThreadedBackend {
    worker_count: usize,
}

impl ThreadedBackend {
    pub fn new(worker_count: usize) -> Self {
        Self { worker_count }
    }
}

impl ExecutionBackend for ThreadedBackend {
    fn fan_out(
        &self,
        subjects: &[String],
        task: Arc<dyn SubjectTask>,
        shutdown: Arc<AtomicBool>,
    ) -> FanOut {
        let partitions = partition_count(subjects.len(), self.worker_count);
        let buckets = partition_subjects(subjects, partitions);
        let (sender, receiver) = unbounded();

        info!(
            subjects = subjects.len(),
            partitions = partitions,
            "threaded fan-out starting"
        );

        let handles = buckets
            .into_iter()
            .enumerate()
            .filter_map(|(worker_id, bucket)| {
                spawn_worker(
                    worker_id,
                    bucket,
                    Arc::clone(&task),
                    sender.clone(),
                    Arc::clone(&shutdown),
                )
            })
            .collect();

        // Workers hold the only remaining senders; the stream disconnects
        // when the last one finishes.
        drop(sender);

        FanOut { receiver, handles }
    }
}
