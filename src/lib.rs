//! dbx-inventory - Databricks User Storage Inventory
//!
//! A tool for measuring per-user storage usage across a Databricks
//! workspace: it walks each user's home directory in the DBFS and
//! Workspace filesystem namespaces, aggregates file counts and sizes, and
//! exports the results to CSV.
//!
//! # Features
//!
//! - **Rate-Limit Aware**: every listing call is paced client-side, and
//!   throttling raises the baseline delay for the rest of the run.
//!   Throttled, failing and flaky calls retry with capped exponential
//!   backoff.
//!
//! - **Parallel Scanning**: users are partitioned across worker threads;
//!   each worker processes its partition sequentially with its own API
//!   client.
//!
//! - **Checkpointed**: the run state is rewritten after every completed
//!   user, so an interrupted scan resumes with `--resume` instead of
//!   starting over.
//!
//! - **Degrade, Don't Abort**: a missing home directory is an empty
//!   result, an unreachable subtree is skipped, and a failed user becomes
//!   an error row - none of them stop the batch.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Databricks Workspace                          │
//! │        /api/2.0/dbfs/list    /api/2.0/workspace/list             │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               │ paced, retrying HTTP
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Worker Threads                              │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │Worker 0 │  │Worker 1 │  │Worker 2 │  ...    │Worker N │     │
//! │  │ walker  │  │ walker  │  │ walker  │         │ walker  │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       │            │            │                    │          │
//! │       └────────────┴─────┬──────┴────────────────────┘          │
//! │                          │ SubjectResult stream                 │
//! │                          ▼                                      │
//! │            ┌──────────────────────────┐                         │
//! │            │       Coordinator        │                         │
//! │            │  - checkpoint per user   │                         │
//! │            │  - resume bookkeeping    │                         │
//! │            └────────────┬─────────────┘                         │
//! └─────────────────────────┼───────────────────────────────────────┘
//!                           │
//!                           ▼
//!                ┌──────────────────┐
//!                │  inventory.csv   │
//!                │  checkpoint.json │
//!                └──────────────────┘
//! ```

pub mod api;
pub mod checkpoint;
pub mod config;
pub mod credentials;
pub mod error;
pub mod progress;
pub mod report;
pub mod users;
pub mod versions;
pub mod walker;

pub use error::{InventoryError, Result};
