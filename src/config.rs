//! Configuration types for dbx-inventory
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Subjects-file loading

use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Maximum worker count; also the cap on fan-out width
pub const MAX_WORKERS: usize = 200;

/// Maximum traversal depth accepted on the CLI
const MAX_DEPTH_LIMIT: u32 = 64;

/// Scan Databricks user home directories and report per-user storage usage
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dbx-inventory",
    version,
    about = "Databricks user storage inventory with checkpointed parallel scanning",
    long_about = "Walks each listed user's home directory across the DBFS and Workspace\n\
                  filesystem namespaces, aggregates file counts and sizes, checkpoints\n\
                  after every completed user, and exports the results to CSV.\n\n\
                  Interrupted runs can be continued with --resume.",
    after_help = "EXAMPLES:\n    \
        dbx-inventory users.txt -o results.csv\n    \
        dbx-inventory users.txt --namespaces dbfs -w 16\n    \
        dbx-inventory users.txt --resume\n    \
        dbx-inventory users --output users.txt\n    \
        dbx-inventory versions --cluster-id 0101-123456-abcdef",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct CliArgs {
    /// File listing subjects (user emails), one per line; # starts a comment
    #[arg(value_name = "SUBJECTS_FILE")]
    pub subjects_file: Option<PathBuf>,

    /// Subcommand (users, versions)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output CSV file
    #[arg(short, long, default_value = "inventory.csv", value_name = "FILE")]
    pub output: PathBuf,

    /// Checkpoint file for resumable runs
    #[arg(
        long,
        default_value = "inventory.checkpoint.json",
        value_name = "FILE"
    )]
    pub checkpoint: PathBuf,

    /// Continue from an existing checkpoint instead of starting over
    #[arg(long)]
    pub resume: bool,

    /// Number of concurrent workers
    #[arg(short = 'w', long, default_value_t = default_workers(), value_name = "NUM")]
    pub workers: usize,

    /// Maximum directory depth per namespace
    #[arg(short = 'd', long, default_value = "10", value_name = "NUM")]
    pub max_depth: u32,

    /// Which namespaces to enumerate
    #[arg(long, value_enum, default_value_t = NamespaceSelection::Both)]
    pub namespaces: NamespaceSelection,

    /// Process subjects one at a time on a single worker
    #[arg(long)]
    pub sequential: bool,

    /// Databricks CLI profile from ~/.databrickscfg
    #[arg(short = 'p', long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Workspace URL (overrides profile and environment)
    #[arg(long, value_name = "URL")]
    pub workspace_url: Option<String>,

    /// Access token (overrides profile and environment)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    pub timeout: u64,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug-level logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// List workspace users via the SCIM API
    Users {
        /// Write usernames here instead of stdout (one per line)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Stop after this many users
        #[arg(long, value_name = "NUM")]
        max_users: Option<usize>,

        /// Databricks CLI profile from ~/.databrickscfg
        #[arg(short = 'p', long, value_name = "NAME")]
        profile: Option<String>,

        /// Workspace URL (overrides profile and environment)
        #[arg(long, value_name = "URL")]
        workspace_url: Option<String>,

        /// Access token (overrides profile and environment)
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,

        /// Verbose output (debug-level logging)
        #[arg(short = 'v', long)]
        verbose: bool,
    },

    /// Compare local tooling against the cluster runtime
    Versions {
        /// Specific cluster to inspect (default: first RUNNING cluster)
        #[arg(long, value_name = "ID")]
        cluster_id: Option<String>,

        /// Databricks CLI profile from ~/.databrickscfg
        #[arg(short = 'p', long, value_name = "NAME")]
        profile: Option<String>,

        /// Workspace URL (overrides profile and environment)
        #[arg(long, value_name = "URL")]
        workspace_url: Option<String>,

        /// Access token (overrides profile and environment)
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,

        /// Verbose output (debug-level logging)
        #[arg(short = 'v', long)]
        verbose: bool,
    },
}

/// Which namespaces a scan enumerates
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NamespaceSelection {
    /// DBFS data files only
    Dbfs,
    /// Workspace notebooks/files only
    Workspace,
    /// Both namespaces (default)
    Both,
}

fn default_workers() -> usize {
    // Listing calls are I/O bound, so go wider than the core count
    (num_cpus::get() * 2).min(MAX_WORKERS)
}

/// Validated runtime configuration for a scan
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Subjects file path
    pub subjects_path: PathBuf,

    /// Output CSV path
    pub output_path: PathBuf,

    /// Checkpoint file path
    pub checkpoint_path: PathBuf,

    /// Continue from the checkpoint
    pub resume: bool,

    /// Concurrent worker count
    pub worker_count: usize,

    /// Maximum traversal depth
    pub max_depth: u32,

    /// Namespaces to enumerate
    pub namespaces: NamespaceSelection,

    /// Force the sequential backend
    pub sequential: bool,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Show progress output
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl InventoryConfig {
    /// Validate CLI arguments into a runtime configuration
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let subjects_path = args.subjects_file.clone().ok_or_else(|| {
            ConfigError::SubjectsFile {
                path: PathBuf::new(),
                reason: "no subjects file given".into(),
            }
        })?;

        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.max_depth == 0 || args.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::InvalidMaxDepth {
                depth: args.max_depth,
                max: MAX_DEPTH_LIMIT,
            });
        }

        if args.timeout == 0 {
            return Err(ConfigError::InvalidTimeout { secs: args.timeout });
        }

        Ok(Self {
            subjects_path,
            output_path: args.output.clone(),
            checkpoint_path: args.checkpoint.clone(),
            resume: args.resume,
            worker_count: args.workers,
            max_depth: args.max_depth,
            namespaces: args.namespaces,
            sequential: args.sequential,
            timeout_secs: args.timeout,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}

/// Load subjects from a file: one per line, blank lines and `#` comments
/// ignored, duplicates removed preserving first-seen order
pub fn load_subjects(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SubjectsFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut seen = HashSet::new();
    let subjects: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect();

    if subjects.is_empty() {
        return Err(ConfigError::NoSubjects {
            path: path.to_path_buf(),
        });
    }

    Ok(subjects)
}
