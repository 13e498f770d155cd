//! dbx-inventory - Databricks User Storage Inventory
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use dbx_inventory::api::{ApiClient, DEFAULT_REQUEST_TIMEOUT_SECS};
use dbx_inventory::checkpoint::CheckpointStore;
use dbx_inventory::config::{self, CliArgs, Command, InventoryConfig};
use dbx_inventory::credentials::Credentials;
use dbx_inventory::error::InventoryError;
use dbx_inventory::progress::{ProgressReporter, ScanProgress};
use dbx_inventory::walker::{
    ApiSubjectProcessor, ExecutionBackend, InventoryCoordinator, SequentialBackend,
    ThreadedBackend,
};
use dbx_inventory::{report, users, versions};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    match args.command.clone() {
        Some(Command::Users {
            output,
            max_users,
            profile,
            workspace_url,
            token,
            verbose,
        }) => {
            setup_logging(verbose)?;
            let credentials = Credentials::resolve(
                workspace_url.as_deref(),
                token.as_deref(),
                profile.as_deref(),
            )?;
            let client = ApiClient::new(
                &credentials,
                Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            )
            .map_err(InventoryError::from)?;
            let found = users::list_users(&client, max_users).map_err(InventoryError::from)?;
            users::write_user_list(&found, output.as_deref())?;
            Ok(())
        }
        Some(Command::Versions {
            cluster_id,
            profile,
            workspace_url,
            token,
            verbose,
        }) => {
            setup_logging(verbose)?;
            let credentials = Credentials::resolve(
                workspace_url.as_deref(),
                token.as_deref(),
                profile.as_deref(),
            )?;
            let client = ApiClient::new(
                &credentials,
                Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            )
            .map_err(InventoryError::from)?;
            let runtime =
                versions::fetch_runtime_report(&client, cluster_id).map_err(InventoryError::from)?;
            versions::print_report(&credentials.workspace_url, &runtime);
            Ok(())
        }
        None => {
            setup_logging(args.verbose)?;
            run_scan(&args)
        }
    }
}

/// Run the inventory scan
fn run_scan(args: &CliArgs) -> Result<()> {
    let config = InventoryConfig::from_args(args).context("Invalid configuration")?;
    let credentials = Credentials::resolve(
        args.workspace_url.as_deref(),
        args.token.as_deref(),
        args.profile.as_deref(),
    )?;

    let subjects = config::load_subjects(&config.subjects_path)?;
    info!(
        subjects = subjects.len(),
        workspace = %credentials.workspace_url,
        "subject list loaded"
    );

    if config.show_progress {
        report::print_header(
            &credentials.workspace_url,
            subjects.len(),
            config.worker_count,
            &config.output_path,
        );
    }

    // Setup signal handler for graceful shutdown
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            eprintln!("\nInterrupt received, finishing in-flight users...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .context("Failed to set signal handler")?;
    }

    let coordinator = InventoryCoordinator::new(
        CheckpointStore::new(&config.checkpoint_path),
        Arc::clone(&shutdown),
        config.resume,
    );

    let task = Arc::new(ApiSubjectProcessor::new(
        credentials,
        Duration::from_secs(config.timeout_secs),
        config.max_depth,
        config.namespaces,
    ));

    let backend: Box<dyn ExecutionBackend> = if config.sequential {
        Box::new(SequentialBackend)
    } else {
        Box::new(ThreadedBackend::new(config.worker_count))
    };

    let reporter = config.show_progress.then(ProgressReporter::new);
    let mut totals = ScanProgress::default();

    let outcome = coordinator.run(&subjects, backend.as_ref(), task, |result, done, total| {
        totals.record(result, done, total);
        if let Some(reporter) = &reporter {
            reporter.subject_line(result, done, total);
            reporter.update(&totals);
        }
    });

    if let Some(reporter) = &reporter {
        reporter.finish_and_clear();
    }

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(InventoryError::Interrupted {
            completed,
            total,
            checkpoint,
        }) => {
            if config.show_progress {
                report::print_interrupted(completed, total, &checkpoint);
            }
            return Err(InventoryError::Interrupted {
                completed,
                total,
                checkpoint,
            }
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    report::write_csv(&config.output_path, &outcome.results)
        .map_err(InventoryError::from)?;

    if config.show_progress {
        report::print_summary(&outcome.results, outcome.duration, &config.output_path);
    } else {
        info!(
            subjects = outcome.results.len(),
            resumed = outcome.resumed_count,
            output = %config.output_path.display(),
            "scan complete"
        );
    }

    Ok(())
}

/// Setup the tracing subscriber
fn setup_logging(verbose: bool) -> Result<()> {
    let default_filter = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dbx_inventory={default_filter}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}
