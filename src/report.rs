//! Result export and summary rendering
//!
//! The CSV report has one row per subject. Sizes contributed by the
//! workspace namespace are estimates (the API reports no sizes there), and
//! the summary says so whenever they are present.

use crate::error::ReportError;
use crate::progress::format_count;
use crate::walker::subject::{SubjectResult, SubjectStatus};
use console::style;
use humansize::{format_size, BINARY};
use std::path::Path;
use std::time::Duration;

const BYTES_PER_GB: f64 = (1024 * 1024 * 1024) as f64;

/// CSV header, one column per exported field
const CSV_HEADER: [&str; 7] = [
    "subject_id",
    "file_count",
    "total_size_bytes",
    "total_size_gb",
    "status",
    "source_breakdown",
    "error_detail",
];

/// Write the per-subject CSV report
pub fn write_csv(path: &Path, results: &[SubjectResult]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;

    for result in results {
        writer.write_record(&[
            result.subject_id.clone(),
            result.file_count.to_string(),
            result.total_size_bytes.to_string(),
            format!("{:.2}", result.total_size_bytes as f64 / BYTES_PER_GB),
            result.status.as_str().to_string(),
            result.source_breakdown.as_str().to_string(),
            result.error_detail.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Print a header at the start of a scan
pub fn print_header(workspace_url: &str, subjects: usize, workers: usize, output: &Path) {
    println!();
    println!(
        "{} {}",
        style("dbx-inventory").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Workspace:").bold(), workspace_url);
    println!("  {} {}", style("Users:").bold(), subjects);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Output:").bold(), output.display());
    println!();
}

/// Print a summary of a completed scan
pub fn print_summary(results: &[SubjectResult], duration: Duration, output: &Path) {
    let successful = results
        .iter()
        .filter(|r| r.status == SubjectStatus::Success)
        .count();
    let empty = results
        .iter()
        .filter(|r| r.status == SubjectStatus::Empty)
        .count();
    let errors = results
        .iter()
        .filter(|r| r.status == SubjectStatus::Error)
        .count();

    let total_files: u64 = results.iter().map(|r| r.file_count).sum();
    let total_bytes: u64 = results.iter().map(|r| r.total_size_bytes).sum();
    let any_estimates = results
        .iter()
        .any(|r| r.source_breakdown.includes_estimates());

    println!();
    println!("{}", style("Scan Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Users processed:").bold(),
        results.len()
    );
    println!("    {} {}", style("with files:").dim(), successful);
    println!("    {} {}", style("empty:").dim(), empty);
    if errors > 0 {
        println!(
            "    {} {}",
            style("errors:").yellow(),
            errors
        );
    }
    println!(
        "  {} {}",
        style("Total files:").bold(),
        format_count(total_files)
    );
    println!(
        "  {} {} ({} bytes)",
        style("Total size:").bold(),
        format_size(total_bytes, BINARY),
        format_count(total_bytes)
    );
    if any_estimates {
        println!(
            "  {}",
            style("Workspace file sizes are estimated (API reports none)").dim()
        );
    }
    println!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        duration.as_secs_f64()
    );
    println!("  {} {}", style("Report:").bold(), output.display());
    println!();
}

/// Print the distinct interrupted-run notice with recovery guidance
pub fn print_interrupted(completed: usize, total: usize, checkpoint: &Path) {
    println!();
    println!("{}", style("Scan Interrupted").red().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}/{}", style("Completed:").bold(), completed, total);
    println!(
        "  {} {}",
        style("Remaining:").bold(),
        total.saturating_sub(completed)
    );
    println!(
        "  {} {}",
        style("Checkpoint:").bold(),
        checkpoint.display()
    );
    println!();
    println!("  Completed results are preserved in the checkpoint.");
    println!("  Re-run with --resume to continue where the scan stopped,");
    println!("  or split the subject list into smaller batches.");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::subject::{SourceBreakdown, SubjectResult, SubjectStatus};
    use chrono::Utc;
    use tempfile::tempdir;

    fn result(subject: &str, files: u64, bytes: u64, status: SubjectStatus) -> SubjectResult {
        SubjectResult {
            subject_id: subject.into(),
            file_count: files,
            dir_count: 0,
            total_size_bytes: bytes,
            status,
            error_detail: None,
            source_breakdown: if files > 0 {
                SourceBreakdown::Dbfs
            } else {
                SourceBreakdown::None
            },
            truncated: false,
            worker_id: 0,
            start_time: Utc::now(),
            end_time: Utc::now(),
            duration_seconds: 0.0,
        }
    }

    #[test]
    fn test_csv_shape_and_rounding() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let results = vec![
            result("u1", 3, 300, SubjectStatus::Success),
            result("u2", 0, 0, SubjectStatus::Empty),
        ];
        write_csv(&path, &results).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 data rows
        assert_eq!(
            lines[0],
            "subject_id,file_count,total_size_bytes,total_size_gb,status,source_breakdown,error_detail"
        );
        assert_eq!(lines[1], "u1,3,300,0.00,success,dbfs,");
        assert_eq!(lines[2], "u2,0,0,0.00,empty,none,");
    }

    #[test]
    fn test_csv_gb_two_decimals() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");

        // 5.5 GiB
        let bytes = (5.5 * BYTES_PER_GB) as u64;
        write_csv(&path, &[result("u1", 1, bytes, SubjectStatus::Success)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.lines().nth(1).unwrap().contains(",5.50,"));
    }

    #[test]
    fn test_csv_error_row_carries_detail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let mut failed = result("u3", 0, 0, SubjectStatus::Error);
        failed.error_detail = Some("dbfs: listing failed".into());
        write_csv(&path, &[failed]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert!(row.starts_with("u3,0,0,0.00,error,none,"));
        assert!(row.contains("listing failed"));
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let mut failed = result("u4", 0, 0, SubjectStatus::Error);
        failed.error_detail = Some("dbfs: a, b".into());
        write_csv(&path, &[failed]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"dbfs: a, b\""));
    }
}
