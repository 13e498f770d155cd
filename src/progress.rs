//! Progress reporting for the inventory scan
//!
//! A spinner summarizes the running totals; each completed subject also
//! gets its own status line so long scans show per-user progress as
//! results stream in.

use crate::walker::subject::{SubjectResult, SubjectStatus};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Running totals shown in the spinner
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanProgress {
    pub completed: usize,
    pub total: usize,
    pub files: u64,
    pub bytes: u64,
    pub errors: u64,
}

impl ScanProgress {
    /// Fold one finished subject into the totals
    pub fn record(&mut self, result: &SubjectResult, completed: usize, total: usize) {
        self.completed = completed;
        self.total = total;
        self.files += result.file_count;
        self.bytes += result.total_size_bytes;
        if result.status == SubjectStatus::Error {
            self.errors += 1;
        }
    }
}

/// Spinner-based progress reporter
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the spinner with the current totals
    pub fn update(&self, progress: &ScanProgress) {
        let mut msg = format!(
            "Users: {}/{} | Files: {} | Size: {}",
            progress.completed,
            progress.total,
            format_count(progress.files),
            format_size(progress.bytes, BINARY),
        );
        if progress.errors > 0 {
            msg.push_str(&format!(" | Errors: {}", progress.errors));
        }
        self.bar.set_message(msg);
    }

    /// Print one completed subject above the spinner
    pub fn subject_line(&self, result: &SubjectResult, completed: usize, total: usize) {
        self.bar.println(render_subject_line(result, completed, total));
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the per-subject status line
fn render_subject_line(result: &SubjectResult, completed: usize, total: usize) -> String {
    let glyph = match result.status {
        SubjectStatus::Success => style("✓").green(),
        SubjectStatus::Empty => style("⊘").yellow(),
        SubjectStatus::Error => style("✗").red(),
    };
    let detail = match &result.error_detail {
        Some(detail) => format!(" - {detail}"),
        None => String::new(),
    };
    format!(
        "  [{completed}/{total}] {glyph} {}: {} files ({}){detail}",
        result.subject_id,
        format_count(result.file_count),
        format_size(result.total_size_bytes, BINARY),
    )
}

/// Format a count with thousands separators
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(1234567890), "1,234,567,890");
    }

    #[test]
    fn test_progress_accumulates() {
        let mut progress = ScanProgress::default();

        let ok = SubjectResult {
            subject_id: "a@x.com".into(),
            file_count: 10,
            dir_count: 2,
            total_size_bytes: 1024,
            status: SubjectStatus::Success,
            error_detail: None,
            source_breakdown: crate::walker::subject::SourceBreakdown::Dbfs,
            truncated: false,
            worker_id: 0,
            start_time: Utc::now(),
            end_time: Utc::now(),
            duration_seconds: 0.1,
        };
        progress.record(&ok, 1, 3);

        let failed = SubjectResult::failed("b@x.com", 1, Utc::now(), "boom".into());
        progress.record(&failed, 2, 3);

        assert_eq!(progress.completed, 2);
        assert_eq!(progress.files, 10);
        assert_eq!(progress.bytes, 1024);
        assert_eq!(progress.errors, 1);
    }

    #[test]
    fn test_subject_line_includes_error_detail() {
        let failed = SubjectResult::failed("b@x.com", 1, Utc::now(), "timeout".into());
        let line = render_subject_line(&failed, 2, 5);
        assert!(line.contains("[2/5]"));
        assert!(line.contains("b@x.com"));
        assert!(line.contains("timeout"));
    }
}
