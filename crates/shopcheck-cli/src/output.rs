//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use shopcheck::{ScenarioRecord, ScenarioStatus, SuiteReport};

/// Progress reporter for suite execution
///
/// Writes to stderr. While a progress bar is active, lines are printed
/// above it instead of through it.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    fn write_line(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_finished() => pb.suspend(|| {
                let _ = self.term.write_line(line);
            }),
            _ => {
                let _ = self.term.write_line(line);
            }
        }
    }

    fn prefixed(&self, symbol: &str, plain: &str, paint: Style, message: &str) {
        let prefix = if self.use_color {
            paint.bold().apply_to(symbol).to_string()
        } else {
            plain.to_string()
        };
        self.write_line(&format!("{prefix} {message}"));
    }

    /// Start a progress bar for the suite
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("✓", "PASS", Style::new().green(), message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.prefixed("✗", "FAIL", Style::new().red(), message);
    }

    /// Print an engine error message
    pub fn error(&self, message: &str) {
        self.prefixed("!", "ERROR", Style::new().magenta(), message);
    }

    /// Print a message for a scenario that never ran
    pub fn skipped(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("-", "SKIP", Style::new().yellow(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("⚠", "WARN", Style::new().yellow(), message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("ℹ", "INFO", Style::new().blue(), message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.write_line("");
        self.write_line(&styled);
    }

    /// Print one scenario outcome
    pub fn record(&self, record: &ScenarioRecord) {
        let label = format!("{} - {} ({}ms)", record.id, record.title, record.duration_ms);
        let detail = record.error.as_deref().unwrap_or("unknown error");
        match record.status {
            ScenarioStatus::Passed => self.success(&label),
            ScenarioStatus::Failed => self.failure(&format!("{label}: {detail}")),
            ScenarioStatus::Errored => self.error(&format!("{label}: {detail}")),
            ScenarioStatus::Pending | ScenarioStatus::Running => self.skipped(&record.id),
        }
    }

    /// Print suite summary
    pub fn summary(&self, report: &SuiteReport) {
        let not_passed = report.total_count() - report.passed_count();
        if self.quiet && not_passed == 0 {
            return;
        }

        self.write_line("");

        let stats = report.stats();
        let duration_secs = report.total_duration().as_secs_f64();
        let counts = format!(
            "{} passed, {} failed, {} errored, {} not run",
            stats.passed, stats.failed, stats.errored, stats.pending
        );

        let line = if self.use_color {
            let status = if not_passed > 0 {
                Style::new().red().bold().apply_to("FAILED")
            } else {
                Style::new().green().bold().apply_to("PASSED")
            };
            format!(
                "{status} {} scenarios in {duration_secs:.2}s ({counts})",
                stats.total
            )
        } else {
            let status = if not_passed > 0 { "FAILED" } else { "PASSED" };
            format!(
                "{status} {} scenarios in {duration_secs:.2}s ({counts})",
                stats.total
            )
        };
        self.write_line(&line);

        for line in failure_lines(report) {
            self.write_line(&line);
        }
    }
}

/// One indented line per scenario that did not pass
fn failure_lines(report: &SuiteReport) -> Vec<String> {
    report
        .failures()
        .into_iter()
        .map(|record| {
            let reason = record.error.as_deref().unwrap_or("not run");
            format!("  {} {}: {reason}", record.status, record.id)
        })
        .collect()
}
