//! Reporter - suite outcomes, summaries and report files
//!
//! The runner records one [`ScenarioRecord`] per scenario. When the suite is
//! done the reporter is frozen into a [`SuiteReport`], which renders a one-line
//! summary, a JSON document and (optionally) an HTML page.
//!
//! Report files are never overwritten unless asked: with `overwrite = false`
//! the first free name out of `shopcheck.json`, `shopcheck_001.json`,
//! `shopcheck_002.json`, ... is used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::result::{CheckError, CheckResult};
use crate::scenario::ScenarioStatus;

/// File stem of every report
pub const REPORT_STEM: &str = "shopcheck";

/// What happens after a scenario does not pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
    /// Run every scenario regardless of earlier outcomes
    #[default]
    CollectAll,
    /// Stop the line at the first scenario that does not pass
    AndonCord,
}

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Scenario id
    pub id: String,
    /// Scenario title
    pub title: String,
    /// Final status
    pub status: ScenarioStatus,
    /// Wall time spent in the scenario, setup included
    pub duration_ms: u64,
    /// Error message when the scenario did not pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Screenshot taken on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
    /// When the scenario finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScenarioRecord {
    /// Create a record for a scenario that reached `status`
    #[must_use]
    pub fn settled(
        id: impl Into<String>,
        title: impl Into<String>,
        status: ScenarioStatus,
        duration: Duration,
        error: Option<&CheckError>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status,
            duration_ms: duration.as_millis() as u64,
            error: error.map(ToString::to_string),
            screenshot: None,
            finished_at: Some(Utc::now()),
        }
    }

    /// Create a passing record
    #[must_use]
    pub fn passed(id: impl Into<String>, title: impl Into<String>, duration: Duration) -> Self {
        Self::settled(id, title, ScenarioStatus::Passed, duration, None)
    }

    /// Create a record for a scenario that ended in `error`
    #[must_use]
    pub fn from_error(
        id: impl Into<String>,
        title: impl Into<String>,
        duration: Duration,
        error: &CheckError,
    ) -> Self {
        Self::settled(
            id,
            title,
            ScenarioStatus::settle(Err(error)),
            duration,
            Some(error),
        )
    }

    /// Create a record for a scenario that never started
    #[must_use]
    pub fn pending(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: ScenarioStatus::Pending,
            duration_ms: 0,
            error: None,
            screenshot: None,
            finished_at: None,
        }
    }

    /// Attach a failure screenshot
    #[must_use]
    pub fn with_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot = Some(path.into());
        self
    }

    /// Duration as `Duration`
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Aggregate counts for a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportStats {
    /// Scenarios in the suite
    pub total: usize,
    /// Passed scenarios
    pub passed: usize,
    /// Failed scenarios
    pub failed: usize,
    /// Errored scenarios
    pub errored: usize,
    /// Scenarios that never ran
    pub pending: usize,
    /// Passed / total, as a percentage
    pub pass_percent: f64,
    /// Sum of scenario durations
    pub duration_ms: u64,
}

/// Test reporter with Andon Cord support
///
/// Collects records while the suite runs. In `AndonCord` mode, recording a
/// non-passing scenario returns an error telling the runner to stop.
#[derive(Debug)]
pub struct Reporter {
    run_id: Uuid,
    suite_name: String,
    base_url: String,
    failure_mode: FailureMode,
    started_at: DateTime<Utc>,
    records: Vec<ScenarioRecord>,
}

impl Reporter {
    /// Create a collecting reporter for a suite
    #[must_use]
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            suite_name: suite_name.into(),
            base_url: String::new(),
            failure_mode: FailureMode::CollectAll,
            started_at: Utc::now(),
            records: Vec::new(),
        }
    }

    /// Set failure mode
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Record the URL under test
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Record a scenario outcome
    ///
    /// # Errors
    ///
    /// In AndonCord mode, returns error if the scenario did not pass
    pub fn record(&mut self, record: ScenarioRecord) -> CheckResult<()> {
        let stop = self.failure_mode == FailureMode::AndonCord
            && record.status.is_terminal()
            && !record.status.is_passed();
        let id = record.id.clone();
        self.records.push(record);

        if stop {
            return Err(CheckError::assertion(format!(
                "ANDON CORD PULLED: scenario '{id}' did not pass"
            )));
        }
        Ok(())
    }

    /// List a scenario that never ran
    pub fn skip(&mut self, id: &str, title: &str) {
        self.records.push(ScenarioRecord::pending(id, title));
    }

    /// Records so far
    #[must_use]
    pub fn records(&self) -> &[ScenarioRecord] {
        &self.records
    }

    /// Freeze into a report
    #[must_use]
    pub fn finish(self) -> SuiteReport {
        SuiteReport {
            run_id: self.run_id,
            suite: self.suite_name,
            base_url: self.base_url,
            started_at: self.started_at,
            finished_at: Utc::now(),
            scenarios: self.records,
        }
    }
}

/// Finished run, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique id for this run
    pub run_id: Uuid,
    /// Suite name
    pub suite: String,
    /// URL under test
    pub base_url: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Per-scenario outcomes in suite order
    pub scenarios: Vec<ScenarioRecord>,
}

impl SuiteReport {
    fn count(&self, status: ScenarioStatus) -> usize {
        self.scenarios.iter().filter(|r| r.status == status).count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Get number of passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    /// Get number of failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(ScenarioStatus::Failed)
    }

    /// Get number of errored scenarios
    #[must_use]
    pub fn errored_count(&self) -> usize {
        self.count(ScenarioStatus::Errored)
    }

    /// Get number of scenarios that never ran
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.count(ScenarioStatus::Pending)
    }

    /// Get pass rate (0.0 to 1.0)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.scenarios.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.scenarios.len() as f64
    }

    /// Check if every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(|r| r.status.is_passed())
    }

    /// Get total duration
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.scenarios.iter().map(ScenarioRecord::duration).sum()
    }

    /// Get scenarios that did not pass
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioRecord> {
        self.scenarios
            .iter()
            .filter(|r| !r.status.is_passed())
            .collect()
    }

    /// Aggregate counts
    #[must_use]
    pub fn stats(&self) -> ReportStats {
        ReportStats {
            total: self.total_count(),
            passed: self.passed_count(),
            failed: self.failed_count(),
            errored: self.errored_count(),
            pending: self.pending_count(),
            pass_percent: self.pass_rate() * 100.0,
            duration_ms: self.total_duration().as_millis() as u64,
        }
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {}/{} passed ({:.1}%)",
            self.suite,
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0
        );
        for (label, n) in [
            ("failed", self.failed_count()),
            ("errored", self.errored_count()),
            ("not run", self.pending_count()),
        ] {
            if n > 0 {
                line.push_str(&format!(", {n} {label}"));
            }
        }
        line
    }

    /// Render the JSON report
    pub fn render_json(&self) -> CheckResult<String> {
        #[derive(Serialize)]
        struct Document<'a> {
            stats: ReportStats,
            #[serde(flatten)]
            report: &'a SuiteReport,
        }

        Ok(serde_json::to_string_pretty(&Document {
            stats: self.stats(),
            report: self,
        })?)
    }

    /// Render HTML report content.
    ///
    /// Screenshot links are written relative to `report_dir`, the directory
    /// the HTML file is saved in.
    #[must_use]
    pub fn render_html(&self, report_dir: &Path) -> String {
        let mut html = String::new();

        html.push_str(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>shopcheck report</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .progress-bar { background: #ddd; height: 20px; border-radius: 10px; overflow: hidden; }
        .passed { background: #4caf50; height: 100%; }
        .scenario { padding: 10px; margin: 5px 0; border-radius: 4px; }
        .scenario.pass { background: #e8f5e9; border-left: 4px solid #4caf50; }
        .scenario.fail { background: #ffebee; border-left: 4px solid #f44336; }
        .scenario.error { background: #fff3e0; border-left: 4px solid #ff9800; }
        .scenario.pending { background: #eceff1; border-left: 4px solid #90a4ae; }
        .message { color: #d32f2f; font-family: monospace; white-space: pre-wrap; }
    </style>
</head>
<body>
"#,
        );

        html.push_str(&format!(
            r#"<div class="summary">
    <h1>{}</h1>
    <p>{} &middot; run {}</p>
    <h2>Results: {}/{} passed ({:.1}%)</h2>
    <div class="progress-bar">
        <div class="passed" style="width: {:.1}%"></div>
    </div>
    <p>Duration: {:.2}s</p>
</div>
"#,
            escape_html(&self.suite),
            escape_html(&self.base_url),
            self.run_id,
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0,
            self.pass_rate() * 100.0,
            self.total_duration().as_secs_f64()
        ));

        html.push_str("<h2>Scenarios</h2>\n");
        for record in &self.scenarios {
            let class = match record.status {
                ScenarioStatus::Passed => "pass",
                ScenarioStatus::Failed => "fail",
                ScenarioStatus::Errored => "error",
                ScenarioStatus::Pending | ScenarioStatus::Running => "pending",
            };

            html.push_str(&format!(
                r#"<div class="scenario {}">
    <strong>{}</strong> {} - {} ({}ms)
"#,
                class,
                escape_html(&record.id),
                escape_html(&record.title),
                record.status,
                record.duration_ms
            ));

            if let Some(error) = &record.error {
                html.push_str(&format!(
                    "    <div class=\"message\">{}</div>\n",
                    escape_html(error)
                ));
            }
            if let Some(shot) = &record.screenshot {
                let href = shot.strip_prefix(report_dir).unwrap_or(shot);
                html.push_str(&format!(
                    "    <p><a href=\"{0}\">{0}</a></p>\n",
                    escape_html(&href.display().to_string())
                ));
            }

            html.push_str("</div>\n");
        }

        html.push_str(
            r"
<footer>
    <p>Generated by shopcheck</p>
</footer>
</body>
</html>
",
        );

        html
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Where and how report files are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutput {
    /// Output directory, created if missing
    pub dir: PathBuf,
    /// Replace `shopcheck.*` instead of numbering
    pub overwrite: bool,
    /// Write the JSON report
    pub json: bool,
    /// Write the HTML report
    pub html: bool,
}

impl ReportOutput {
    /// JSON only, numbered files
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: false,
            json: true,
            html: false,
        }
    }

    /// Directory for failure screenshots
    #[must_use]
    pub fn screenshot_dir(&self) -> PathBuf {
        self.dir.join("screenshots")
    }

    fn extensions(&self) -> Vec<&'static str> {
        let mut exts = Vec::new();
        if self.json {
            exts.push("json");
        }
        if self.html {
            exts.push("html");
        }
        exts
    }
}

/// First free report stem in `dir`.
///
/// Returns `stem` when overwriting or when no `stem.<ext>` exists yet,
/// otherwise `stem_001`, `stem_002`, ... such that no file with any of
/// `exts` is taken. JSON and HTML from one run therefore share a number.
#[must_use]
pub fn next_report_stem(dir: &Path, stem: &str, exts: &[&str], overwrite: bool) -> String {
    let taken = |candidate: &str| {
        exts.iter()
            .any(|ext| dir.join(format!("{candidate}.{ext}")).exists())
    };
    if overwrite || !taken(stem) {
        return stem.to_string();
    }
    (1u32..)
        .map(|n| format!("{stem}_{n:03}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| stem.to_string())
}

/// Write the enabled report files, returning their paths
pub fn write_reports(report: &SuiteReport, output: &ReportOutput) -> CheckResult<Vec<PathBuf>> {
    let exts = output.extensions();
    if exts.is_empty() {
        warn!("all report formats disabled, nothing written");
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(&output.dir)?;
    let stem = next_report_stem(&output.dir, REPORT_STEM, &exts, output.overwrite);

    let mut written = Vec::new();
    for ext in exts {
        let path = output.dir.join(format!("{stem}.{ext}"));
        let body = if ext == "json" {
            report.render_json()?
        } else {
            report.render_html(&output.dir)
        };
        std::fs::write(&path, body)?;
        info!(path = %path.display(), "report written");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn mixed_report() -> SuiteReport {
        let mut reporter = Reporter::new("home").with_base_url("https://shop.test");
        reporter
            .record(ScenarioRecord::passed("TC01", "suggestions", ms(1200)))
            .unwrap();
        reporter
            .record(ScenarioRecord::from_error(
                "TC02",
                "no suggestions for <@@@>",
                ms(4800),
                &CheckError::assertion("expected search-suggestions not to exist"),
            ))
            .unwrap();
        reporter
            .record(ScenarioRecord::from_error(
                "TC03",
                "menu",
                ms(60_000),
                &CheckError::NavigationTimeout {
                    url: "https://shop.test/".to_string(),
                    ms: 60_000,
                },
            ))
            .unwrap();
        reporter.finish()
    }

    mod reporter_tests {
        use super::*;

        #[test]
        fn test_collect_all_keeps_going() {
            let report = mixed_report();
            assert_eq!(report.total_count(), 3);
            assert_eq!(report.passed_count(), 1);
            assert_eq!(report.failed_count(), 1);
            assert_eq!(report.errored_count(), 1);
            assert!(!report.all_passed());
            assert_eq!(report.failures().len(), 2);
        }

        #[test]
        fn test_andon_cord_stops_on_failure() {
            let mut reporter = Reporter::new("home").with_failure_mode(FailureMode::AndonCord);
            reporter
                .record(ScenarioRecord::passed("TC01", "a", ms(10)))
                .unwrap();
            let err = reporter
                .record(ScenarioRecord::from_error(
                    "TC02",
                    "b",
                    ms(10),
                    &CheckError::engine("boom"),
                ))
                .unwrap_err();
            assert!(err.to_string().contains("ANDON CORD PULLED"));
            assert_eq!(reporter.records().len(), 2);
        }

        #[test]
        fn test_andon_cord_ignores_pending() {
            let mut reporter = Reporter::new("home").with_failure_mode(FailureMode::AndonCord);
            reporter.record(ScenarioRecord::pending("TC05", "load")).unwrap();
        }

        #[test]
        fn test_summary() {
            let report = mixed_report();
            assert_eq!(
                report.summary(),
                "home: 1/3 passed (33.3%), 1 failed, 1 errored"
            );
        }

        #[test]
        fn test_empty_suite_pass_rate() {
            let report = Reporter::new("empty").finish();
            assert!((report.pass_rate() - 1.0).abs() < f64::EPSILON);
            assert!(report.all_passed());
        }

        #[test]
        fn test_pending_not_passed() {
            let mut reporter = Reporter::new("home");
            reporter.record(ScenarioRecord::pending("TC05", "load")).unwrap();
            let report = reporter.finish();
            assert!(!report.all_passed());
            assert!(report.summary().ends_with("1 not run"));
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_json_has_stats_and_entries() {
            let json = mixed_report().render_json().unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["stats"]["total"], 3);
            assert_eq!(value["stats"]["errored"], 1);
            assert_eq!(value["suite"], "home");
            assert_eq!(value["scenarios"][1]["status"], "failed");
            assert_eq!(value["scenarios"][2]["status"], "errored");
            assert!(value["scenarios"][0].get("error").is_none());
        }

        #[test]
        fn test_json_report_roundtrips() {
            let report = mixed_report();
            let parsed: SuiteReport = serde_json::from_str(&report.render_json().unwrap()).unwrap();
            assert_eq!(parsed, report);
        }

        #[test]
        fn test_html_escapes_text() {
            let html = mixed_report().render_html(Path::new("reports"));
            assert!(html.contains("no suggestions for &lt;@@@&gt;"));
            assert!(html.contains("class=\"scenario error\""));
            assert!(html.contains("Results: 1/3 passed"));
        }

        #[test]
        fn test_html_screenshot_link_is_relative_to_report_dir() {
            let output = ReportOutput::new("reports");
            let mut reporter = Reporter::new("home");
            reporter
                .record(
                    ScenarioRecord::from_error("TC01", "a", ms(4000), &CheckError::assertion("x"))
                        .with_screenshot(output.screenshot_dir().join("TC01.png")),
                )
                .unwrap();
            let html = reporter.finish().render_html(&output.dir);

            assert!(html.contains("href=\"screenshots/TC01.png\""), "{html}");
            assert!(!html.contains("reports/screenshots"));
        }

        #[test]
        fn test_html_keeps_screenshot_outside_report_dir() {
            let mut reporter = Reporter::new("home");
            reporter
                .record(
                    ScenarioRecord::from_error("TC01", "a", ms(1), &CheckError::assertion("x"))
                        .with_screenshot("/var/shots/TC01.png"),
                )
                .unwrap();
            let html = reporter.finish().render_html(Path::new("reports"));
            assert!(html.contains("href=\"/var/shots/TC01.png\""));
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn test_first_report_uses_plain_name() {
            let dir = TempDir::new().unwrap();
            let written = write_reports(&mixed_report(), &ReportOutput::new(dir.path())).unwrap();
            assert_eq!(written, vec![dir.path().join("shopcheck.json")]);
        }

        #[test]
        fn test_reports_are_not_overwritten() {
            let dir = TempDir::new().unwrap();
            let output = ReportOutput::new(dir.path());
            for _ in 0..3 {
                write_reports(&mixed_report(), &output).unwrap();
            }
            assert!(dir.path().join("shopcheck.json").exists());
            assert!(dir.path().join("shopcheck_001.json").exists());
            assert!(dir.path().join("shopcheck_002.json").exists());
        }

        #[test]
        fn test_overwrite_reuses_name() {
            let dir = TempDir::new().unwrap();
            let output = ReportOutput {
                overwrite: true,
                ..ReportOutput::new(dir.path())
            };
            write_reports(&mixed_report(), &output).unwrap();
            let written = write_reports(&mixed_report(), &output).unwrap();
            assert_eq!(written, vec![dir.path().join("shopcheck.json")]);
            assert!(!dir.path().join("shopcheck_001.json").exists());
        }

        #[test]
        fn test_html_shares_number_with_json() {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("shopcheck.html"), "old").unwrap();
            let output = ReportOutput {
                html: true,
                ..ReportOutput::new(dir.path().join("nested"))
            };
            let written = write_reports(&mixed_report(), &output).unwrap();
            assert_eq!(written.len(), 2);

            let output = ReportOutput {
                html: true,
                ..ReportOutput::new(dir.path())
            };
            let written = write_reports(&mixed_report(), &output).unwrap();
            assert_eq!(
                written,
                vec![
                    dir.path().join("shopcheck_001.json"),
                    dir.path().join("shopcheck_001.html")
                ]
            );
        }

        #[test]
        fn test_nothing_enabled() {
            let dir = TempDir::new().unwrap();
            let output = ReportOutput {
                json: false,
                ..ReportOutput::new(dir.path())
            };
            assert!(write_reports(&mixed_report(), &output).unwrap().is_empty());
        }

        proptest! {
            #[test]
            fn prop_next_stem_skips_existing(existing in 0usize..12) {
                let dir = TempDir::new().unwrap();
                std::fs::write(dir.path().join("shopcheck.json"), "{}").unwrap();
                for n in 1..existing {
                    std::fs::write(dir.path().join(format!("shopcheck_{n:03}.json")), "{}").unwrap();
                }
                let stem = next_report_stem(dir.path(), REPORT_STEM, &["json"], false);
                prop_assert_eq!(stem, format!("shopcheck_{:03}", existing.max(1)));
            }
        }
    }
}
