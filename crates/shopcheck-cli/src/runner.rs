//! Suite execution for the `run`, `list` and `viewports` commands

use shopcheck::{
    presets, write_reports, BrowserDriver, FailureMode, RunEvent, ScenarioStatus, ScenarioSuite,
    SuiteConfig, SuiteReport, SuiteRunner,
};
use std::path::Path;
use tracing::{info, warn};

use crate::commands::{ListArgs, RunArgs, ViewportsArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// Resolve configuration: file and environment, then command-line flags
pub fn resolve_config(args: &RunArgs) -> CliResult<SuiteConfig> {
    let mut config = SuiteConfig::load(args.config.as_deref())?;

    if let Some(ref url) = args.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(ref dir) = args.report_dir {
        config.report.dir.clone_from(dir);
    }
    if args.headed {
        config.browser.headless = false;
    }
    if args.no_sandbox {
        config.browser.sandbox = false;
    }
    if args.overwrite {
        config.report.overwrite = true;
    }
    if args.html {
        config.report.html = true;
    }

    config.validate()?;
    Ok(config)
}

/// Built-in suite, or the YAML file at `path`
pub fn load_suite(path: Option<&Path>, config: &SuiteConfig) -> CliResult<ScenarioSuite> {
    let suite = match path {
        Some(p) => ScenarioSuite::from_yaml_file(p)?,
        None => ScenarioSuite::storefront(config.load_budget())?,
    };
    Ok(suite)
}

/// Runs the suite and reports progress on the terminal
#[derive(Debug)]
pub struct CheckRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl CheckRunner {
    /// Create a new runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Get the CLI configuration
    #[must_use]
    pub const fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Get the reporter (for testing)
    #[must_use]
    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }

    /// `shopcheck run`
    ///
    /// # Errors
    ///
    /// Returns `ChecksFailed` when the suite ran but not every scenario
    /// passed, and other variants when it could not run at all.
    pub async fn run(&mut self, args: &RunArgs) -> CliResult<SuiteReport> {
        let config = resolve_config(args)?;
        let mut suite = load_suite(args.suite.as_deref(), &config)?;
        if let Some(ref filter) = args.filter {
            suite = suite.filter(filter);
            if suite.is_empty() {
                return Err(CliError::invalid_argument(format!(
                    "no scenario matches '{filter}'"
                )));
            }
        }

        let page = config.page_model()?;
        let failure_mode = if args.fail_fast {
            FailureMode::AndonCord
        } else {
            FailureMode::CollectAll
        };
        let runner = SuiteRunner::with_config(config.runner_config(failure_mode)?);

        let mut driver = launch_driver(&config).await?;

        self.reporter
            .header(&format!("{} ({})", suite.name, config.base_url));
        self.reporter
            .start_progress(suite.len() as u64, "Starting...");

        let reporter = &self.reporter;
        let show_steps = self.config.verbosity.is_verbose();
        let report = runner
            .run_observed(&suite, &page, driver.as_mut(), |event| match event {
                RunEvent::Started(scenario) => {
                    reporter.set_message(&scenario.label());
                    if show_steps {
                        for step in &scenario.steps {
                            reporter.info(&format!("{}: {step}", scenario.id));
                        }
                    }
                }
                RunEvent::Finished(record) => {
                    reporter.record(record);
                    reporter.increment(1);
                }
            })
            .await;
        self.reporter.finish();

        if let Err(e) = driver.close().await {
            warn!(error = %e, "browser close failed");
            self.reporter.warning(&format!("browser did not close cleanly: {e}"));
        }

        for record in report
            .scenarios
            .iter()
            .filter(|r| r.status == ScenarioStatus::Pending)
        {
            self.reporter.record(record);
        }

        for path in write_reports(&report, &config.report_output())? {
            self.reporter.info(&format!("report: {}", path.display()));
        }
        self.reporter.summary(&report);
        info!(summary = %report.summary(), "run complete");

        if report.all_passed() {
            Ok(report)
        } else {
            Err(CliError::ChecksFailed {
                failed: report.total_count() - report.passed_count(),
                total: report.total_count(),
            })
        }
    }
}

#[cfg(feature = "browser")]
async fn launch_driver(config: &SuiteConfig) -> CliResult<Box<dyn BrowserDriver>> {
    let driver = shopcheck::ChromiumDriver::launch(&config.browser).await?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "browser"))]
#[allow(clippy::unused_async)]
async fn launch_driver(_config: &SuiteConfig) -> CliResult<Box<dyn BrowserDriver>> {
    Err(CliError::config(
        "built without the `browser` feature; rebuild with --features browser",
    ))
}

/// `shopcheck list`: scenario ids and titles
pub fn list_text(args: &ListArgs) -> CliResult<String> {
    let suite = load_suite(args.suite.as_deref(), &SuiteConfig::default())?;

    if args.json {
        let scenarios: Vec<serde_json::Value> = suite
            .scenarios
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "title": s.title,
                    "steps": s.steps.iter().map(ToString::to_string).collect::<Vec<_>>(),
                })
            })
            .collect();
        let doc = serde_json::json!({ "suite": suite.name, "scenarios": scenarios });
        return serde_json::to_string_pretty(&doc).map_err(|e| CliError::Check(e.into()));
    }

    let mut out = format!("{}\n", suite.name);
    for scenario in &suite.scenarios {
        out.push_str(&format!("  {:<6} {}\n", scenario.id, scenario.title));
    }
    out.push_str(&format!("{} scenarios\n", suite.len()));
    Ok(out)
}

/// `shopcheck viewports`: the preset table
pub fn viewports_text(args: &ViewportsArgs) -> CliResult<String> {
    let profiles = presets();

    if args.json {
        return serde_json::to_string_pretty(&profiles).map_err(|e| CliError::Check(e.into()));
    }

    let mut out = format!("{:<14} {:>10} {:>6}  {}\n", "NAME", "SIZE", "SCALE", "KIND");
    for p in &profiles {
        out.push_str(&format!(
            "{:<14} {:>10} {:>6.1}  {}\n",
            p.name,
            p.viewport.to_string(),
            p.device_scale_factor,
            if p.is_mobile { "mobile" } else { "desktop" }
        ));
    }
    Ok(out)
}
