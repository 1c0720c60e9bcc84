//! Scenario suites and the sequential runner.
//!
//! A suite comes from [`ScenarioSuite::storefront`] or from a YAML file. YAML
//! names (locators, viewports, expectations) are checked while loading, so a
//! typo fails before any browser starts.
//!
//! [`SuiteRunner`] executes scenarios one after another on a single driver.
//! Before each scenario it resets the viewport and navigates to the page, so
//! scenarios never see each other's state.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::assertion::Expectation;
use crate::driver::BrowserDriver;
use crate::emulation::ViewportProfile;
use crate::locator::LocatorName;
use crate::page_model::PageModel;
use crate::reporter::{FailureMode, Reporter, ScenarioRecord, SuiteReport};
use crate::result::{CheckError, CheckResult};
use crate::scenario::{Scenario, ScenarioStatus, Step};

/// Default load budget for the page-load scenario (3 seconds, strict)
pub const DEFAULT_LOAD_BUDGET_MS: u64 = 3_000;

/// An ordered collection of independent scenarios
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSuite {
    /// Suite name
    pub name: String,
    /// Scenarios in execution order
    pub scenarios: Vec<Scenario>,
}

impl ScenarioSuite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    /// Add a scenario
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Get the number of scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Check if the suite has no scenarios
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// The storefront home page checks
    pub fn storefront(load_budget: Duration) -> CheckResult<Self> {
        let phone = ViewportProfile::named("iphone-x")?;
        Ok(Self::new("storefront home page")
            .with_scenario(
                Scenario::new("TC01", "shows suggestions while typing 'iphone'")
                    .search("iphone")
                    .expect(LocatorName::SearchSuggestions, Expectation::BeVisible),
            )
            .with_scenario(
                Scenario::new("TC02", "shows no suggestions for an invalid query")
                    .search("@@@")
                    .expect(LocatorName::SearchSuggestions, Expectation::NotExist),
            )
            .with_scenario(
                Scenario::new("TC03", "menu opens and lists categories")
                    .open_menu()
                    .expect(LocatorName::MenuVisible, Expectation::Exist),
            )
            .with_scenario(
                Scenario::new("TC04", "menu works on a mobile viewport")
                    .viewport(phone)
                    .visit()
                    .open_menu()
                    .expect(LocatorName::MenuVisible, Expectation::Exist),
            )
            .with_scenario(
                Scenario::new(
                    "TC05",
                    format!("page loads in under {}s", load_budget.as_secs_f64()),
                )
                .load_within(load_budget),
            ))
    }

    /// Parse a suite from YAML.
    ///
    /// Steps are single-key maps (`- search: iphone`), or a bare name for
    /// steps without arguments (`- open_menu`).
    pub fn from_yaml_str(yaml: &str) -> CheckResult<Self> {
        let file: SuiteFile = serde_yaml_ng::with::singleton_map_recursive::deserialize(
            serde_yaml_ng::Deserializer::from_str(yaml),
        )?;
        file.try_into()
    }

    /// Load a suite from a YAML file
    pub fn from_yaml_file(path: &Path) -> CheckResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Scenarios whose id or title contains `text` (case-insensitive)
    #[must_use]
    pub fn filter(&self, text: &str) -> Self {
        Self {
            name: self.name.clone(),
            scenarios: self
                .scenarios
                .iter()
                .filter(|s| s.matches(text))
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    name: String,
    scenarios: Vec<ScenarioFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    id: String,
    title: String,
    steps: Vec<StepFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
enum StepFile {
    Visit(Option<String>),
    Viewport(String),
    Search(String),
    OpenMenu,
    Type { locator: String, text: String },
    Click(String),
    Expect { locator: String, to: String },
    LoadWithinMs(u64),
}

impl TryFrom<StepFile> for Step {
    type Error = CheckError;

    fn try_from(step: StepFile) -> CheckResult<Self> {
        Ok(match step {
            StepFile::Visit(url) => Self::Visit(url),
            StepFile::Viewport(name) => Self::Viewport(ViewportProfile::named(&name)?),
            StepFile::Search(text) => Self::Search(text),
            StepFile::OpenMenu => Self::OpenMenu,
            StepFile::Type { locator, text } => Self::TypeInto {
                locator: locator.parse()?,
                text,
            },
            StepFile::Click(locator) => Self::Click(locator.parse()?),
            StepFile::Expect { locator, to } => Self::Expect {
                locator: locator.parse()?,
                expectation: to.parse()?,
            },
            StepFile::LoadWithinMs(ms) => Self::LoadWithin(Duration::from_millis(ms)),
        })
    }
}

impl TryFrom<SuiteFile> for ScenarioSuite {
    type Error = CheckError;

    fn try_from(file: SuiteFile) -> CheckResult<Self> {
        let mut seen = HashSet::new();
        let mut suite = Self::new(file.name);
        for raw in file.scenarios {
            if raw.id.trim().is_empty()
                || raw.id.contains(['/', '\\'])
                || raw.id.contains("..")
            {
                return Err(CheckError::config(format!(
                    "scenario id '{}' must be a non-empty name without path separators",
                    raw.id
                )));
            }
            if !seen.insert(raw.id.clone()) {
                return Err(CheckError::config(format!(
                    "duplicate scenario id '{}'",
                    raw.id
                )));
            }
            let mut scenario = Scenario::new(raw.id, raw.title);
            for step in raw.steps {
                scenario = scenario.step(step.try_into()?);
            }
            suite.scenarios.push(scenario);
        }
        Ok(suite)
    }
}

/// Runner settings
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Viewport applied before every scenario
    pub default_viewport: ViewportProfile,
    /// What to do after a scenario does not pass
    pub failure_mode: FailureMode,
    /// Where failure screenshots go; `None` disables them
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_viewport: ViewportProfile::default_desktop(),
            failure_mode: FailureMode::CollectAll,
            screenshot_dir: None,
        }
    }
}

/// Progress notifications emitted while a suite runs
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'a> {
    /// Scenario about to start
    Started(&'a Scenario),
    /// Scenario finished
    Finished(&'a ScenarioRecord),
}

/// Sequential suite runner
#[derive(Debug, Clone, Default)]
pub struct SuiteRunner {
    config: RunnerConfig,
}

impl SuiteRunner {
    /// Create a runner with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner from settings
    #[must_use]
    pub const fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Runner settings
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every scenario once, in order
    pub async fn run<D: BrowserDriver + ?Sized>(
        &self,
        suite: &ScenarioSuite,
        page: &PageModel,
        driver: &mut D,
    ) -> SuiteReport {
        self.run_observed(suite, page, driver, |_| {}).await
    }

    /// Run every scenario once, reporting progress to `observe`
    pub async fn run_observed<D, F>(
        &self,
        suite: &ScenarioSuite,
        page: &PageModel,
        driver: &mut D,
        mut observe: F,
    ) -> SuiteReport
    where
        D: BrowserDriver + ?Sized,
        F: FnMut(RunEvent<'_>),
    {
        info!(suite = %suite.name, scenarios = suite.len(), page = page.name(), "suite started");
        let mut reporter = Reporter::new(suite.name.clone())
            .with_failure_mode(self.config.failure_mode)
            .with_base_url(page.base_url());

        for (index, scenario) in suite.scenarios.iter().enumerate() {
            observe(RunEvent::Started(scenario));
            let record = self.run_scenario(scenario, page, driver).await;
            observe(RunEvent::Finished(&record));

            if let Err(stop) = reporter.record(record) {
                warn!(%stop, "stopping suite");
                for rest in &suite.scenarios[index + 1..] {
                    reporter.skip(&rest.id, &rest.title);
                }
                break;
            }
        }

        let report = reporter.finish();
        info!(summary = %report.summary(), "suite finished");
        report
    }

    async fn run_scenario<D: BrowserDriver + ?Sized>(
        &self,
        scenario: &Scenario,
        page: &PageModel,
        driver: &mut D,
    ) -> ScenarioRecord {
        let start = Instant::now();
        let (status, outcome) = self.advance(scenario, page, driver).await;
        let elapsed = start.elapsed();

        let record = ScenarioRecord::settled(
            &scenario.id,
            &scenario.title,
            status,
            elapsed,
            outcome.as_ref().err(),
        );
        if status.is_passed() {
            info!(id = %scenario.id, elapsed_ms = elapsed.as_millis() as u64, "scenario passed");
            return record;
        }

        warn!(id = %scenario.id, %status, error = ?record.error, "scenario did not pass");
        match self.capture(scenario, driver).await {
            Some(path) => record.with_screenshot(path),
            None => record,
        }
    }

    /// Walk the lifecycle: `Pending -> Running`, execute, then `Running` to
    /// the terminal status the outcome settles on.
    async fn advance<D: BrowserDriver + ?Sized>(
        &self,
        scenario: &Scenario,
        page: &PageModel,
        driver: &mut D,
    ) -> (ScenarioStatus, CheckResult<()>) {
        let running = match ScenarioStatus::Pending.transition(ScenarioStatus::Running) {
            Ok(status) => status,
            Err(e) => return (ScenarioStatus::Errored, Err(e)),
        };
        info!(id = %scenario.id, title = %scenario.title, status = %running, "scenario started");

        let outcome = self.execute(scenario, page, driver).await;
        match running.transition(ScenarioStatus::settle(outcome.as_ref().map(|_| ()))) {
            Ok(terminal) => (terminal, outcome),
            Err(e) => (ScenarioStatus::Errored, Err(e)),
        }
    }

    async fn execute<D: BrowserDriver + ?Sized>(
        &self,
        scenario: &Scenario,
        page: &PageModel,
        driver: &mut D,
    ) -> CheckResult<()> {
        driver.set_viewport(&self.config.default_viewport).await?;
        page.navigate(driver, None).await?;

        for step in &scenario.steps {
            debug!(id = %scenario.id, %step, "step");
            step.execute(page, driver).await?;
        }
        Ok(())
    }

    /// Failure screenshot; capture problems are logged and swallowed
    async fn capture<D: BrowserDriver + ?Sized>(
        &self,
        scenario: &Scenario,
        driver: &D,
    ) -> Option<PathBuf> {
        let dir = self.config.screenshot_dir.as_ref()?;
        let path = dir.join(format!("{}.png", scenario.id));

        let saved = async {
            let png = driver.screenshot().await?;
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, png).await?;
            CheckResult::Ok(())
        }
        .await;

        match saved {
            Ok(()) => {
                info!(id = %scenario.id, path = %path.display(), "failure screenshot saved");
                Some(path)
            }
            Err(e) => {
                warn!(id = %scenario.id, error = %e, "failure screenshot not captured");
                None
            }
        }
    }
}
