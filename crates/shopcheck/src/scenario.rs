//! Scenarios: one independent check of observable page behaviour.
//!
//! A scenario is a plain declaration (ordered [`Step`]s). Running it is the
//! suite runner's job; this module only knows how to execute a single step
//! against a page model and how a scenario's status may change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::assertion::Expectation;
use crate::driver::BrowserDriver;
use crate::emulation::ViewportProfile;
use crate::locator::LocatorName;
use crate::page_model::PageModel;
use crate::result::{CheckError, CheckResult};
use crate::wait::within_budget;

/// Scenario lifecycle: `Pending -> Running -> {Passed, Failed, Errored}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Declared, not started
    #[default]
    Pending,
    /// Steps executing
    Running,
    /// Every step and assertion held
    Passed,
    /// An assertion did not hold within its wait
    Failed,
    /// The engine failed underneath the scenario
    Errored,
}

impl ScenarioStatus {
    /// Move to `next`, rejecting transitions the lifecycle does not allow
    pub fn transition(self, next: Self) -> CheckResult<Self> {
        let legal = matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Passed | Self::Failed | Self::Errored)
        );
        if legal {
            Ok(next)
        } else {
            Err(CheckError::config(format!(
                "illegal scenario transition {self} -> {next}"
            )))
        }
    }

    /// Terminal status for a finished run
    #[must_use]
    pub fn settle(outcome: Result<(), &CheckError>) -> Self {
        match outcome {
            Ok(()) => Self::Passed,
            Err(e) if e.is_assertion() => Self::Failed,
            Err(_) => Self::Errored,
        }
    }

    /// Check if status is terminal
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Errored)
    }

    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Lowercase label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One action or assertion inside a scenario
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Navigate to the page's canonical URL, or an override
    Visit(Option<String>),
    /// Apply a viewport profile
    Viewport(ViewportProfile),
    /// Type a query into the search box
    Search(String),
    /// Open the category menu
    OpenMenu,
    /// Type text into a named element
    TypeInto {
        /// Target element
        locator: LocatorName,
        /// Text to type
        text: String,
    },
    /// Click a named element
    Click(LocatorName),
    /// Assert something about a named element
    Expect {
        /// Element under test
        locator: LocatorName,
        /// Expected state
        expectation: Expectation,
    },
    /// Navigate and require the page-ready signal strictly inside a budget
    LoadWithin(Duration),
}

impl Step {
    /// Execute the step against the page model
    pub async fn execute<D: BrowserDriver + ?Sized>(
        &self,
        page: &PageModel,
        driver: &mut D,
    ) -> CheckResult<()> {
        match self {
            Self::Visit(url) => page.navigate(driver, url.as_deref()).await,
            Self::Viewport(profile) => driver.set_viewport(profile).await,
            Self::Search(text) => page.search(driver, text).await,
            Self::OpenMenu => page.open_menu(driver).await,
            Self::TypeInto { locator, text } => page.type_into(driver, *locator, text).await,
            Self::Click(locator) => page.click(driver, *locator).await,
            Self::Expect {
                locator,
                expectation,
            } => expectation
                .verify(&*driver, page.locator(*locator), page.wait_options())
                .await
                .map(|_| ()),
            Self::LoadWithin(budget) => {
                let start = Instant::now();
                page.navigate(driver, None).await?;
                driver.wait_for_ready(page.page_load_timeout()).await?;
                let elapsed = start.elapsed();
                info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = budget.as_millis() as u64,
                    "page ready"
                );
                if within_budget(elapsed, *budget) {
                    Ok(())
                } else {
                    Err(CheckError::assertion(format!(
                        "expected page to load in less than {}ms, took {}ms",
                        budget.as_millis(),
                        elapsed.as_millis()
                    )))
                }
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visit(None) => write!(f, "visit"),
            Self::Visit(Some(url)) => write!(f, "visit {url}"),
            Self::Viewport(profile) => write!(f, "viewport {}", profile.name),
            Self::Search(text) => write!(f, "search {text:?}"),
            Self::OpenMenu => write!(f, "open menu"),
            Self::TypeInto { locator, text } => write!(f, "type {text:?} into {locator}"),
            Self::Click(locator) => write!(f, "click {locator}"),
            Self::Expect {
                locator,
                expectation,
            } => write!(f, "expect {locator} {expectation}"),
            Self::LoadWithin(budget) => write!(f, "load within {}ms", budget.as_millis()),
        }
    }
}

/// A named, independent check
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Short identifier (e.g., "TC01")
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Steps in execution order
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Create an empty scenario
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Navigate to the canonical URL again
    #[must_use]
    pub fn visit(self) -> Self {
        self.step(Step::Visit(None))
    }

    /// Apply a viewport profile
    #[must_use]
    pub fn viewport(self, profile: ViewportProfile) -> Self {
        self.step(Step::Viewport(profile))
    }

    /// Search for `text`
    #[must_use]
    pub fn search(self, text: impl Into<String>) -> Self {
        self.step(Step::Search(text.into()))
    }

    /// Open the category menu
    #[must_use]
    pub fn open_menu(self) -> Self {
        self.step(Step::OpenMenu)
    }

    /// Assert an expectation on a locator
    #[must_use]
    pub fn expect(self, locator: LocatorName, expectation: Expectation) -> Self {
        self.step(Step::Expect {
            locator,
            expectation,
        })
    }

    /// Time a fresh navigation against a budget
    #[must_use]
    pub fn load_within(self, budget: Duration) -> Self {
        self.step(Step::LoadWithin(budget))
    }

    /// Display label, "<id> - <title>"
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.id, self.title)
    }

    /// Whether `filter` matches the id or title (case-insensitive)
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        let needle = filter.to_lowercase();
        self.id.to_lowercase().contains(&needle) || self.title.to_lowercase().contains(&needle)
    }
}
