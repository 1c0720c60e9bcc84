//! shopcheck: page-model end-to-end checks for a live storefront
//!
//! Drives Chromium over CDP (feature `browser`), keeps every selector behind a
//! [`PageModel`], and runs independent scenarios one after another against a
//! single browser session.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌───────────────┐    ┌──────────┐
//! │ ScenarioSuite│───►│ SuiteRunner  │───►│  PageModel    │───►│ Browser  │
//! │ (TC01..TC05, │    │ before-each: │    │  locators +   │    │ Driver   │
//! │  or YAML)    │    │ viewport,    │    │  actions      │    │ (CDP or  │
//! └──────────────┘    │ navigate     │    └───────────────┘    │  mock)   │
//!                     └──────┬───────┘                         └──────────┘
//!                            ▼
//!                     ┌──────────────┐
//!                     │ Reporter     │  shopcheck.json / .html
//!                     └──────────────┘
//! ```
//!
//! Every suspension point (navigation, element resolution, expectation) has
//! an explicit budget from [`WaitOptions`] or the page-load timeout.

#![warn(missing_docs)]

mod assertion;
#[cfg(feature = "browser")]
mod browser;
mod config;
mod driver;
mod emulation;
mod locator;
mod page_model;
mod reporter;
mod result;
mod scenario;
mod suite;
mod wait;

#[cfg(test)]
mod fixtures;

pub use assertion::Expectation;
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use config::{
    BrowserConfig, ReportConfig, SuiteConfig, WaitConfig, DEFAULT_BASE_URL, DEFAULT_CONFIG_FILE,
    ENV_BASE_URL, ENV_CHROMIUM_PATH, ENV_REPORT_DIR,
};
pub use driver::{BrowserDriver, MockDriver, Reaction, Trigger};
pub use emulation::{presets, Viewport, ViewportProfile, DEFAULT_PROFILE};
pub use locator::{Locator, LocatorName, Selector};
pub use page_model::{home_page, home_page_builder, PageModel, PageModelBuilder};
pub use reporter::{
    next_report_stem, write_reports, FailureMode, ReportOutput, ReportStats, Reporter,
    ScenarioRecord, SuiteReport, REPORT_STEM,
};
pub use result::{CheckError, CheckResult};
pub use scenario::{Scenario, ScenarioStatus, Step};
pub use suite::{RunEvent, RunnerConfig, ScenarioSuite, SuiteRunner, DEFAULT_LOAD_BUDGET_MS};
pub use wait::{
    hold, wait_for, within_budget, Condition, WaitOptions, WaitResult, DEFAULT_PAGE_LOAD_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        home_page, BrowserDriver, CheckError, CheckResult, Expectation, FailureMode, LocatorName,
        PageModel, Scenario, ScenarioStatus, ScenarioSuite, SuiteConfig, SuiteReport, SuiteRunner,
        ViewportProfile, WaitOptions,
    };

    #[cfg(feature = "browser")]
    pub use super::ChromiumDriver;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_builds_storefront() {
        let page = home_page("https://shop.test").unwrap();
        let suite = ScenarioSuite::storefront(std::time::Duration::from_secs(3)).unwrap();
        assert_eq!(page.locators().count(), LocatorName::ALL.len());
        assert_eq!(suite.len(), 5);
    }
}
