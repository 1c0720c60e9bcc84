//! Expectations against locators.
//!
//! Positive expectations pass as soon as the condition shows up inside the
//! wait window. `NotExist` holds for the whole window.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::driver::BrowserDriver;
use crate::locator::Locator;
use crate::result::{CheckError, CheckResult};
use crate::wait::{hold, wait_for, Condition, WaitOptions, WaitResult};

/// What a scenario expects of a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expectation {
    /// At least one match rendered visibly
    #[serde(rename = "be.visible")]
    BeVisible,
    /// At least one match in the document
    #[serde(rename = "exist")]
    Exist,
    /// No match in the document for the whole window
    #[serde(rename = "not.exist")]
    NotExist,
}

impl Expectation {
    /// Chainer name used in scenario files and reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BeVisible => "be.visible",
            Self::Exist => "exist",
            Self::NotExist => "not.exist",
        }
    }

    /// Check the expectation against the live page.
    ///
    /// Returns the wait outcome on success and `AssertionFailed` otherwise.
    pub async fn verify<D: BrowserDriver + ?Sized>(
        self,
        driver: &D,
        locator: &Locator,
        options: &WaitOptions,
    ) -> CheckResult<WaitResult> {
        let selector = locator.selector();
        let result = match self {
            Self::BeVisible => wait_for(driver, selector, Condition::Visible, options).await?,
            Self::Exist => wait_for(driver, selector, Condition::Exists, options).await?,
            Self::NotExist => hold(driver, selector, Condition::Absent, options).await?,
        };

        if result.success {
            info!(
                locator = %locator.name(),
                expectation = self.as_str(),
                elapsed_ms = result.elapsed.as_millis() as u64,
                "expectation met"
            );
            Ok(result)
        } else {
            debug!(locator = %locator.name(), expectation = self.as_str(), samples = result.samples, "expectation failed");
            Err(CheckError::assertion(self.failure_message(locator, &result, options)))
        }
    }

    fn failure_message(&self, locator: &Locator, result: &WaitResult, options: &WaitOptions) -> String {
        match self {
            Self::NotExist => format!(
                "expected {locator} not to exist, but it appeared after {}ms",
                result.elapsed.as_millis()
            ),
            _ => format!(
                "expected {locator} to {} within {}ms",
                self.as_str().replace('.', " "),
                options.timeout_ms
            ),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expectation {
    type Err = CheckError;

    fn from_str(s: &str) -> CheckResult<Self> {
        match s {
            "be.visible" => Ok(Self::BeVisible),
            "exist" => Ok(Self::Exist),
            "not.exist" => Ok(Self::NotExist),
            other => Err(CheckError::config(format!(
                "unknown expectation '{other}' (expected be.visible, exist or not.exist)"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, Reaction};
    use crate::locator::{LocatorName, Selector};
    use std::time::Duration;

    fn suggestions() -> Locator {
        Locator::new(LocatorName::SearchSuggestions, ".s-suggestion-container")
    }

    #[test]
    fn test_parse_chainers() {
        for exp in [Expectation::BeVisible, Expectation::Exist, Expectation::NotExist] {
            assert_eq!(exp.as_str().parse::<Expectation>().unwrap(), exp);
        }
        assert!("be.hidden".parse::<Expectation>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_be_visible_passes() {
        let driver = MockDriver::new().with_element(".s-suggestion-container", true);
        let result = Expectation::BeVisible
            .verify(&driver, &suggestions(), &WaitOptions::new())
            .await
            .unwrap();
        assert!(result.success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_be_visible_fails_with_assertion() {
        let driver = MockDriver::new().with_element(".s-suggestion-container", false);
        let err = Expectation::BeVisible
            .verify(&driver, &suggestions(), &WaitOptions::new().with_timeout(300))
            .await
            .unwrap_err();
        assert!(err.is_assertion());
        let msg = err.to_string();
        assert!(msg.contains("search-suggestions"));
        assert!(msg.contains("be visible within 300ms"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_exist_detects_late_element() {
        let mut driver = MockDriver::new().with_element("#q", true).with_reaction(
            Reaction::on_type("#q", "@@@")
                .reveal(".s-suggestion-container")
                .after(Duration::from_millis(2_500)),
        );
        driver.type_text(&Selector::css("#q"), "@@@").await.unwrap();

        let err = Expectation::NotExist
            .verify(&driver, &suggestions(), &WaitOptions::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("appeared after 2500ms"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_exist_passes_on_empty_page() {
        let driver = MockDriver::new();
        let result = Expectation::NotExist
            .verify(&driver, &suggestions(), &WaitOptions::new())
            .await
            .unwrap();
        assert_eq!(result.elapsed, Duration::from_millis(4_000));
    }
}
