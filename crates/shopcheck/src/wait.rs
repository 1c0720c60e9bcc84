//! Wait mechanisms
//!
//! Every suspension point in a scenario goes through here with an explicit
//! budget. Two shapes exist:
//!
//! - [`wait_for`] returns as soon as the condition holds, or times out.
//! - [`hold`] keeps sampling for the whole window and fails at the first
//!   sample that breaks the condition. A negative check ("never appears")
//!   needs this: one sample cannot tell "absent" from "not there yet".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::driver::BrowserDriver;
use crate::locator::Selector;
use crate::result::CheckResult;

/// Default timeout for element waits (4 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 4_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default page-load budget (60 seconds)
pub const DEFAULT_PAGE_LOAD_TIMEOUT_MS: u64 = 60_000;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration, never zero
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Element state a wait can look for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// At least one match is rendered visibly
    Visible,
    /// At least one match is in the DOM
    Exists,
    /// No match in the DOM
    Absent,
}

impl Condition {
    /// Sample the condition once
    pub async fn check<D: BrowserDriver + ?Sized>(
        self,
        driver: &D,
        selector: &Selector,
    ) -> CheckResult<bool> {
        Ok(match self {
            Self::Visible => driver.is_visible(selector).await?,
            Self::Exists => driver.count(selector).await? > 0,
            Self::Absent => driver.count(selector).await? == 0,
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Visible => "visible",
            Self::Exists => "present",
            Self::Absent => "absent",
        })
    }
}

/// Result of a wait operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Whether the wait was successful
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of samples taken
    pub samples: u32,
}

impl WaitResult {
    /// Create a successful wait result
    #[must_use]
    pub const fn success(elapsed: Duration, samples: u32) -> Self {
        Self {
            success: true,
            elapsed,
            samples,
        }
    }

    /// Create an unsuccessful wait result
    #[must_use]
    pub const fn failure(elapsed: Duration, samples: u32) -> Self {
        Self {
            success: false,
            elapsed,
            samples,
        }
    }
}

/// Sample once, bounded by the deadline.
///
/// A sample taken at or past the deadline still gets one poll interval to
/// answer. `None` means the driver did not answer in time.
async fn sample<D: BrowserDriver + ?Sized>(
    driver: &D,
    selector: &Selector,
    condition: Condition,
    deadline: Instant,
    options: &WaitOptions,
) -> CheckResult<Option<bool>> {
    let bound = deadline.max(Instant::now() + options.poll_interval());
    match tokio::time::timeout_at(bound, condition.check(driver, selector)).await {
        Ok(answer) => answer.map(Some),
        Err(_) => {
            debug!(%selector, %condition, "driver did not answer before deadline");
            Ok(None)
        }
    }
}

/// Poll until `condition` holds for `selector` or the timeout elapses.
///
/// The condition is always sampled once more at the deadline, so a zero
/// timeout still gives one sample. A sample the driver does not answer in
/// time counts as a miss. Driver errors propagate immediately.
pub async fn wait_for<D: BrowserDriver + ?Sized>(
    driver: &D,
    selector: &Selector,
    condition: Condition,
    options: &WaitOptions,
) -> CheckResult<WaitResult> {
    let start = Instant::now();
    let deadline = start + options.timeout();
    let mut samples = 0;

    loop {
        samples += 1;
        match sample(driver, selector, condition, deadline, options).await? {
            Some(true) => {
                debug!(%selector, %condition, samples, "condition met");
                return Ok(WaitResult::success(start.elapsed(), samples));
            }
            Some(false) => {}
            None => return Ok(WaitResult::failure(start.elapsed(), samples)),
        }
        let now = Instant::now();
        if now >= deadline {
            debug!(%selector, %condition, samples, "condition not met before deadline");
            return Ok(WaitResult::failure(start.elapsed(), samples));
        }
        tokio::time::sleep_until((now + options.poll_interval()).min(deadline)).await;
    }
}

/// Sample `condition` for the whole window; fail at the first broken sample.
///
/// A sample the driver does not answer in time fails the hold: the
/// condition could not be confirmed.
pub async fn hold<D: BrowserDriver + ?Sized>(
    driver: &D,
    selector: &Selector,
    condition: Condition,
    options: &WaitOptions,
) -> CheckResult<WaitResult> {
    let start = Instant::now();
    let deadline = start + options.timeout();
    let mut samples = 0;

    loop {
        samples += 1;
        if sample(driver, selector, condition, deadline, options).await? != Some(true) {
            debug!(%selector, %condition, samples, "condition broke inside hold window");
            return Ok(WaitResult::failure(start.elapsed(), samples));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(WaitResult::success(start.elapsed(), samples));
        }
        tokio::time::sleep_until((now + options.poll_interval()).min(deadline)).await;
    }
}

/// Strict budget comparison: exactly on budget is over budget.
#[must_use]
pub fn within_budget(elapsed: Duration, budget: Duration) -> bool {
    elapsed < budget
}
