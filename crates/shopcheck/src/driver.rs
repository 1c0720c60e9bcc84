//! Browser driver seam
//!
//! Everything shopcheck asks of the automation engine goes through
//! [`BrowserDriver`]. The real implementation talks CDP to Chromium
//! (see `browser.rs`, feature `browser`); [`MockDriver`] is an in-memory
//! page used by the unit tests.
//!
//! Drivers answer point-in-time questions only (`count`, `is_visible`).
//! Waiting and retrying live in `wait.rs`, so every suspension point has an
//! explicit budget chosen by the caller.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::emulation::ViewportProfile;
use crate::locator::Selector;
use crate::result::{CheckError, CheckResult};

/// PNG signature returned by the mock screenshot
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Abstract driver trait for browser automation
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate to URL, returning once the engine reports the navigation
    /// committed or `timeout` elapses
    async fn navigate(&mut self, url: &str, timeout: Duration) -> CheckResult<()>;

    /// Wait for the page-ready signal (`document.readyState == "complete"`)
    async fn wait_for_ready(&self, timeout: Duration) -> CheckResult<()>;

    /// Apply a viewport profile to the current page
    async fn set_viewport(&mut self, profile: &ViewportProfile) -> CheckResult<()>;

    /// Number of elements matching the selector right now
    async fn count(&self, selector: &Selector) -> CheckResult<usize>;

    /// Whether any element matching the selector is rendered visibly right now
    async fn is_visible(&self, selector: &Selector) -> CheckResult<bool>;

    /// Type text into the first matching element
    async fn type_text(&mut self, selector: &Selector, text: &str) -> CheckResult<()>;

    /// Click the first matching element
    async fn click(&mut self, selector: &Selector) -> CheckResult<()>;

    /// Get current URL
    async fn current_url(&self) -> CheckResult<String>;

    /// Capture a PNG of the viewport
    async fn screenshot(&self) -> CheckResult<Vec<u8>>;

    /// Close the browser
    async fn close(&mut self) -> CheckResult<()>;
}

/// What makes a scripted reaction fire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Text typed into `selector` contains `contains`
    Typed {
        /// CSS selector of the input
        selector: String,
        /// Substring the typed text must contain
        contains: String,
    },
    /// `selector` was clicked
    Clicked {
        /// CSS selector of the clicked element
        selector: String,
    },
}

/// An element that shows up on the mock page after a trigger
#[derive(Debug, Clone)]
pub struct Reaction {
    trigger: Trigger,
    reveal: String,
    visible: bool,
    delay: Duration,
}

impl Reaction {
    /// React to typing into `selector`
    #[must_use]
    pub fn on_type(selector: impl Into<String>, contains: impl Into<String>) -> Self {
        Self::new(Trigger::Typed {
            selector: selector.into(),
            contains: contains.into(),
        })
    }

    /// React to a click on `selector`
    #[must_use]
    pub fn on_click(selector: impl Into<String>) -> Self {
        Self::new(Trigger::Clicked {
            selector: selector.into(),
        })
    }

    fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            reveal: String::new(),
            visible: true,
            delay: Duration::ZERO,
        }
    }

    /// Element (CSS selector) added to the page
    #[must_use]
    pub fn reveal(mut self, selector: impl Into<String>) -> Self {
        self.reveal = selector.into();
        self
    }

    /// Add the element hidden (present in the DOM, not rendered)
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Delay between the trigger and the element appearing
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
struct PendingElement {
    selector: String,
    visible: bool,
    at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct MockElement {
    count: usize,
    visible: bool,
}

/// Mock driver for unit testing
///
/// Holds a fixture page (restored on every navigation), scripted reactions,
/// and latencies driven by tokio's clock so tests can run with paused time.
#[derive(Debug, Default)]
pub struct MockDriver {
    fixture: HashMap<String, MockElement>,
    reactions: Vec<Reaction>,
    pending: Vec<PendingElement>,
    navigation_latency: Duration,
    ready_latency: Duration,
    query_latency: Duration,
    navigation_error: Option<String>,
    current_url: String,
    viewport: Option<ViewportProfile>,
    call_history: Vec<String>,
}

impl MockDriver {
    /// Create new mock driver with an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single element to the fixture page
    #[must_use]
    pub fn with_element(self, selector: impl Into<String>, visible: bool) -> Self {
        self.with_elements(selector, 1, visible)
    }

    /// Add `count` elements matching `selector` to the fixture page
    #[must_use]
    pub fn with_elements(mut self, selector: impl Into<String>, count: usize, visible: bool) -> Self {
        let _ = self
            .fixture
            .insert(selector.into(), MockElement { count, visible });
        self
    }

    /// Script a reaction
    #[must_use]
    pub fn with_reaction(mut self, reaction: Reaction) -> Self {
        self.reactions.push(reaction);
        self
    }

    /// Time `navigate` takes before it returns
    #[must_use]
    pub const fn with_navigation_latency(mut self, latency: Duration) -> Self {
        self.navigation_latency = latency;
        self
    }

    /// Time between navigation and the page-ready signal
    #[must_use]
    pub const fn with_ready_latency(mut self, latency: Duration) -> Self {
        self.ready_latency = latency;
        self
    }

    /// Time `count` and `is_visible` take to answer
    #[must_use]
    pub const fn with_query_latency(mut self, latency: Duration) -> Self {
        self.query_latency = latency;
        self
    }

    /// Make every navigation fail with an engine error
    #[must_use]
    pub fn with_navigation_error(mut self, message: impl Into<String>) -> Self {
        self.navigation_error = Some(message.into());
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// Viewport applied last, if any
    #[must_use]
    pub const fn viewport(&self) -> Option<&ViewportProfile> {
        self.viewport.as_ref()
    }

    fn lookup(&self, selector: &Selector) -> (usize, bool) {
        let css = selector.to_css();
        let now = Instant::now();
        let (mut count, mut visible) = self
            .fixture
            .get(&css)
            .map_or((0, false), |e| (e.count, e.count > 0 && e.visible));
        for pending in self.pending.iter().filter(|p| p.selector == css && p.at <= now) {
            count += 1;
            visible |= pending.visible;
        }
        (count, visible)
    }

    async fn answer_delay(&self) {
        if !self.query_latency.is_zero() {
            tokio::time::sleep(self.query_latency).await;
        }
    }

    fn require(&self, selector: &Selector) -> CheckResult<()> {
        if self.lookup(selector).0 == 0 {
            return Err(CheckError::engine(format!(
                "no node found for selector {selector}"
            )));
        }
        Ok(())
    }

    fn fire(&mut self, event: &Trigger) {
        let now = Instant::now();
        for reaction in &self.reactions {
            let matched = match (&reaction.trigger, event) {
                (
                    Trigger::Typed { selector, contains },
                    Trigger::Typed {
                        selector: typed_into,
                        contains: text,
                    },
                ) => selector == typed_into && text.contains(contains.as_str()),
                (Trigger::Clicked { selector }, Trigger::Clicked { selector: clicked }) => {
                    selector == clicked
                }
                _ => false,
            };
            if matched {
                self.pending.push(PendingElement {
                    selector: reaction.reveal.clone(),
                    visible: reaction.visible,
                    at: now + reaction.delay,
                });
            }
        }
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> CheckResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        if let Some(ref message) = self.navigation_error {
            return Err(CheckError::engine(message.clone()));
        }
        if tokio::time::timeout(timeout, tokio::time::sleep(self.navigation_latency))
            .await
            .is_err()
        {
            return Err(CheckError::NavigationTimeout {
                url: url.to_string(),
                ms: timeout.as_millis() as u64,
            });
        }
        self.pending.clear();
        self.current_url = url.to_string();
        Ok(())
    }

    async fn wait_for_ready(&self, timeout: Duration) -> CheckResult<()> {
        if tokio::time::timeout(timeout, tokio::time::sleep(self.ready_latency))
            .await
            .is_err()
        {
            return Err(CheckError::NavigationTimeout {
                url: self.current_url.clone(),
                ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn set_viewport(&mut self, profile: &ViewportProfile) -> CheckResult<()> {
        self.call_history.push(format!("viewport:{}", profile.name));
        self.viewport = Some(profile.clone());
        Ok(())
    }

    async fn count(&self, selector: &Selector) -> CheckResult<usize> {
        self.answer_delay().await;
        Ok(self.lookup(selector).0)
    }

    async fn is_visible(&self, selector: &Selector) -> CheckResult<bool> {
        self.answer_delay().await;
        Ok(self.lookup(selector).1)
    }

    async fn type_text(&mut self, selector: &Selector, text: &str) -> CheckResult<()> {
        self.require(selector)?;
        self.call_history.push(format!("type:{selector}:{text}"));
        self.fire(&Trigger::Typed {
            selector: selector.to_css(),
            contains: text.to_string(),
        });
        Ok(())
    }

    async fn click(&mut self, selector: &Selector) -> CheckResult<()> {
        self.require(selector)?;
        self.call_history.push(format!("click:{selector}"));
        self.fire(&Trigger::Clicked {
            selector: selector.to_css(),
        });
        Ok(())
    }

    async fn current_url(&self) -> CheckResult<String> {
        Ok(self.current_url.clone())
    }

    async fn screenshot(&self) -> CheckResult<Vec<u8>> {
        Ok(PNG_MAGIC.to_vec())
    }

    async fn close(&mut self) -> CheckResult<()> {
        self.call_history.push("close".to_string());
        Ok(())
    }
}
