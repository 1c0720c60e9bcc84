//! Page model for the storefront home page
//!
//! One place knows the selectors; scenarios only name locators. A markup
//! change on the site is one edit in [`home_page`], not one per scenario.
//!
//! A [`PageModel`] is built once, validated by [`PageModelBuilder::build`]
//! (every [`LocatorName`] registered, base URL absolute) and never mutated
//! afterwards. It is passed by reference to whatever runs scenarios.

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::driver::BrowserDriver;
use crate::locator::{Locator, LocatorName, Selector};
use crate::result::{CheckError, CheckResult};
use crate::wait::{wait_for, Condition, WaitOptions, DEFAULT_PAGE_LOAD_TIMEOUT_MS};

/// Builder for page models
#[derive(Debug, Clone)]
pub struct PageModelBuilder {
    name: String,
    base_url: String,
    locators: BTreeMap<LocatorName, Locator>,
    wait: WaitOptions,
    page_load_timeout_ms: u64,
}

impl PageModelBuilder {
    /// Create a new page model builder
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: String::new(),
            locators: BTreeMap::new(),
            wait: WaitOptions::default(),
            page_load_timeout_ms: DEFAULT_PAGE_LOAD_TIMEOUT_MS,
        }
    }

    /// Set the canonical URL of the page
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Register a CSS locator under a name
    #[must_use]
    pub fn with_locator(self, name: LocatorName, css: impl Into<String>) -> Self {
        self.with_selector(name, Selector::css(css))
    }

    /// Register a locator with an arbitrary selector
    #[must_use]
    pub fn with_selector(mut self, name: LocatorName, selector: Selector) -> Self {
        let _ = self
            .locators
            .insert(name, Locator::from_selector(name, selector));
        self
    }

    /// Set the element wait budget
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set the page-load budget
    #[must_use]
    pub const fn with_page_load_timeout(mut self, timeout_ms: u64) -> Self {
        self.page_load_timeout_ms = timeout_ms;
        self
    }

    /// Validate and build the page model
    pub fn build(self) -> CheckResult<PageModel> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(CheckError::config(format!(
                "page '{}' needs an absolute http(s) base URL, got '{}'",
                self.name, self.base_url
            )));
        }

        let missing: Vec<&str> = LocatorName::ALL
            .iter()
            .filter(|name| !self.locators.contains_key(*name))
            .map(LocatorName::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(CheckError::config(format!(
                "page '{}' is missing locators: {}",
                self.name,
                missing.join(", ")
            )));
        }

        Ok(PageModel {
            name: self.name,
            base_url: self.base_url,
            locators: self.locators,
            wait: self.wait,
            page_load_timeout_ms: self.page_load_timeout_ms,
        })
    }
}

/// A validated, immutable page model
#[derive(Debug, Clone)]
pub struct PageModel {
    name: String,
    base_url: String,
    locators: BTreeMap<LocatorName, Locator>,
    wait: WaitOptions,
    page_load_timeout_ms: u64,
}

impl PageModel {
    /// Start building a page model
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PageModelBuilder {
        PageModelBuilder::new(name)
    }

    /// Page name for logs and reports
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Element wait budget
    #[must_use]
    pub const fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    /// Page-load budget
    #[must_use]
    pub const fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    /// Typed locator access. Every name is registered once `build` succeeded.
    #[must_use]
    pub fn locator(&self, name: LocatorName) -> &Locator {
        &self.locators[&name]
    }

    /// Look up a locator by its kebab-case name
    pub fn locate(&self, name: &str) -> CheckResult<&Locator> {
        let name: LocatorName = name.parse()?;
        Ok(self.locator(name))
    }

    /// Registered locators in name order
    pub fn locators(&self) -> impl Iterator<Item = &Locator> {
        self.locators.values()
    }

    /// Resolve an optional URL override against the base URL
    #[must_use]
    pub fn resolve_url(&self, url: Option<&str>) -> String {
        let base = self.base_url.trim_end_matches('/');
        match url {
            None => format!("{base}/"),
            Some(u) if u.starts_with("http://") || u.starts_with("https://") => u.to_string(),
            Some(u) => format!("{base}/{}", u.trim_start_matches('/')),
        }
    }

    /// Load the page (or an override) and wait for the navigation to commit
    pub async fn navigate<D: BrowserDriver + ?Sized>(
        &self,
        driver: &mut D,
        url: Option<&str>,
    ) -> CheckResult<()> {
        let target = self.resolve_url(url);
        info!(page = %self.name, url = %target, "navigating");
        driver.navigate(&target, self.page_load_timeout()).await
    }

    /// Type `text` into the named element
    pub async fn type_into<D: BrowserDriver + ?Sized>(
        &self,
        driver: &mut D,
        name: LocatorName,
        text: &str,
    ) -> CheckResult<()> {
        let locator = self.resolve(driver, name).await?;
        debug!(locator = %name, text, "typing");
        driver.type_text(locator.selector(), text).await
    }

    /// Click the named element
    pub async fn click<D: BrowserDriver + ?Sized>(
        &self,
        driver: &mut D,
        name: LocatorName,
    ) -> CheckResult<()> {
        let locator = self.resolve(driver, name).await?;
        debug!(locator = %name, "clicking");
        driver.click(locator.selector()).await
    }

    /// Type a query into the header search box
    pub async fn search<D: BrowserDriver + ?Sized>(
        &self,
        driver: &mut D,
        text: &str,
    ) -> CheckResult<()> {
        self.type_into(driver, LocatorName::SearchInput, text).await
    }

    /// Open the category menu
    pub async fn open_menu<D: BrowserDriver + ?Sized>(&self, driver: &mut D) -> CheckResult<()> {
        self.click(driver, LocatorName::MenuToggle).await
    }

    /// Wait until the locator matches at least one element
    async fn resolve<D: BrowserDriver + ?Sized>(
        &self,
        driver: &D,
        name: LocatorName,
    ) -> CheckResult<&Locator> {
        let locator = self.locator(name);
        let found = wait_for(driver, locator.selector(), Condition::Exists, &self.wait).await?;
        if found.success {
            Ok(locator)
        } else {
            Err(CheckError::ElementNotFound {
                locator: name.to_string(),
                selector: locator.selector().to_string(),
                ms: self.wait.timeout_ms,
            })
        }
    }
}

/// Storefront home page model
pub fn home_page(base_url: impl Into<String>) -> CheckResult<PageModel> {
    home_page_builder(base_url).build()
}

/// Storefront home page locators, before budgets are applied
#[must_use]
pub fn home_page_builder(base_url: impl Into<String>) -> PageModelBuilder {
    PageModel::builder("home")
        .with_base_url(base_url)
        .with_locator(LocatorName::SearchInput, "#twotabsearchtextbox")
        .with_locator(LocatorName::SearchSuggestions, ".s-suggestion-container")
        .with_locator(LocatorName::MenuToggle, "#nav-hamburger-menu")
        .with_locator(LocatorName::Logo, "#nav-logo-sprites")
        .with_locator(LocatorName::MenuVisible, ".hmenu-visible")
}
