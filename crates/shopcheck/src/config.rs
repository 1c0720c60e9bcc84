//! Suite configuration
//!
//! Resolution order, later wins: built-in defaults, `shopcheck.yaml` (or an
//! explicit file), environment variables, then whatever the caller (the CLI)
//! sets on the struct afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::emulation::{ViewportProfile, DEFAULT_PROFILE};
use crate::page_model::{home_page_builder, PageModel};
use crate::reporter::{FailureMode, ReportOutput};
use crate::result::{CheckError, CheckResult};
use crate::suite::{RunnerConfig, DEFAULT_LOAD_BUDGET_MS};
use crate::wait::{
    WaitOptions, DEFAULT_PAGE_LOAD_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "shopcheck.yaml";

/// Storefront under test when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "https://www.amazon.com.br";

/// Overrides `base_url`
pub const ENV_BASE_URL: &str = "SHOPCHECK_BASE_URL";
/// Overrides `report.dir`
pub const ENV_REPORT_DIR: &str = "SHOPCHECK_REPORT_DIR";
/// Overrides `browser.chromium_path`
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";

/// Report output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Output directory
    pub dir: PathBuf,
    /// Replace the previous report instead of numbering
    pub overwrite: bool,
    /// Write `shopcheck.json`
    pub json: bool,
    /// Write `shopcheck.html`
    pub html: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("reports"),
            overwrite: false,
            json: true,
            html: false,
        }
    }
}

/// Wait budgets, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitConfig {
    /// Element wait window
    pub default_ms: u64,
    /// Polling interval
    pub poll_ms: u64,
    /// Navigation / page-ready budget
    pub page_load_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            default_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_ms: DEFAULT_POLL_INTERVAL_MS,
            page_load_ms: DEFAULT_PAGE_LOAD_TIMEOUT_MS,
        }
    }
}

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserConfig {
    /// Run without a window
    pub headless: bool,
    /// Keep Chromium's sandbox on (turn off in containers)
    pub sandbox: bool,
    /// Chromium binary; auto-detected when unset
    pub chromium_path: Option<PathBuf>,
    /// Upper bound for a single click or keystroke sequence
    pub action_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            action_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }
}

impl BrowserConfig {
    /// Action bound as `Duration`
    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}

/// Everything a suite run needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// Canonical storefront URL
    pub base_url: String,
    /// Report output
    pub report: ReportConfig,
    /// Wait budgets
    pub wait: WaitConfig,
    /// Strict budget for the page-load scenario
    pub load_budget_ms: u64,
    /// Browser launch
    pub browser: BrowserConfig,
    /// Viewport profile applied before every scenario
    pub viewport: String,
    /// Capture a screenshot when a scenario does not pass
    pub screenshots: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            report: ReportConfig::default(),
            wait: WaitConfig::default(),
            load_budget_ms: DEFAULT_LOAD_BUDGET_MS,
            browser: BrowserConfig::default(),
            viewport: DEFAULT_PROFILE.to_string(),
            screenshots: true,
        }
    }
}

impl SuiteConfig {
    /// Parse a config document; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> CheckResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a config file
    pub fn from_file(path: &Path) -> CheckResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            CheckError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "config loaded");
        Self::from_yaml_str(&yaml)
    }

    /// Resolve file and environment layers.
    ///
    /// An explicit `path` must exist; otherwise `shopcheck.yaml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> CheckResult<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        Ok(base.with_env(|key| std::env::var(key).ok()))
    }

    /// Apply environment overrides through `lookup`
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = set(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(dir) = set(ENV_REPORT_DIR) {
            self.report.dir = PathBuf::from(dir);
        }
        if let Some(path) = set(ENV_CHROMIUM_PATH) {
            self.browser.chromium_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> CheckResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(CheckError::config(format!(
                "base_url must be an absolute http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.wait.poll_ms == 0 {
            return Err(CheckError::config("wait.poll_ms must be greater than 0"));
        }
        if self.browser.action_timeout_ms == 0 {
            return Err(CheckError::config(
                "browser.action_timeout_ms must be greater than 0",
            ));
        }
        if self.load_budget_ms == 0 {
            return Err(CheckError::config("load_budget_ms must be greater than 0"));
        }
        let _ = self.default_viewport()?;
        Ok(())
    }

    /// Element wait options
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.wait.default_ms,
            poll_interval_ms: self.wait.poll_ms,
        }
    }

    /// Strict page-load budget
    #[must_use]
    pub const fn load_budget(&self) -> Duration {
        Duration::from_millis(self.load_budget_ms)
    }

    /// Viewport profile applied before every scenario
    pub fn default_viewport(&self) -> CheckResult<ViewportProfile> {
        ViewportProfile::named(&self.viewport)
    }

    /// Storefront home page with the configured URL and budgets
    pub fn page_model(&self) -> CheckResult<PageModel> {
        home_page_builder(self.base_url.clone())
            .with_wait(self.wait_options())
            .with_page_load_timeout(self.wait.page_load_ms)
            .build()
    }

    /// Report files to write
    #[must_use]
    pub fn report_output(&self) -> ReportOutput {
        ReportOutput {
            dir: self.report.dir.clone(),
            overwrite: self.report.overwrite,
            json: self.report.json,
            html: self.report.html,
        }
    }

    /// Runner settings
    pub fn runner_config(&self, failure_mode: FailureMode) -> CheckResult<RunnerConfig> {
        Ok(RunnerConfig {
            default_viewport: self.default_viewport()?,
            failure_mode,
            screenshot_dir: self
                .screenshots
                .then(|| self.report_output().screenshot_dir()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = SuiteConfig::default();
            assert_eq!(config.base_url, "https://www.amazon.com.br");
            assert_eq!(config.report.dir, PathBuf::from("reports"));
            assert!(!config.report.overwrite);
            assert!(config.report.json);
            assert!(!config.report.html);
            assert_eq!(config.wait.default_ms, 4000);
            assert_eq!(config.wait.poll_ms, 50);
            assert_eq!(config.wait.page_load_ms, 60_000);
            assert_eq!(config.load_budget_ms, 3000);
            assert!(config.browser.headless);
            assert!(config.browser.sandbox);
            assert!(config.browser.chromium_path.is_none());
            assert_eq!(config.browser.action_timeout(), Duration::from_millis(4_000));
            assert_eq!(config.viewport, "default");
            assert!(config.screenshots);
            config.validate().unwrap();
        }

        #[test]
        fn test_empty_document_is_default() {
            assert_eq!(SuiteConfig::from_yaml_str("  \n").unwrap(), SuiteConfig::default());
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_partial_document() {
            let config = SuiteConfig::from_yaml_str(
                r"
base_url: https://shop.test
report:
  html: true
wait:
  default_ms: 8000
browser:
  sandbox: false
viewport: iphone-x
",
            )
            .unwrap();
            assert_eq!(config.base_url, "https://shop.test");
            assert!(config.report.html);
            assert!(config.report.json);
            assert_eq!(config.wait.default_ms, 8000);
            assert_eq!(config.wait.poll_ms, 50);
            assert!(!config.browser.sandbox);
            assert!(config.browser.headless);
            assert_eq!(config.default_viewport().unwrap().name, "iphone-x");
        }

        #[test]
        fn test_unknown_key_rejected() {
            let err = SuiteConfig::from_yaml_str("base_ur: https://x.test\n").unwrap_err();
            assert!(matches!(err, CheckError::Yaml(_)));
        }

        #[test]
        fn test_from_file() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("shopcheck.yaml");
            std::fs::write(&path, "load_budget_ms: 2500\n").unwrap();
            let config = SuiteConfig::from_file(&path).unwrap();
            assert_eq!(config.load_budget(), Duration::from_millis(2500));
        }

        #[test]
        fn test_missing_explicit_file() {
            let dir = TempDir::new().unwrap();
            let err = SuiteConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
            assert!(err.to_string().contains("cannot read"));
        }
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_env_overrides() {
            let config = SuiteConfig::default().with_env(env(&[
                (ENV_BASE_URL, "https://staging.shop.test"),
                (ENV_REPORT_DIR, "/tmp/out"),
                (ENV_CHROMIUM_PATH, "/usr/bin/chromium"),
            ]));
            assert_eq!(config.base_url, "https://staging.shop.test");
            assert_eq!(config.report.dir, PathBuf::from("/tmp/out"));
            assert_eq!(
                config.browser.chromium_path,
                Some(PathBuf::from("/usr/bin/chromium"))
            );
        }

        #[test]
        fn test_blank_env_ignored() {
            let config = SuiteConfig::default().with_env(env(&[(ENV_BASE_URL, "  ")]));
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_relative_base_url() {
            let config = SuiteConfig {
                base_url: "shop.test".to_string(),
                ..SuiteConfig::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_unknown_viewport() {
            let config = SuiteConfig {
                viewport: "watch".to_string(),
                ..SuiteConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(CheckError::UnknownViewport { .. })
            ));
        }

        #[test]
        fn test_zero_poll() {
            let mut config = SuiteConfig::default();
            config.wait.poll_ms = 0;
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_zero_action_timeout() {
            let mut config = SuiteConfig::from_yaml_str("browser:\n  action_timeout_ms: 0\n").unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("action_timeout_ms"));
            config.browser.action_timeout_ms = 250;
            assert!(config.validate().is_ok());
        }
    }

    mod derived_tests {
        use super::*;

        #[test]
        fn test_page_model_uses_budgets() {
            let mut config = SuiteConfig::default();
            config.wait.default_ms = 1500;
            config.wait.page_load_ms = 20_000;
            let page = config.page_model().unwrap();
            assert_eq!(page.base_url(), DEFAULT_BASE_URL);
            assert_eq!(page.wait_options().timeout_ms, 1500);
            assert_eq!(page.page_load_timeout(), Duration::from_secs(20));
        }

        #[test]
        fn test_runner_config_screenshots() {
            let config = SuiteConfig::default();
            let runner = config.runner_config(FailureMode::AndonCord).unwrap();
            assert_eq!(runner.failure_mode, FailureMode::AndonCord);
            assert_eq!(
                runner.screenshot_dir,
                Some(PathBuf::from("reports").join("screenshots"))
            );

            let quiet = SuiteConfig {
                screenshots: false,
                ..SuiteConfig::default()
            };
            assert!(quiet
                .runner_config(FailureMode::CollectAll)
                .unwrap()
                .screenshot_dir
                .is_none());
        }
    }
}
