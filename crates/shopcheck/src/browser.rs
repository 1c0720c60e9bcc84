//! Chromium driver over the Chrome DevTools Protocol.
//!
//! Compiled with the `browser` feature. One browser process, one page; the
//! CDP handler stream is drained on a spawned task for the browser's lifetime.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::driver::BrowserDriver;
use crate::emulation::ViewportProfile;
use crate::locator::Selector;
use crate::result::{CheckError, CheckResult};
use crate::wait::DEFAULT_POLL_INTERVAL_MS;

const READY_STATE: &str = "document.readyState";

fn engine(e: impl Display) -> CheckError {
    CheckError::engine(e.to_string())
}

/// Real browser behind [`BrowserDriver`]
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Mutex<CdpBrowser>,
    page: Mutex<CdpPage>,
    handler: JoinHandle<()>,
    action_timeout: Duration,
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank page
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be launched
    pub async fn launch(config: &BrowserConfig) -> CheckResult<Self> {
        let mut builder = CdpConfig::builder();

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|message| CheckError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| CheckError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CheckError::BrowserLaunch {
                message: e.to_string(),
            })?;

        info!(
            headless = config.headless,
            sandbox = config.sandbox,
            "chromium launched"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            page: Mutex::new(page),
            handler,
            action_timeout: config.action_timeout(),
        })
    }

    /// Run one element action under the action bound
    async fn act<F>(&self, what: &str, selector: &Selector, action: F) -> CheckResult<()>
    where
        F: std::future::Future<Output = CheckResult<()>> + Send,
    {
        match tokio::time::timeout(self.action_timeout, action).await {
            Ok(result) => result,
            Err(_) => Err(CheckError::engine(format!(
                "{what} on {selector} did not finish within {}ms",
                self.action_timeout.as_millis()
            ))),
        }
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, expr: &str) -> CheckResult<T> {
        let page = self.page.lock().await;
        page.evaluate(expr)
            .await
            .map_err(engine)?
            .into_value()
            .map_err(engine)
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> CheckResult<()> {
        let page = self.page.lock().await;
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(engine(e)),
            Err(_) => Err(CheckError::NavigationTimeout {
                url: url.to_string(),
                ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn wait_for_ready(&self, timeout: Duration) -> CheckResult<()> {
        let poll = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
        let ready = async {
            loop {
                let state: String = self.eval(READY_STATE).await?;
                if state == "complete" {
                    return CheckResult::Ok(());
                }
                tokio::time::sleep(poll).await;
            }
        };
        match tokio::time::timeout(timeout, ready).await {
            Ok(result) => result,
            Err(_) => Err(CheckError::NavigationTimeout {
                url: self.current_url().await.unwrap_or_default(),
                ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn set_viewport(&mut self, profile: &ViewportProfile) -> CheckResult<()> {
        let page = self.page.lock().await;
        let metrics = SetDeviceMetricsOverrideParams::new(
            i64::from(profile.viewport.width),
            i64::from(profile.viewport.height),
            profile.device_scale_factor,
            profile.is_mobile,
        );
        page.execute(metrics).await.map_err(engine)?;
        page.execute(SetTouchEmulationEnabledParams::new(profile.has_touch))
            .await
            .map_err(engine)?;
        debug!(profile = %profile.name, viewport = %profile.viewport, "viewport applied");
        Ok(())
    }

    async fn count(&self, selector: &Selector) -> CheckResult<usize> {
        self.eval(&selector.to_count_query()).await
    }

    async fn is_visible(&self, selector: &Selector) -> CheckResult<bool> {
        self.eval(&selector.to_visible_query()).await
    }

    async fn type_text(&mut self, selector: &Selector, text: &str) -> CheckResult<()> {
        let page = self.page.lock().await;
        self.act("type", selector, async {
            let element = page.find_element(selector.to_css()).await.map_err(engine)?;
            element.click().await.map_err(engine)?;
            element.type_str(text).await.map_err(engine)?;
            Ok(())
        })
        .await
    }

    async fn click(&mut self, selector: &Selector) -> CheckResult<()> {
        let page = self.page.lock().await;
        self.act("click", selector, async {
            let element = page.find_element(selector.to_css()).await.map_err(engine)?;
            element.click().await.map_err(engine)?;
            Ok(())
        })
        .await
    }

    async fn current_url(&self) -> CheckResult<String> {
        let page = self.page.lock().await;
        Ok(page.url().await.map_err(engine)?.unwrap_or_default())
    }

    async fn screenshot(&self) -> CheckResult<Vec<u8>> {
        use base64::Engine;

        let page = self.page.lock().await;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = page.execute(params).await.map_err(engine)?;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(engine)
    }

    async fn close(&mut self) -> CheckResult<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!(error = %e, "browser did not close cleanly");
        }
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "chromium process did not exit cleanly");
        }
        self.handler.abort();
        info!("chromium closed");
        Ok(())
    }
}
