//! Live storefront checks against a real Chromium.
//!
//! Needs the `browser` feature, a Chromium install and network access. Set
//! `SHOPCHECK_LIVE=1` to run them; otherwise every test returns early.
//!
//! ```text
//! SHOPCHECK_LIVE=1 cargo test -p shopcheck --features browser --test live_storefront
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use shopcheck::prelude::*;
use shopcheck::{ChromiumDriver, LocatorName};

fn live() -> bool {
    std::env::var("SHOPCHECK_LIVE").is_ok_and(|v| v == "1")
}

fn config() -> SuiteConfig {
    let mut config = SuiteConfig::load(None).unwrap();
    if std::env::var("SHOPCHECK_SANDBOX").is_err() {
        config.browser.sandbox = false;
    }
    config
}

// =============================================================================
// Page model against the real site
// =============================================================================

#[tokio::test]
async fn test_home_page_exposes_header_locators() {
    if !live() {
        return;
    }
    let config = config();
    let page = config.page_model().unwrap();
    let mut driver = ChromiumDriver::launch(&config.browser).await.unwrap();

    page.navigate(&mut driver, None).await.unwrap();
    for name in [LocatorName::SearchInput, LocatorName::MenuToggle, LocatorName::Logo] {
        Expectation::Exist
            .verify(&driver, page.locator(name), page.wait_options())
            .await
            .unwrap();
    }
    driver.close().await.unwrap();
}

// =============================================================================
// Full suite
// =============================================================================

#[tokio::test]
async fn test_storefront_suite_runs_to_completion() {
    if !live() {
        return;
    }
    let config = config();
    let page = config.page_model().unwrap();
    let suite = ScenarioSuite::storefront(config.load_budget()).unwrap();
    let runner = SuiteRunner::with_config(config.runner_config(FailureMode::CollectAll).unwrap());
    let mut driver = ChromiumDriver::launch(&config.browser).await.unwrap();

    let report = runner.run(&suite, &page, &mut driver).await;
    driver.close().await.unwrap();

    println!("{}", report.summary());
    assert_eq!(report.total_count(), 5);
    assert_eq!(report.pending_count(), 0);
    assert!(report
        .scenarios
        .iter()
        .all(|r| r.status.is_terminal()));
}
