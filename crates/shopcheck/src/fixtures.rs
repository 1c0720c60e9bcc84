//! Shared test fixtures: an in-memory storefront home page.

use std::time::Duration;

use crate::driver::{MockDriver, Reaction};

/// Canonical URL of the mock storefront
pub const BASE_URL: &str = "https://shop.test";

/// Mock page that behaves like the storefront header: suggestions for real
/// queries, an off-canvas menu behind the hamburger button.
pub fn storefront_driver() -> MockDriver {
    MockDriver::new()
        .with_element("#twotabsearchtextbox", true)
        .with_element("#nav-hamburger-menu", true)
        .with_element("#nav-logo-sprites", true)
        .with_reaction(
            Reaction::on_type("#twotabsearchtextbox", "iphone")
                .reveal(".s-suggestion-container")
                .after(Duration::from_millis(350)),
        )
        .with_reaction(
            Reaction::on_click("#nav-hamburger-menu")
                .reveal(".hmenu-visible")
                .after(Duration::from_millis(200)),
        )
        .with_navigation_latency(Duration::from_millis(800))
        .with_ready_latency(Duration::from_millis(400))
}
