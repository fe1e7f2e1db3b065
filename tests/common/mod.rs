//! Common test utilities
//!
//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use spa_sync::webdriver::{MockBrowser, MockElement};
use spa_sync::{Library, SessionConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Defaults, except for a short poll frequency so tests stay quick
pub fn test_config() -> SessionConfig {
    SessionConfig::builder()
        .poll_frequency(0.05)
        .build()
        .expect("valid test config")
}

pub fn library_for(browser: &MockBrowser, config: SessionConfig) -> Library {
    Library::new(Arc::new(browser.clone()), config)
}

/// AngularJS shop with a checkout button
pub async fn setup_shop(url: &str) -> MockBrowser {
    let browser = MockBrowser::angular(url).await;
    browser
        .add_element("css=button.checkout", MockElement::new("button"))
        .await;
    browser
}

/// Time an async block
pub async fn timed<F, T>(fut: F) -> (T, Duration)
where
    F: std::future::Future<Output = T>,
{
    let started = Instant::now();
    let value = fut.await;
    (value, started.elapsed())
}

/// WebDriver remote end for live tests, if one answers
pub async fn live_webdriver_url() -> Option<String> {
    let url = std::env::var("WEBDRIVER_URL").unwrap_or_else(|_| "http://localhost:4444".to_string());
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .ok()?;
    let response = client.get(format!("{}/status", url)).send().await.ok()?;
    response.status().is_success().then_some(url)
}
