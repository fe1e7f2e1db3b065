//! # Keywords
//!
//! Action, wait and script keywords. Every browser-mutating keyword runs a
//! page-readiness cycle after acting unless the caller passes `skip_ready`.
//!
//! ## Module structure
//! - `element`: clicks, scrolling, visibility and attribute checks
//! - `form`: buttons, forms, text input, checkboxes and radio buttons
//! - `select`: `<select>` lists
//! - `location`: current URL
//! - `waiting`: user-facing waits, which fail with [`Error::Timeout`]
//! - `javascript`: script execution

pub mod element;
pub mod form;
pub mod select;
pub mod location;
pub mod waiting;
pub mod javascript;

#[cfg(test)]
mod tests;

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::SessionConfig;
use crate::readiness::scripts::{self, ScriptParts};
use crate::readiness::{
    apply_script_timeout, current_script_timeout, PageReadiness, ReadinessRequest,
};
use crate::webdriver::{Locator, WebDriver, WebElement};
use crate::{Error, Result};

pub use element::ElementKeywords;
pub use form::FormKeywords;
pub use javascript::JavascriptKeywords;
pub use location::LocationKeywords;
pub use select::SelectKeywords;
pub use waiting::WaitingKeywords;

/// Session handles shared by every keyword group
#[derive(Debug, Clone)]
pub struct KeywordContext {
    driver: Arc<dyn WebDriver>,
    config: Arc<SessionConfig>,
    page: PageReadiness,
}

impl KeywordContext {
    pub fn new(driver: Arc<dyn WebDriver>, config: Arc<SessionConfig>, page: PageReadiness) -> Self {
        Self { driver, config, page }
    }

    pub fn driver(&self) -> &dyn WebDriver {
        self.driver.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn page(&self) -> &PageReadiness {
        &self.page
    }

    /// Find the first element for `locator`, failing if there is none
    pub async fn find(&self, locator: &str) -> Result<WebElement> {
        self.driver.find_element(&Locator::parse(locator)?).await
    }

    /// Find the first element for `locator` whose tag is one of `tags`
    pub async fn find_with_tag(&self, locator: &str, tags: &[&str]) -> Result<WebElement> {
        let candidates = self.driver.find_elements(&Locator::parse(locator)?).await?;
        for tag in tags {
            for candidate in &candidates {
                if self.driver.tag_name(candidate).await?.eq_ignore_ascii_case(tag) {
                    return Ok(candidate.clone());
                }
            }
        }
        Err(Error::element_not_found(locator))
    }

    /// Plain page-readiness cycle after a browser-mutating action
    pub async fn wait_until_page_ready(&self) -> Result<()> {
        self.page.wait_until_page_ready(ReadinessRequest::new()).await?;
        Ok(())
    }

    /// Cycle for actions that keep the current document: no stale check
    pub async fn wait_until_page_settled(&self) -> Result<()> {
        self.page
            .wait_until_page_ready(ReadinessRequest::builder().skip_stale_check(true).build())
            .await?;
        Ok(())
    }

    /// Run the readiness script `parts` against `element` and return what it
    /// called back with.
    ///
    /// This is the action itself, so it runs whether or not page readiness
    /// blocking is enabled. The script timeout is raised to `implicit_wait`
    /// for the call.
    pub async fn run_on_element(&self, element: &WebElement, parts: ScriptParts) -> Result<Value> {
        let driver = self.driver();
        let prior = current_script_timeout(driver, self.config.timeout_duration()).await;
        apply_script_timeout(driver, self.config.implicit_wait_duration()).await;

        let result = driver
            .execute_async_script(&scripts::compose(&parts), vec![element.to_json()])
            .await;

        apply_script_timeout(driver, prior).await;
        result
    }

    /// Fire `change` / `focusout` on `element` once AngularJS is idle, then
    /// settle the page
    pub async fn trigger_change(&self, element: &WebElement) -> Result<()> {
        debug!("Triggering change on element {}", element.id());
        self.run_on_element(element, ScriptParts::trigger_change()).await?;
        self.wait_until_page_settled().await
    }
}
