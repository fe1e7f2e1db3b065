//! User-facing waits
//!
//! Unlike internal synchronization, these fail with [`Error::Timeout`] when
//! their condition does not hold in time. Every keyword takes an optional
//! `error` replacing the default message.
//!
//! [`Error::Timeout`]: crate::Error::Timeout

use serde_json::json;
use std::time::Duration;
use tracing::instrument;

use super::element::ElementKeywords;
use super::location::LocationKeywords;
use super::KeywordContext;
use crate::readiness::scripts::sync;
use crate::timeout::{format_timeout, normalize, TimeoutArg};
use crate::wait::{is_truthy, Wait};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct WaitingKeywords {
    ctx: KeywordContext,
    elements: ElementKeywords,
    location: LocationKeywords,
}

impl WaitingKeywords {
    pub fn new(ctx: KeywordContext) -> Self {
        Self {
            elements: ElementKeywords::new(ctx.clone()),
            location: LocationKeywords::new(ctx.clone()),
            ctx,
        }
    }

    /// Wait until the element is displayed; it must exist up front
    #[instrument(skip(self, timeout, error))]
    pub async fn wait_until_element_is_visible(
        &self,
        locator: &str,
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> Result<()> {
        let timeout = normalize(timeout, self.ctx.config().implicit_wait_duration())?;
        let message = message_or(error, || {
            format!("Element '{}' was not visible in {}", locator, format_timeout(timeout))
        });
        let element = self.ctx.find(locator).await?;
        let driver = self.ctx.driver();
        let element = &element;

        self.wait(timeout, message)
            .until(move || driver.is_displayed(element))
            .await
    }

    #[instrument(skip(self, timeout, error))]
    pub async fn wait_until_element_is_not_visible(
        &self,
        locator: &str,
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> Result<()> {
        let timeout = normalize(timeout, self.ctx.config().implicit_wait_duration())?;
        let message = message_or(error, || {
            format!("Element '{}' was still visible after {}", locator, format_timeout(timeout))
        });
        let element = self.ctx.find(locator).await?;
        let driver = self.ctx.driver();
        let element = &element;

        self.wait(timeout, message)
            .until_not(move || driver.is_displayed(element))
            .await
    }

    #[instrument(skip(self, timeout, error))]
    pub async fn wait_until_location_contains(
        &self,
        expected: &str,
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> Result<()> {
        let timeout = normalize(timeout, self.ctx.config().timeout_duration())?;
        let message = message_or(error, || {
            format!("Location did not contain '{}' after {}", expected, format_timeout(timeout))
        });
        let location = &self.location;

        self.wait(timeout, message)
            .until(move || async move { Ok(location.get_location().await?.contains(expected)) })
            .await
    }

    #[instrument(skip(self, timeout, error))]
    pub async fn wait_until_location_does_not_contain(
        &self,
        unexpected: &str,
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> Result<()> {
        let timeout = normalize(timeout, self.ctx.config().timeout_duration())?;
        let message = message_or(error, || {
            format!("Location was still contain '{}' after {}", unexpected, format_timeout(timeout))
        });
        let location = &self.location;

        self.wait(timeout, message)
            .until_not(move || async move { Ok(location.get_location().await?.contains(unexpected)) })
            .await
    }

    /// Wait until the attribute behind `locator@attribute` contains `expected`
    #[instrument(skip(self, timeout, error))]
    pub async fn wait_until_element_contains_attribute(
        &self,
        attribute_locator: &str,
        expected: &str,
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> Result<()> {
        let timeout = normalize(timeout, self.ctx.config().timeout_duration())?;
        let message = message_or(error, || {
            format!(
                "Element did not contain attribute '{}' after {}",
                expected,
                format_timeout(timeout)
            )
        });
        let elements = &self.elements;

        self.wait(timeout, message)
            .until(move || async move {
                let actual = elements.get_element_attribute(attribute_locator).await?;
                Ok(actual.unwrap_or_default().contains(expected))
            })
            .await
    }

    #[instrument(skip(self, timeout, error))]
    pub async fn wait_until_element_does_not_contain_attribute(
        &self,
        attribute_locator: &str,
        unexpected: &str,
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> Result<()> {
        let timeout = normalize(timeout, self.ctx.config().timeout_duration())?;
        let message = message_or(error, || {
            format!(
                "Element was still contain attribute '{}' after {}",
                unexpected,
                format_timeout(timeout)
            )
        });
        let elements = &self.elements;

        self.wait(timeout, message)
            .until_not(move || async move {
                let actual = elements.get_element_attribute(attribute_locator).await?;
                Ok(actual.unwrap_or_default().contains(unexpected))
            })
            .await
    }

    /// Wait until a synchronous `condition` script returns something truthy
    #[instrument(skip(self, timeout, error))]
    pub async fn wait_for_condition(
        &self,
        condition: &str,
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> Result<()> {
        let timeout = normalize(timeout, self.ctx.config().timeout_duration())?;
        let message = condition_message(error, condition, timeout);
        let driver = self.ctx.driver();

        self.wait(timeout, message)
            .until_truthy(move || driver.execute_script(condition, vec![]))
            .await?;
        Ok(())
    }

    /// Wait until an asynchronous `condition` script calls back with
    /// something truthy
    #[instrument(skip(self, timeout, error))]
    pub async fn wait_for_async_condition(
        &self,
        condition: &str,
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> Result<()> {
        let timeout = normalize(timeout, self.ctx.config().timeout_duration())?;
        let message = condition_message(error, condition, timeout);
        let driver = self.ctx.driver();

        self.wait(timeout, message)
            .until_truthy(move || driver.execute_async_script(condition, vec![]))
            .await?;
        Ok(())
    }

    /// Wait until `text` appears, failing straight away if any of
    /// `excludes` is already on the page
    #[instrument(skip(self, timeout, error))]
    pub async fn fast_wait_until_page_contains(
        &self,
        text: &str,
        excludes: &[&str],
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> Result<()> {
        let timeout = normalize(timeout, self.ctx.config().timeout_duration())?;
        let message = message_or(error, || {
            format!("Text '{}' did not appear in {}", text, format_timeout(timeout))
        });

        for excluded in excludes {
            if self.is_text_present(excluded).await? {
                return Err(Error::assertion_failed(format!(
                    "Exclude text '{}' appears on the page.",
                    excluded
                )));
            }
        }

        self.wait(timeout, message)
            .until(move || self.is_text_present(text))
            .await
    }

    async fn is_text_present(&self, text: &str) -> Result<bool> {
        let found = self
            .ctx
            .driver()
            .execute_script(sync::PAGE_CONTAINS_TEXT, vec![json!(text)])
            .await?;
        Ok(is_truthy(&found))
    }

    fn wait(&self, timeout: Duration, message: String) -> Wait {
        Wait::new(timeout, self.ctx.config().poll_interval()).with_message(message)
    }
}

fn message_or<F: FnOnce() -> String>(error: Option<&str>, default: F) -> String {
    error.map(str::to_string).unwrap_or_else(default)
}

fn condition_message(error: Option<&str>, condition: &str, timeout: Duration) -> String {
    message_or(error, || {
        format!(
            "Condition '{}' did not become true in {}",
            condition,
            format_timeout(timeout)
        )
    })
}
