//! # Readiness synchronization
//!
//! Decides, after any browser-mutating action, when the application under
//! test is stable enough for the next step.
//!
//! ## Module structure
//! - `scripts`: the injected JavaScript and its composition
//! - `hooks`: page-ready keyword list and the [`KeywordRunner`] seam
//! - `framework`: waits for AngularJS to report no outstanding requests
//! - `page`: stale-document check, document readiness, hooks, then framework
//!
//! Internal synchronization never fails the caller. Errors it swallows are
//! logged at debug and surfaced as [`SuppressedError`] values.

pub mod scripts;
pub mod hooks;
pub mod framework;
pub mod page;

#[cfg(test)]
mod tests;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::timeout::TimeoutArg;
use crate::webdriver::{ElementTarget, WebDriver};

pub use framework::FrameworkReadiness;
pub use hooks::{KeywordRegistry, KeywordRunner, PageReadyHooks};
pub use page::PageReadiness;
pub use scripts::ScriptParts;

/// Parameters of one page-readiness cycle
#[derive(Debug, Clone, Default)]
pub struct ReadinessRequest {
    target: Option<ElementTarget>,
    script: ScriptParts,
    timeout: Option<TimeoutArg>,
    skip_stale_check: bool,
    default_response: Option<Value>,
    browser: Option<Arc<dyn WebDriver>>,
}

impl ReadinessRequest {
    /// Default cycle: no target, default script parts
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ReadinessRequestBuilder {
        ReadinessRequestBuilder::default()
    }

    pub fn target(&self) -> Option<&ElementTarget> {
        self.target.as_ref()
    }

    pub fn script(&self) -> &ScriptParts {
        &self.script
    }

    pub fn timeout(&self) -> Option<&TimeoutArg> {
        self.timeout.as_ref()
    }

    pub fn skip_stale_check(&self) -> bool {
        self.skip_stale_check
    }

    pub fn default_response(&self) -> Option<&Value> {
        self.default_response.as_ref()
    }

    pub fn browser(&self) -> Option<&Arc<dyn WebDriver>> {
        self.browser.as_ref()
    }
}

/// Builder for [`ReadinessRequest`]
#[derive(Debug, Default)]
pub struct ReadinessRequestBuilder {
    request: ReadinessRequest,
}

impl ReadinessRequestBuilder {
    /// Element passed to the readiness script as `arguments[0]`
    pub fn target<T: Into<ElementTarget>>(mut self, target: T) -> Self {
        self.request.target = Some(target.into());
        self
    }

    pub fn script(mut self, parts: ScriptParts) -> Self {
        self.request.script = parts;
        self
    }

    pub fn prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.request.script.prefix = prefix.into();
        self
    }

    pub fn handler<S: Into<String>>(mut self, handler: S) -> Self {
        self.request.script.handler = handler.into();
        self
    }

    pub fn suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.request.script.suffix = suffix.into();
        self
    }

    pub fn timeout<T: Into<TimeoutArg>>(mut self, timeout: T) -> Self {
        self.request.timeout = Some(timeout.into());
        self
    }

    /// Skip the stale-document check (same-document interactions)
    pub fn skip_stale_check(mut self, skip: bool) -> Self {
        self.request.skip_stale_check = skip;
        self
    }

    /// Response reported when the readiness script yields nothing
    pub fn default_response(mut self, response: Value) -> Self {
        self.request.default_response = Some(response);
        self
    }

    /// Run the cycle against another session than the library's own
    pub fn browser(mut self, browser: Arc<dyn WebDriver>) -> Self {
        self.request.browser = Some(browser);
        self
    }

    pub fn build(self) -> ReadinessRequest {
        self.request
    }
}

/// Outcome of one page-ready keyword
#[derive(Debug, Clone, PartialEq)]
pub struct HookResult {
    pub name: String,
    pub outcome: std::result::Result<Value, String>,
}

impl HookResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Result of a page-readiness cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadinessOutcome {
    /// Value the readiness script called back with, or the default response
    pub response: Option<Value>,
    pub hooks: Vec<HookResult>,
}

/// An error swallowed by internal synchronization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressedError {
    Timeout { attempt: u32, message: String },
    Script { attempt: u32, message: String },
}

/// How a framework-readiness cycle ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameworkOutcome {
    /// Framework check executions, at most two
    pub attempts: u32,
    /// Whether the framework reported no outstanding requests
    pub settled: bool,
    pub suppressed: Vec<SuppressedError>,
}

/// Read the session's async-script timeout so it can be put back afterwards
pub(crate) async fn current_script_timeout(driver: &dyn WebDriver, fallback: Duration) -> Duration {
    match driver.script_timeout().await {
        Ok(timeout) => timeout,
        Err(e) => {
            debug!("Could not read script timeout, restoring to {:?} later: {}", fallback, e);
            fallback
        }
    }
}

pub(crate) async fn apply_script_timeout(driver: &dyn WebDriver, timeout: Duration) {
    if let Err(e) = driver.set_script_timeout(timeout).await {
        debug!("Could not set script timeout to {:?}: {}", timeout, e);
    }
}
