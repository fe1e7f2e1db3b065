//! WebDriver layer traits
//!
//! The readiness core only ever talks to the browser through [`WebDriver`].

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::types::{Locator, LogEntry, WebElement};
use crate::Error;

/// Browser session capabilities the keyword library relies on
#[async_trait]
pub trait WebDriver: Send + Sync + std::fmt::Debug {
    /// Find the first element matching `locator`
    async fn find_element(&self, locator: &Locator) -> Result<WebElement, Error>;

    /// Find every element matching `locator`
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<WebElement>, Error>;

    /// Execute a synchronous script; `args` are exposed as `arguments`
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, Error>;

    /// Execute an asynchronous script.
    ///
    /// The completion callback is appended as the last argument; the call
    /// resolves with the value passed to it, or fails with
    /// [`Error::ScriptTimeout`] once the session's script timeout elapses.
    async fn execute_async_script(&self, script: &str, args: Vec<Value>) -> Result<Value, Error>;

    /// Current asynchronous script timeout
    async fn script_timeout(&self) -> Result<Duration, Error>;

    /// Set the asynchronous script timeout
    async fn set_script_timeout(&self, timeout: Duration) -> Result<(), Error>;

    /// Whether the element belongs to a document that has been replaced
    async fn is_stale(&self, element: &WebElement) -> Result<bool, Error>;

    /// Check if element is displayed
    async fn is_displayed(&self, element: &WebElement) -> Result<bool, Error>;

    /// Check if element is selected (checkbox, radio, option)
    async fn is_selected(&self, element: &WebElement) -> Result<bool, Error>;

    /// Get element attribute
    async fn get_attribute(&self, element: &WebElement, name: &str) -> Result<Option<String>, Error>;

    /// Get element tag name
    async fn tag_name(&self, element: &WebElement) -> Result<String, Error>;

    /// Click element
    async fn click(&self, element: &WebElement) -> Result<(), Error>;

    /// Click with the pointer moved `x_offset` / `y_offset` pixels from the
    /// element's center
    async fn click_at(&self, element: &WebElement, x_offset: i64, y_offset: i64) -> Result<(), Error>;

    /// Clear a text field
    async fn clear(&self, element: &WebElement) -> Result<(), Error>;

    /// Type text into element
    async fn send_keys(&self, element: &WebElement, text: &str) -> Result<(), Error>;

    /// URL of the current top-level browsing context
    async fn current_url(&self) -> Result<String, Error>;

    /// Browser console entries collected since the last read
    async fn browser_logs(&self) -> Result<Vec<LogEntry>, Error>;

    /// Navigate to URL
    async fn navigate(&self, url: &str) -> Result<(), Error>;
}
