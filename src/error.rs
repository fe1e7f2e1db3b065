//! Unified error types for spa-sync

use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for spa-sync
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport errors talking to the WebDriver endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// WebDriver protocol error that has no dedicated variant
    #[error("WebDriver error ({error}): {message}")]
    WebDriver { error: String, message: String },

    /// No active browser session
    #[error("No active browser session: {0}")]
    NoActiveSession(String),

    /// Element not found
    #[error("Element '{0}' not found.")]
    ElementNotFound(String),

    /// Element reference belongs to a replaced document
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// The browser's asynchronous script timeout fired
    #[error("Script timeout: {0}")]
    ScriptTimeout(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// User-facing wait expired
    #[error("{0}")]
    Timeout(String),

    /// User-facing assertion failed
    #[error("{0}")]
    AssertionFailed(String),

    /// Timeout value could not be understood
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Locator could not be understood
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// Removing a page ready keyword that was never registered
    #[error("Page ready keyword '{0}' is not registered")]
    HookNotRegistered(String),

    /// Keyword runner has no keyword with this name
    #[error("No keyword with name '{0}' found")]
    KeywordNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new WebDriver protocol error
    pub fn webdriver<S: Into<String>, M: Into<String>>(error: S, message: M) -> Self {
        Error::WebDriver {
            error: error.into(),
            message: message.into(),
        }
    }

    /// Create a new no active session error
    pub fn no_active_session<S: Into<String>>(msg: S) -> Self {
        Error::NoActiveSession(msg.into())
    }

    /// Create a new element not found error
    pub fn element_not_found<S: Into<String>>(locator: S) -> Self {
        Error::ElementNotFound(locator.into())
    }

    /// Create a new stale element error
    pub fn stale_element<S: Into<String>>(msg: S) -> Self {
        Error::StaleElement(msg.into())
    }

    /// Create a new script timeout error
    pub fn script_timeout<S: Into<String>>(msg: S) -> Self {
        Error::ScriptTimeout(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new assertion failed error
    pub fn assertion_failed<S: Into<String>>(msg: S) -> Self {
        Error::AssertionFailed(msg.into())
    }

    /// Create a new invalid timeout error
    pub fn invalid_timeout<S: Into<String>>(msg: S) -> Self {
        Error::InvalidTimeout(msg.into())
    }

    /// Create a new invalid locator error
    pub fn invalid_locator<S: Into<String>>(msg: S) -> Self {
        Error::InvalidLocator(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether this error means "ran out of time" rather than "something broke".
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::ScriptTimeout(_))
    }

    /// Whether a poll should treat this error as "condition not met yet".
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ElementNotFound(_) | Error::StaleElement(_))
    }
}
