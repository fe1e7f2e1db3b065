//! spa-sync: WebDriver keywords that wait for single-page applications
//!
//! After every browser-mutating action the library blocks until the page has
//! been replaced (or not), the document is ready and AngularJS reports no
//! outstanding requests, so the next step sees a settled application.

pub mod error;
pub mod config;
pub mod timeout;
pub mod wait;
pub mod telemetry;

pub mod webdriver;
pub mod readiness;
pub mod keywords;
pub mod library;

// Re-exports
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use library::Library;
pub use readiness::{
    FrameworkOutcome, HookResult, KeywordRegistry, KeywordRunner, ReadinessOutcome,
    ReadinessRequest, ScriptParts, SuppressedError,
};
pub use timeout::TimeoutArg;

/// spa-sync library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
