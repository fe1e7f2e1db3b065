//! # WebDriver layer
//!
//! Thin boundary between the keyword library and a browser session.
//!
//! ## Module structure
//! - `traits`: the [`WebDriver`] session trait
//! - `types`: element references and locators
//! - `client`: W3C WebDriver HTTP client
//! - `mock`: in-memory browser for tests
//!
//! ## Example
//! ```rust,no_run
//! use spa_sync::webdriver::{Locator, WebDriver, WebDriverClient};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = WebDriverClient::new_session(
//!     "http://localhost:4444",
//!     json!({ "browserName": "chrome" }),
//! )
//! .await?;
//! driver.navigate("https://example.com").await?;
//! let heading = driver.find_element(&Locator::parse("css=h1")?).await?;
//! println!("{}", driver.tag_name(&heading).await?);
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod client;
pub mod mock;

pub use traits::WebDriver;
pub use types::{
    AttributeLocator, ElementTarget, Locator, LogEntry, Strategy, WebElement, ELEMENT_KEY,
};

pub use client::{map_w3c_error, WebDriverClient};

// Re-export mock for development/testing
pub use mock::{MockBrowser, MockElement, MockFault, MockMutation, MockScriptCall};
