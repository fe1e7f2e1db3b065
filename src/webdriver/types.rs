//! WebDriver value types: element references and locators

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Key under which W3C WebDriver serializes element references
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Reference to a DOM element held by the remote end
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebElement {
    id: String,
}

impl WebElement {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wire form, usable as a script argument
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(ELEMENT_KEY.to_string(), Value::String(self.id.clone()));
        Value::Object(map)
    }

    /// Parse the wire form
    pub fn from_json(value: &Value) -> Option<Self> {
        value
            .get(ELEMENT_KEY)
            .and_then(|v| v.as_str())
            .map(WebElement::new)
    }
}

/// Locator strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Css,
    XPath,
    Id,
    Name,
    Tag,
    LinkText,
    PartialLinkText,
    /// No prefix: match by id or name
    Default,
}

/// `strategy=value` element locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    raw: String,
    strategy: Strategy,
    value: String,
}

impl Locator {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_locator("empty locator"));
        }

        if trimmed.starts_with("//") || trimmed.starts_with("(//") {
            return Ok(Self::with(raw, Strategy::XPath, trimmed));
        }

        if let Some((prefix, value)) = trimmed.split_once('=') {
            let strategy = match prefix.trim().to_ascii_lowercase().as_str() {
                "css" => Some(Strategy::Css),
                "xpath" => Some(Strategy::XPath),
                "id" => Some(Strategy::Id),
                "name" => Some(Strategy::Name),
                "tag" => Some(Strategy::Tag),
                "link" => Some(Strategy::LinkText),
                "partial link" => Some(Strategy::PartialLinkText),
                _ => None,
            };
            if let Some(strategy) = strategy {
                let value = value.trim();
                if value.is_empty() {
                    return Err(Error::invalid_locator(format!("'{}' has no value", raw)));
                }
                return Ok(Self::with(raw, strategy, value));
            }
        }

        Ok(Self::with(raw, Strategy::Default, trimmed))
    }

    fn with(raw: &str, strategy: Strategy, value: &str) -> Self {
        Self {
            raw: raw.to_string(),
            strategy,
            value: value.to_string(),
        }
    }

    /// Locator text as written by the caller
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// W3C `using` / `value` pair
    pub fn to_w3c(&self) -> (&'static str, String) {
        match self.strategy {
            Strategy::Css => ("css selector", self.value.clone()),
            Strategy::XPath => ("xpath", self.value.clone()),
            Strategy::Id => ("css selector", format!("[id=\"{}\"]", css_escape(&self.value))),
            Strategy::Name => ("css selector", format!("[name=\"{}\"]", css_escape(&self.value))),
            Strategy::Tag => ("tag name", self.value.clone()),
            Strategy::LinkText => ("link text", self.value.clone()),
            Strategy::PartialLinkText => ("partial link text", self.value.clone()),
            Strategy::Default => {
                let escaped = css_escape(&self.value);
                ("css selector", format!("[id=\"{0}\"],[name=\"{0}\"]", escaped))
            }
        }
    }
}

impl FromStr for Locator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Locator::parse(s)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `locator@attribute`, e.g. `css=div.card@class`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLocator {
    pub locator: Locator,
    pub attribute: String,
}

impl AttributeLocator {
    pub fn parse(raw: &str) -> Result<Self> {
        let (locator, attribute) = raw.rsplit_once('@').ok_or_else(|| {
            Error::invalid_locator(format!(
                "Attribute locator '{}' does not contain an attribute name",
                raw
            ))
        })?;
        if attribute.trim().is_empty() {
            return Err(Error::invalid_locator(format!("'{}' has an empty attribute name", raw)));
        }
        Ok(Self {
            locator: Locator::parse(locator)?,
            attribute: attribute.trim().to_string(),
        })
    }
}

/// One browser console entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
    /// Milliseconds since the epoch, as reported by the remote end
    #[serde(default)]
    pub timestamp: u64,
}

/// Target of a readiness cycle: something to resolve, or already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementTarget {
    Locator(String),
    Element(WebElement),
}

impl From<&str> for ElementTarget {
    fn from(locator: &str) -> Self {
        ElementTarget::Locator(locator.to_string())
    }
}

impl From<String> for ElementTarget {
    fn from(locator: String) -> Self {
        ElementTarget::Locator(locator)
    }
}

impl From<WebElement> for ElementTarget {
    fn from(element: WebElement) -> Self {
        ElementTarget::Element(element)
    }
}
