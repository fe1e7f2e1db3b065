//! W3C WebDriver HTTP client
//!
//! Speaks the W3C WebDriver wire protocol to a remote end (chromedriver,
//! geckodriver, a Selenium grid) over `reqwest`.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::traits::WebDriver;
use super::types::{Locator, LogEntry, WebElement};
use crate::Error;

/// WebDriver client bound to one session
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    http: reqwest::Client,
    /// Remote end base URL (e.g., "http://localhost:4444")
    base_url: String,
    session_id: String,
}

impl WebDriverClient {
    /// Start a new session on the remote end
    ///
    /// # Arguments
    /// * `base_url` - Remote end URL (e.g., "http://localhost:4444")
    /// * `capabilities` - `alwaysMatch` capabilities object
    pub async fn new_session(base_url: &str, capabilities: Value) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        info!("Creating WebDriver session at {}", base_url);
        let response = http
            .post(format!("{}/session", base_url))
            .json(&json!({ "capabilities": { "alwaysMatch": capabilities } }))
            .send()
            .await?;
        let value = Self::unwrap_response(response).await?;

        let session_id = value
            .get("sessionId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::webdriver("session not created", "response carried no sessionId"))?
            .to_string();
        debug!("WebDriver session created: {}", session_id);

        Ok(Self {
            http,
            base_url,
            session_id,
        })
    }

    /// Attach to an existing session
    pub fn attach<S: Into<String>>(base_url: &str, session_id: S) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id: session_id.into(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// End the session
    pub async fn quit(&self) -> Result<(), Error> {
        info!("Deleting WebDriver session {}", self.session_id);
        self.command(Method::DELETE, "", None).await?;
        Ok(())
    }

    /// Send a session-scoped command and return its `value`
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, Error> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        debug!("WebDriver {} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        Self::unwrap_response(response).await
    }

    async fn unwrap_response(response: reqwest::Response) -> Result<Value, Error> {
        let status = response.status();
        let body: Value = response.json().await?;
        let value = body.get("value").cloned().unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(value);
        }

        let error = value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
            .to_string();
        let message = value
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        Err(map_w3c_error(&error, message))
    }

    fn element_path(element: &WebElement, suffix: &str) -> String {
        format!("/element/{}{}", element.id(), suffix)
    }

    fn parse_element(value: &Value, locator: &Locator) -> Result<WebElement, Error> {
        WebElement::from_json(value).ok_or_else(|| Error::element_not_found(locator.raw()))
    }
}

/// Map a W3C error code onto the crate's error taxonomy
pub fn map_w3c_error(error: &str, message: String) -> Error {
    match error {
        "no such element" => Error::element_not_found(message),
        "stale element reference" => Error::stale_element(message),
        "script timeout" | "timeout" => Error::script_timeout(message),
        "invalid session id" | "session not created" => Error::no_active_session(message),
        "javascript error" => Error::script_execution_failed(message),
        _ => Error::webdriver(error, message),
    }
}

/// W3C action sequence: move to an offset from the element's center, then
/// press and release the primary button
fn pointer_click(element: &WebElement, x_offset: i64, y_offset: i64) -> Value {
    json!({
        "actions": [{
            "type": "pointer",
            "id": "mouse",
            "parameters": { "pointerType": "mouse" },
            "actions": [
                {
                    "type": "pointerMove",
                    "duration": 0,
                    "origin": element.to_json(),
                    "x": x_offset,
                    "y": y_offset
                },
                { "type": "pointerDown", "button": 0 },
                { "type": "pointerUp", "button": 0 }
            ]
        }]
    })
}

#[async_trait]
impl WebDriver for WebDriverClient {
    async fn find_element(&self, locator: &Locator) -> Result<WebElement, Error> {
        let (using, value) = locator.to_w3c();
        let found = self
            .command(Method::POST, "/element", Some(json!({ "using": using, "value": value })))
            .await
            .map_err(|e| match e {
                Error::ElementNotFound(_) => Error::element_not_found(locator.raw()),
                other => other,
            })?;
        Self::parse_element(&found, locator)
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<WebElement>, Error> {
        let (using, value) = locator.to_w3c();
        let found = self
            .command(Method::POST, "/elements", Some(json!({ "using": using, "value": value })))
            .await?;

        Ok(found
            .as_array()
            .map(|items| items.iter().filter_map(WebElement::from_json).collect())
            .unwrap_or_default())
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn execute_async_script(&self, script: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.command(
            Method::POST,
            "/execute/async",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn script_timeout(&self) -> Result<Duration, Error> {
        let timeouts = self.command(Method::GET, "/timeouts", None).await?;
        match timeouts.get("script") {
            Some(Value::Number(ms)) => Ok(Duration::from_millis(ms.as_u64().unwrap_or(0))),
            // null means "never time out"
            Some(Value::Null) => Ok(Duration::from_secs(u32::MAX as u64)),
            _ => Err(Error::webdriver("unknown error", "timeouts carried no script value")),
        }
    }

    async fn set_script_timeout(&self, timeout: Duration) -> Result<(), Error> {
        self.command(
            Method::POST,
            "/timeouts",
            Some(json!({ "script": timeout.as_millis() as u64 })),
        )
        .await?;
        Ok(())
    }

    async fn is_stale(&self, element: &WebElement) -> Result<bool, Error> {
        match self
            .command(Method::GET, &Self::element_path(element, "/name"), None)
            .await
        {
            Ok(_) => Ok(false),
            Err(Error::StaleElement(_)) | Err(Error::ElementNotFound(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    async fn is_displayed(&self, element: &WebElement) -> Result<bool, Error> {
        let value = self
            .command(Method::GET, &Self::element_path(element, "/displayed"), None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_selected(&self, element: &WebElement) -> Result<bool, Error> {
        let value = self
            .command(Method::GET, &Self::element_path(element, "/selected"), None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn get_attribute(&self, element: &WebElement, name: &str) -> Result<Option<String>, Error> {
        let value = self
            .command(
                Method::GET,
                &Self::element_path(element, &format!("/attribute/{}", name)),
                None,
            )
            .await?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    async fn tag_name(&self, element: &WebElement) -> Result<String, Error> {
        let value = self
            .command(Method::GET, &Self::element_path(element, "/name"), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_ascii_lowercase())
    }

    async fn click(&self, element: &WebElement) -> Result<(), Error> {
        self.command(Method::POST, &Self::element_path(element, "/click"), Some(json!({})))
            .await?;
        Ok(())
    }

    async fn click_at(&self, element: &WebElement, x_offset: i64, y_offset: i64) -> Result<(), Error> {
        self.command(Method::POST, "/actions", Some(pointer_click(element, x_offset, y_offset)))
            .await?;
        self.command(Method::DELETE, "/actions", None).await?;
        Ok(())
    }

    async fn clear(&self, element: &WebElement) -> Result<(), Error> {
        self.command(Method::POST, &Self::element_path(element, "/clear"), Some(json!({})))
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &WebElement, text: &str) -> Result<(), Error> {
        self.command(
            Method::POST,
            &Self::element_path(element, "/value"),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, Error> {
        let value = self.command(Method::GET, "/url", None).await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                warn!("WebDriver returned a non-string URL: {}", value);
                Error::webdriver("unknown error", "current URL is not a string")
            })
    }

    /// Uses the Selenium log extension; remote ends without it yield an error
    async fn browser_logs(&self) -> Result<Vec<LogEntry>, Error> {
        let value = self
            .command(Method::POST, "/se/log", Some(json!({ "type": "browser" })))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn navigate(&self, url: &str) -> Result<(), Error> {
        info!("Navigating to {}", url);
        self.command(Method::POST, "/url", Some(json!({ "url": url }))).await?;
        Ok(())
    }
}
