//! Mock WebDriver implementation for testing
//!
//! `MockBrowser` is an in-memory page that understands the scripts the
//! readiness core injects: it can pretend to run AngularJS with outstanding
//! requests, load slowly, replace its document, and fail on demand.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::traits::WebDriver;
use super::types::{Locator, LogEntry, Strategy, WebElement};
use crate::Error;

/// Failure the mock can inject into script execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFault {
    /// Script throws (e.g. a JavaScript error mid-bootstrap)
    ScriptError(String),
    /// Script never calls back
    ScriptTimeout,
    /// Session is gone
    NoSession,
}

impl MockFault {
    fn to_error(&self) -> Error {
        match self {
            MockFault::ScriptError(msg) => Error::script_execution_failed(msg.clone()),
            MockFault::ScriptTimeout => Error::script_timeout("asynchronous script timed out"),
            MockFault::NoSession => Error::no_active_session("session deleted"),
        }
    }
}

/// Page change applied when due (scheduled) or on click
#[derive(Debug, Clone)]
pub enum MockMutation {
    /// Full navigation: new URL, new document
    Navigate(String),
    /// History API URL change, same document
    SetUrl(String),
    /// Document replaced, URL unchanged
    ReplaceDocument,
    /// AngularJS has outstanding requests for this long
    PendingRequests(Duration),
    /// `document.readyState` stays `loading` for this long
    Loading(Duration),
    /// Toggle visibility of the element registered under a locator
    SetDisplayed(String, bool),
    /// Set an attribute on the element registered under a locator
    SetAttribute(String, String, String),
    /// Fail the next asynchronous script
    FailNextAsync(MockFault),
    /// Console message at `level`, picked up by the next log read
    ConsoleLog(String, String),
}

/// One script call seen by the mock
#[derive(Debug, Clone)]
pub struct MockScriptCall {
    pub is_async: bool,
    pub script: String,
    pub args: Vec<Value>,
    pub at: Instant,
}

/// Element registered on the mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    tag: String,
    displayed: bool,
    selected: bool,
    attributes: HashMap<String, String>,
}

impl MockElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            displayed: true,
            selected: false,
            attributes: HashMap::new(),
        }
    }

    pub fn displayed(mut self, displayed: bool) -> Self {
        self.displayed = displayed;
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

#[derive(Debug)]
struct ElementSlot {
    id: String,
    element: MockElement,
    clicks: usize,
    offsets: Vec<(i64, i64)>,
    typed: String,
}

#[derive(Debug)]
struct MockState {
    alive: bool,
    url: String,
    angular: bool,
    jquery: bool,
    jquery_injections: usize,
    pending_until: Option<Instant>,
    loading_until: Option<Instant>,
    body_children: usize,
    page_text: String,
    root_id: String,
    elements: HashMap<String, ElementSlot>,
    ids: HashMap<String, String>,
    script_timeout: Duration,
    timeout_history: Vec<Duration>,
    scheduled: Vec<(Instant, MockMutation)>,
    on_click: HashMap<String, Vec<MockMutation>>,
    async_faults: VecDeque<MockFault>,
    persistent_fault: Option<MockFault>,
    script_results: HashMap<String, Value>,
    calls: Vec<MockScriptCall>,
    console: Vec<LogEntry>,
    started: Instant,
}

impl MockState {
    fn new() -> Self {
        Self {
            alive: true,
            url: "about:blank".to_string(),
            angular: false,
            jquery: false,
            jquery_injections: 0,
            pending_until: None,
            loading_until: None,
            body_children: 1,
            page_text: String::new(),
            root_id: new_id(),
            elements: HashMap::new(),
            ids: HashMap::new(),
            script_timeout: Duration::from_secs(30),
            timeout_history: Vec::new(),
            scheduled: Vec::new(),
            on_click: HashMap::new(),
            async_faults: VecDeque::new(),
            persistent_fault: None,
            script_results: HashMap::new(),
            calls: Vec::new(),
            console: Vec::new(),
            started: Instant::now(),
        }
    }

    fn apply_due(&mut self) {
        let now = Instant::now();
        let (due, later): (Vec<_>, Vec<_>) = self
            .scheduled
            .drain(..)
            .partition(|(at, _)| *at <= now);
        self.scheduled = later;
        for (_, mutation) in due {
            self.apply(mutation);
        }
    }

    fn apply(&mut self, mutation: MockMutation) {
        let now = Instant::now();
        match mutation {
            MockMutation::Navigate(url) => {
                self.url = url;
                self.replace_document();
            }
            MockMutation::SetUrl(url) => self.url = url,
            MockMutation::ReplaceDocument => self.replace_document(),
            MockMutation::PendingRequests(d) => self.pending_until = Some(now + d),
            MockMutation::Loading(d) => self.loading_until = Some(now + d),
            MockMutation::SetDisplayed(locator, displayed) => {
                if let Some(slot) = self.elements.get_mut(&locator) {
                    slot.element.displayed = displayed;
                }
            }
            MockMutation::SetAttribute(locator, name, value) => {
                if let Some(slot) = self.elements.get_mut(&locator) {
                    slot.element.attributes.insert(name, value);
                }
            }
            MockMutation::FailNextAsync(fault) => self.async_faults.push_back(fault),
            MockMutation::ConsoleLog(level, message) => {
                let timestamp = now.duration_since(self.started).as_millis() as u64;
                self.console.push(LogEntry {
                    level,
                    message,
                    timestamp,
                });
            }
        }
    }

    /// Every element id handed out so far goes stale
    fn replace_document(&mut self) {
        self.root_id = new_id();
        self.jquery = false;
        self.ids.clear();
        for (locator, slot) in self.elements.iter_mut() {
            slot.id = new_id();
            self.ids.insert(slot.id.clone(), locator.clone());
        }
    }

    fn ensure_alive(&self) -> Result<(), Error> {
        if self.alive {
            Ok(())
        } else {
            Err(MockFault::NoSession.to_error())
        }
    }

    fn slot(&self, element: &WebElement) -> Result<&ElementSlot, Error> {
        self.ids
            .get(element.id())
            .and_then(|locator| self.elements.get(locator))
            .ok_or_else(|| Error::stale_element(element.id().to_string()))
    }

    fn slot_mut(&mut self, element: &WebElement) -> Result<&mut ElementSlot, Error> {
        let locator = self
            .ids
            .get(element.id())
            .cloned()
            .ok_or_else(|| Error::stale_element(element.id().to_string()))?;
        self.elements
            .get_mut(&locator)
            .ok_or_else(|| Error::stale_element(element.id().to_string()))
    }

    fn document_ready(&self) -> bool {
        let loaded = self
            .loading_until
            .map(|until| Instant::now() >= until)
            .unwrap_or(true);
        loaded && self.body_children > 0
    }

    fn click_element(&mut self, element: &WebElement) -> Result<(), Error> {
        let locator = self
            .ids
            .get(element.id())
            .cloned()
            .ok_or_else(|| Error::stale_element(element.id().to_string()))?;
        if let Some(slot) = self.elements.get_mut(&locator) {
            slot.clicks += 1;
            if slot.element.tag == "input"
                && matches!(
                    slot.element.attributes.get("type").map(|s| s.as_str()),
                    Some("checkbox") | Some("radio")
                )
            {
                slot.element.selected = true;
            }
        }
        if let Some(effects) = self.on_click.get(&locator).cloned() {
            for effect in effects {
                self.apply(effect);
            }
        }
        Ok(())
    }

    fn element_arg(&self, args: &[Value]) -> Option<WebElement> {
        args.first().and_then(WebElement::from_json)
    }

    /// Value passed to `cb(...)` inside a script fragment
    fn callback_value(&self, fragment: &str) -> Value {
        let Some(start) = fragment.find("cb(") else {
            return Value::Null;
        };
        let rest = &fragment[start + 3..];
        let arg = rest.split(')').next().unwrap_or("").trim();
        match arg {
            "true" => json!(true),
            "false" => json!(false),
            _ if arg.contains("location.href") => json!(self.url.clone()),
            _ => Value::Null,
        }
    }

    /// Run the side effects of a branch of an injected script
    fn run_fragment(&mut self, fragment: &str, args: &[Value]) -> Value {
        if let Some(element) = self.element_arg(args) {
            if fragment.contains("prop('checked',true)") {
                if let Ok(slot) = self.slot_mut(&element) {
                    slot.element.selected = true;
                    slot.clicks += 1;
                }
            } else if fragment.contains("el.click()") {
                let _ = self.click_element(&element);
            }
        }
        self.callback_value(fragment)
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Mock browser session
#[derive(Debug, Clone)]
pub struct MockBrowser {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrowser {
    /// Plain loaded page at `about:blank`
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::new())),
        }
    }

    /// AngularJS page at `url` with no outstanding requests
    pub async fn angular(url: &str) -> Self {
        let browser = Self::new();
        {
            let mut state = browser.state.lock().await;
            state.url = url.to_string();
            state.angular = true;
        }
        browser
    }

    /// Plain (non-framework) page at `url`
    pub async fn plain(url: &str) -> Self {
        let browser = Self::new();
        browser.state.lock().await.url = url.to_string();
        browser
    }

    pub async fn set_angular(&self, angular: bool) {
        self.state.lock().await.angular = angular;
    }

    pub async fn set_jquery(&self, present: bool) {
        self.state.lock().await.jquery = present;
    }

    pub async fn set_body_children(&self, count: usize) {
        self.state.lock().await.body_children = count;
    }

    pub async fn set_page_text(&self, text: &str) {
        self.state.lock().await.page_text = text.to_string();
    }

    pub async fn set_script_timeout_value(&self, timeout: Duration) {
        self.state.lock().await.script_timeout = timeout;
    }

    /// Kill or revive the session
    pub async fn set_alive(&self, alive: bool) {
        self.state.lock().await.alive = alive;
    }

    /// Apply a mutation right now
    pub async fn apply(&self, mutation: MockMutation) {
        self.state.lock().await.apply(mutation);
    }

    /// Apply a mutation once `after` has elapsed
    pub async fn schedule(&self, after: Duration, mutation: MockMutation) {
        let at = Instant::now() + after;
        self.state.lock().await.scheduled.push((at, mutation));
    }

    /// Apply a mutation every time the element under `locator` is clicked
    pub async fn on_click(&self, locator: &str, mutation: MockMutation) {
        self.state
            .lock()
            .await
            .on_click
            .entry(locator.to_string())
            .or_default()
            .push(mutation);
    }

    /// Register an element findable by exactly this locator text
    pub async fn add_element(&self, locator: &str, element: MockElement) -> WebElement {
        let mut state = self.state.lock().await;
        let id = new_id();
        state.ids.insert(id.clone(), locator.to_string());
        state.elements.insert(
            locator.to_string(),
            ElementSlot {
                id: id.clone(),
                element,
                clicks: 0,
                offsets: Vec::new(),
                typed: String::new(),
            },
        );
        WebElement::new(id)
    }

    /// Fail the next asynchronous script with `fault`
    pub async fn fail_next_async(&self, fault: MockFault) {
        self.state.lock().await.async_faults.push_back(fault);
    }

    /// Fail every asynchronous script with `fault` (None to stop)
    pub async fn fail_all_async(&self, fault: Option<MockFault>) {
        self.state.lock().await.persistent_fault = fault;
    }

    /// Fixed result for an exact script text
    pub async fn set_script_result(&self, script: &str, value: Value) {
        self.state
            .lock()
            .await
            .script_results
            .insert(script.to_string(), value);
    }

    pub async fn script_calls(&self) -> Vec<MockScriptCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of async scripts whose text contains `needle`
    pub async fn async_calls_containing(&self, needle: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.is_async && c.script.contains(needle))
            .count()
    }

    /// Every value passed to `set_script_timeout`, in order
    pub async fn script_timeout_history(&self) -> Vec<Duration> {
        self.state.lock().await.timeout_history.clone()
    }

    pub async fn current_script_timeout(&self) -> Duration {
        self.state.lock().await.script_timeout
    }

    pub async fn clicks(&self, locator: &str) -> usize {
        self.state
            .lock()
            .await
            .elements
            .get(locator)
            .map(|slot| slot.clicks)
            .unwrap_or(0)
    }

    /// Offsets of every pointer click on the element under `locator`
    pub async fn pointer_clicks(&self, locator: &str) -> Vec<(i64, i64)> {
        self.state
            .lock()
            .await
            .elements
            .get(locator)
            .map(|slot| slot.offsets.clone())
            .unwrap_or_default()
    }

    pub async fn typed_text(&self, locator: &str) -> String {
        self.state
            .lock()
            .await
            .elements
            .get(locator)
            .map(|slot| slot.typed.clone())
            .unwrap_or_default()
    }

    pub async fn is_element_selected(&self, locator: &str) -> bool {
        self.state
            .lock()
            .await
            .elements
            .get(locator)
            .map(|slot| slot.element.selected)
            .unwrap_or(false)
    }

    pub async fn jquery_injections(&self) -> usize {
        self.state.lock().await.jquery_injections
    }

    async fn record(&self, is_async: bool, script: &str, args: &[Value]) {
        self.state.lock().await.calls.push(MockScriptCall {
            is_async,
            script: script.to_string(),
            args: args.to_vec(),
            at: Instant::now(),
        });
    }

    /// Emulate the AngularJS `$browser` notification: wait for outstanding requests
    /// (bounded by the script timeout), then take the handler branch.
    async fn run_angular_script(&self, script: &str, args: &[Value]) -> Result<Value, Error> {
        let (angular, wait, script_timeout) = {
            let mut state = self.state.lock().await;
            state.apply_due();
            let wait = state
                .pending_until
                .map(|until| until.saturating_duration_since(Instant::now()))
                .unwrap_or(Duration::ZERO);
            (state.angular, wait, state.script_timeout)
        };

        let else_branch = script.rfind("}else{").map(|i| &script[i..]);
        if !angular {
            return match else_branch {
                Some(fragment) if script.contains("if(window.angular)") => {
                    Ok(self.state.lock().await.run_fragment(fragment, args))
                }
                _ => Err(Error::script_execution_failed("ReferenceError: angular is not defined")),
            };
        }

        if wait > script_timeout {
            tokio::time::sleep(script_timeout).await;
            return Err(Error::script_timeout(format!(
                "asynchronous script timed out after {:?}",
                script_timeout
            )));
        }
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        let handler_start = script
            .find("notifyWhenNoOutstandingRequests(")
            .map(|i| i + "notifyWhenNoOutstandingRequests(".len())
            .unwrap_or(0);
        let handler_end = script.rfind("}else{").unwrap_or(script.len()).max(handler_start);
        let handler = &script[handler_start..handler_end];

        let mut state = self.state.lock().await;
        state.pending_until = None;
        Ok(state.run_fragment(handler, args))
    }
}

#[async_trait]
impl WebDriver for MockBrowser {
    async fn find_element(&self, locator: &Locator) -> Result<WebElement, Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.apply_due();

        if locator.strategy() == Strategy::Tag && locator.value() == "html" {
            return Ok(WebElement::new(state.root_id.clone()));
        }

        state
            .elements
            .get(locator.raw())
            .map(|slot| WebElement::new(slot.id.clone()))
            .ok_or_else(|| Error::element_not_found(locator.raw()))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<WebElement>, Error> {
        match self.find_element(locator).await {
            Ok(element) => Ok(vec![element]),
            Err(Error::ElementNotFound(_)) => Ok(vec![]),
            Err(e) => Err(e),
        }
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.record(false, script, &args).await;
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.apply_due();

        if let Some(value) = state.script_results.get(script) {
            return Ok(value.clone());
        }

        if script.contains("location.href") {
            return Ok(json!(state.url.clone()));
        }
        if script.contains("screen.width") {
            return Ok(json!([1920, 1080]));
        }
        if script.contains("innerText") {
            let needle = args.first().and_then(|v| v.as_str()).unwrap_or_default();
            return Ok(json!(state.page_text.contains(needle)));
        }
        if script.contains("dblclick") {
            if let Some(element) = state.element_arg(&args) {
                state.slot_mut(&element)?.clicks += 2;
            }
            return Ok(Value::Null);
        }
        if script.contains("option") {
            if let Some(element) = state.element_arg(&args) {
                state.slot(&element)?;
            }
            return Ok(json!(1));
        }
        if let Some(element) = state.element_arg(&args) {
            // scrollIntoView, submit() and friends only need a live element
            state.slot(&element)?;
        }
        Ok(Value::Null)
    }

    async fn execute_async_script(&self, script: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.record(true, script, &args).await;
        let fault = {
            let mut state = self.state.lock().await;
            state.ensure_alive()?;
            state.apply_due();
            state
                .async_faults
                .pop_front()
                .or_else(|| state.persistent_fault.clone())
        };
        if let Some(fault) = fault {
            if fault == MockFault::ScriptTimeout {
                let timeout = self.state.lock().await.script_timeout;
                tokio::time::sleep(timeout).await;
            }
            return Err(fault.to_error());
        }

        {
            let state = self.state.lock().await;
            if let Some(value) = state.script_results.get(script) {
                return Ok(value.clone());
            }
        }

        if script.contains("notifyWhenNoOutstandingRequests") {
            return self.run_angular_script(script, &args).await;
        }

        let mut state = self.state.lock().await;
        state.apply_due();
        if script.contains("document.readyState") {
            if script.contains("jquery") && !state.jquery {
                state.jquery = true;
                state.jquery_injections += 1;
            }
            return Ok(json!(state.document_ready()));
        }
        Ok(Value::Null)
    }

    async fn script_timeout(&self) -> Result<Duration, Error> {
        let state = self.state.lock().await;
        state.ensure_alive()?;
        Ok(state.script_timeout)
    }

    async fn set_script_timeout(&self, timeout: Duration) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.script_timeout = timeout;
        state.timeout_history.push(timeout);
        Ok(())
    }

    async fn is_stale(&self, element: &WebElement) -> Result<bool, Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.apply_due();
        if element.id() == state.root_id {
            return Ok(false);
        }
        Ok(!state.ids.contains_key(element.id()))
    }

    async fn is_displayed(&self, element: &WebElement) -> Result<bool, Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.apply_due();
        Ok(state.slot(element)?.element.displayed)
    }

    async fn is_selected(&self, element: &WebElement) -> Result<bool, Error> {
        let state = self.state.lock().await;
        state.ensure_alive()?;
        Ok(state.slot(element)?.element.selected)
    }

    async fn get_attribute(&self, element: &WebElement, name: &str) -> Result<Option<String>, Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.apply_due();
        Ok(state.slot(element)?.element.attributes.get(name).cloned())
    }

    async fn tag_name(&self, element: &WebElement) -> Result<String, Error> {
        let state = self.state.lock().await;
        state.ensure_alive()?;
        if element.id() == state.root_id {
            return Ok("html".to_string());
        }
        Ok(state.slot(element)?.element.tag.clone())
    }

    async fn click(&self, element: &WebElement) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.apply_due();
        state.click_element(element)
    }

    async fn click_at(&self, element: &WebElement, x_offset: i64, y_offset: i64) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.apply_due();
        state.slot_mut(element)?.offsets.push((x_offset, y_offset));
        state.click_element(element)
    }

    async fn clear(&self, element: &WebElement) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.slot_mut(element)?.typed.clear();
        Ok(())
    }

    async fn send_keys(&self, element: &WebElement, text: &str) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.slot_mut(element)?.typed.push_str(text);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.apply_due();
        Ok(state.url.clone())
    }

    /// Drains the console, like a remote end's log endpoint
    async fn browser_logs(&self) -> Result<Vec<LogEntry>, Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.apply_due();
        Ok(std::mem::take(&mut state.console))
    }

    async fn navigate(&self, url: &str) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.ensure_alive()?;
        state.apply(MockMutation::Navigate(url.to_string()));
        Ok(())
    }
}
