//! Page readiness
//!
//! The cycle every action keyword runs after touching the browser:
//!
//! 1. wait for a replaced document to settle (stale `html` root check);
//! 2. wait for document readiness, then run the request's readiness script
//!    once and keep what it calls back with;
//! 3. run the registered page-ready keywords;
//! 4. wait for AngularJS to go idle.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use super::framework::{not_ready_message, FrameworkReadiness};
use super::hooks::{KeywordRunner, PageReadyHooks};
use super::scripts;
use super::{
    apply_script_timeout, current_script_timeout, HookResult, ReadinessOutcome, ReadinessRequest,
};
use crate::config::SessionConfig;
use crate::timeout::{format_timeout, normalize};
use crate::wait::{Poller, Wait};
use crate::webdriver::{ElementTarget, Locator, WebDriver, WebElement};
use crate::Result;

#[derive(Debug, Clone)]
pub struct PageReadiness {
    driver: Arc<dyn WebDriver>,
    config: Arc<SessionConfig>,
    hooks: PageReadyHooks,
    runner: Arc<dyn KeywordRunner>,
    framework: FrameworkReadiness,
}

impl PageReadiness {
    pub fn new(
        driver: Arc<dyn WebDriver>,
        config: Arc<SessionConfig>,
        hooks: PageReadyHooks,
        runner: Arc<dyn KeywordRunner>,
    ) -> Self {
        let framework = FrameworkReadiness::new(driver.clone(), config.clone());
        Self {
            driver,
            config,
            hooks,
            runner,
            framework,
        }
    }

    pub fn hooks(&self) -> &PageReadyHooks {
        &self.hooks
    }

    pub fn framework(&self) -> &FrameworkReadiness {
        &self.framework
    }

    /// Run one page-readiness cycle.
    ///
    /// Only a target that cannot be found (or parsed) fails the call;
    /// everything else is swallowed and logged.
    #[instrument(skip(self, request), fields(skip_stale_check = request.skip_stale_check()))]
    pub async fn wait_until_page_ready(&self, request: ReadinessRequest) -> Result<ReadinessOutcome> {
        if !self.config.block_until_page_ready {
            return Ok(ReadinessOutcome {
                response: request.default_response().cloned(),
                hooks: Vec::new(),
            });
        }

        let driver: Arc<dyn WebDriver> = request
            .browser()
            .cloned()
            .unwrap_or_else(|| self.driver.clone());
        let driver = driver.as_ref();

        let default_timeout = if request.skip_stale_check() {
            self.config.implicit_wait_duration()
        } else {
            self.config.timeout_duration()
        };
        let timeout = normalize(request.timeout().cloned(), default_timeout).unwrap_or_else(|e| {
            warn!("{}, using {}", e, format_timeout(default_timeout));
            default_timeout
        });

        let element = match request.target() {
            Some(target) => Some(resolve_target(driver, target).await?),
            None => None,
        };

        let prior = current_script_timeout(driver, self.config.timeout_duration()).await;
        apply_script_timeout(driver, timeout).await;

        if !request.skip_stale_check() {
            self.wait_for_stable_document(driver, timeout).await;
        }
        let ensure_jq = self.config.ensure_jq && !request.skip_stale_check();
        self.wait_for_document_ready(driver, timeout, ensure_jq).await;
        let response = self
            .run_readiness_script(driver, &request, element.as_ref())
            .await
            .or_else(|| request.default_response().cloned());

        apply_script_timeout(driver, prior).await;

        let hooks = self.run_hooks().await;

        self.framework
            .settle(driver, timeout, &not_ready_message(timeout))
            .await;

        Ok(ReadinessOutcome { response, hooks })
    }

    /// Wait until the `html` root stops being replaced.
    ///
    /// A root that goes stale between two polls means the document was
    /// swapped; the new root is captured and watched in turn.
    async fn wait_for_stable_document(&self, driver: &dyn WebDriver, timeout: Duration) {
        let html = match Locator::parse("tag=html") {
            Ok(locator) => locator,
            Err(e) => {
                debug!("Stale check skipped: {}", e);
                return;
            }
        };

        let mut root = match driver.find_element(&html).await {
            Ok(root) => root,
            Err(e) => {
                debug!("Stale check skipped, no document root: {}", e);
                return;
            }
        };
        sleep(self.config.breath_delay()).await;

        let mut poller = Poller::new(timeout, self.config.poll_interval());
        while poller.tick().await {
            match driver.is_stale(&root).await {
                Ok(false) => return,
                Ok(true) => {
                    debug!("Document replaced, watching the new root");
                    match driver.find_element(&html).await {
                        Ok(fresh) => root = fresh,
                        Err(e) => debug!("New document root not available yet: {}", e),
                    }
                }
                Err(e) => {
                    debug!("Stale check failed: {}", e);
                    return;
                }
            }
        }
        debug!(
            "Document still changing after {} ({} checks)",
            format_timeout(timeout),
            poller.attempts()
        );
    }

    async fn wait_for_document_ready(&self, driver: &dyn WebDriver, timeout: Duration, ensure_jq: bool) {
        let script = scripts::document_ready(ensure_jq);
        let script = script.as_str();
        let wait = Wait::new(timeout, self.config.poll_interval())
            .with_message(format!("Document was not ready in {}", format_timeout(timeout)));

        if let Err(e) = wait
            .until_truthy(move || driver.execute_async_script(script, vec![]))
            .await
        {
            debug!("{}", e);
        }
    }

    async fn run_readiness_script(
        &self,
        driver: &dyn WebDriver,
        request: &ReadinessRequest,
        element: Option<&WebElement>,
    ) -> Option<Value> {
        let script = scripts::compose(request.script());
        let args = element.map(|el| vec![el.to_json()]).unwrap_or_default();

        match driver.execute_async_script(&script, args).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Readiness script did not complete: {}", e);
                None
            }
        }
    }

    async fn run_hooks(&self) -> Vec<HookResult> {
        let names = self.hooks.snapshot().await;
        let mut results = Vec::with_capacity(names.len());

        for name in names {
            let outcome = match self.runner.run_keyword(&name).await {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!("Page ready keyword '{}' failed: {}", name, e);
                    Err(e.to_string())
                }
            };
            results.push(HookResult { name, outcome });
        }

        results
    }
}

async fn resolve_target(driver: &dyn WebDriver, target: &ElementTarget) -> Result<WebElement> {
    match target {
        ElementTarget::Element(element) => Ok(element.clone()),
        ElementTarget::Locator(raw) => driver.find_element(&Locator::parse(raw)?).await,
    }
}
