//! Keyword library entry point
//!
//! [`Library`] owns the session handles and hands out the keyword groups.

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::SessionConfig;
use crate::keywords::{
    ElementKeywords, FormKeywords, JavascriptKeywords, KeywordContext, LocationKeywords,
    SelectKeywords, WaitingKeywords,
};
use crate::readiness::{
    FrameworkOutcome, FrameworkReadiness, KeywordRegistry, KeywordRunner, PageReadiness,
    PageReadyHooks, ReadinessRequest,
};
use crate::timeout::TimeoutArg;
use crate::webdriver::{WebDriver, WebDriverClient};
use crate::Result;

#[derive(Debug, Clone)]
pub struct Library {
    driver: Arc<dyn WebDriver>,
    config: Arc<SessionConfig>,
    hooks: PageReadyHooks,
    page: PageReadiness,
    registry: Option<KeywordRegistry>,
}

impl Library {
    /// Library whose page-ready keywords come from its own [`KeywordRegistry`]
    pub fn new(driver: Arc<dyn WebDriver>, config: SessionConfig) -> Self {
        let registry = KeywordRegistry::new();
        let mut library = Self::with_runner(driver, config, Arc::new(registry.clone()));
        library.registry = Some(registry);
        library
    }

    /// Library whose page-ready keywords are run by an external runner
    pub fn with_runner(
        driver: Arc<dyn WebDriver>,
        config: SessionConfig,
        runner: Arc<dyn KeywordRunner>,
    ) -> Self {
        let config = Arc::new(config);
        let hooks = PageReadyHooks::new();
        let page = PageReadiness::new(driver.clone(), config.clone(), hooks.clone(), runner);
        Self {
            driver,
            config,
            hooks,
            page,
            registry: None,
        }
    }

    /// Start a WebDriver session at `remote_url` and wrap it
    pub async fn connect(remote_url: &str, capabilities: Value, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let client = WebDriverClient::new_session(remote_url, capabilities).await?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn driver(&self) -> Arc<dyn WebDriver> {
        self.driver.clone()
    }

    /// Keywords available to page-ready hooks, unless an external runner is used
    pub fn registry(&self) -> Option<&KeywordRegistry> {
        self.registry.as_ref()
    }

    pub fn page(&self) -> &PageReadiness {
        &self.page
    }

    pub fn framework(&self) -> &FrameworkReadiness {
        self.page.framework()
    }

    pub fn elements(&self) -> ElementKeywords {
        ElementKeywords::new(self.context())
    }

    pub fn forms(&self) -> FormKeywords {
        FormKeywords::new(self.context())
    }

    pub fn selects(&self) -> SelectKeywords {
        SelectKeywords::new(self.context())
    }

    pub fn location(&self) -> LocationKeywords {
        LocationKeywords::new(self.context())
    }

    pub fn waiting(&self) -> WaitingKeywords {
        WaitingKeywords::new(self.context())
    }

    pub fn javascript(&self) -> JavascriptKeywords {
        JavascriptKeywords::new(self.context())
    }

    /// Run `name` at the end of every page-readiness cycle
    pub async fn register_page_ready_keyword(&self, name: &str) {
        self.hooks.register(name).await;
    }

    /// Stop running `name`; fails if it was never registered
    pub async fn remove_page_ready_keyword(&self, name: &str) -> Result<()> {
        self.hooks.remove(name).await
    }

    pub async fn wait_until_angular_ready(
        &self,
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> FrameworkOutcome {
        self.framework().wait_until_angular_ready(timeout, error).await
    }

    /// Navigate to `url` and wait until the page and AngularJS are ready
    #[instrument(skip(self))]
    pub async fn open_browser(&self, url: &str) -> Result<()> {
        info!("Opening url '{}'", url);
        self.driver.navigate(url).await?;
        self.page.wait_until_page_ready(ReadinessRequest::new()).await?;
        Ok(())
    }

    fn context(&self) -> KeywordContext {
        KeywordContext::new(self.driver.clone(), self.config.clone(), self.page.clone())
    }
}
