//! Location keywords

use tracing::debug;

use super::KeywordContext;
use crate::readiness::scripts::{self, sync, ScriptParts};
use crate::readiness::{apply_script_timeout, current_script_timeout};
use crate::Result;

#[derive(Debug, Clone)]
pub struct LocationKeywords {
    ctx: KeywordContext,
}

impl LocationKeywords {
    pub fn new(ctx: KeywordContext) -> Self {
        Self { ctx }
    }

    /// Current URL.
    ///
    /// Asks AngularJS first (after it goes idle), then the document, then the
    /// driver itself.
    pub async fn get_location(&self) -> Result<String> {
        if let Some(url) = self.from_readiness_script().await {
            return Ok(url);
        }

        match self
            .ctx
            .driver()
            .execute_script(sync::LOCATION, vec![])
            .await
        {
            Ok(value) => {
                if let Some(url) = value.as_str() {
                    return Ok(url.to_string());
                }
            }
            Err(e) => debug!("Location script failed: {}", e),
        }

        self.ctx.driver().current_url().await
    }

    async fn from_readiness_script(&self) -> Option<String> {
        let driver = self.ctx.driver();
        let timeout = self.ctx.config().timeout_duration();
        let prior = current_script_timeout(driver, timeout).await;
        apply_script_timeout(driver, timeout).await;

        let script = scripts::compose(&ScriptParts::location());
        let result = driver.execute_async_script(&script, vec![]).await;

        apply_script_timeout(driver, prior).await;

        match result {
            Ok(value) => value.as_str().map(str::to_string),
            Err(e) => {
                debug!("Location readiness script failed: {}", e);
                None
            }
        }
    }
}
