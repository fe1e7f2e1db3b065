//! JavaScript keywords

use serde_json::Value;
use tracing::{debug, warn};

use super::KeywordContext;
use crate::readiness::scripts::sync;
use crate::webdriver::LogEntry;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct JavascriptKeywords {
    ctx: KeywordContext,
}

impl JavascriptKeywords {
    pub fn new(ctx: KeywordContext) -> Self {
        Self { ctx }
    }

    /// Join `code` and execute it as a synchronous script
    pub async fn execute_javascript(&self, code: &[&str]) -> Result<Value> {
        let script = code.concat();
        debug!("Executing JavaScript:\n{}", script);
        self.ctx.driver().execute_script(&script, vec![]).await
    }

    /// Join `code` and execute it as an asynchronous script; the callback is
    /// `arguments[arguments.length-1]`
    pub async fn execute_async_javascript(&self, code: &[&str]) -> Result<Value> {
        let script = code.concat();
        debug!("Executing Asynchronous JavaScript:\n{}", script);
        self.ctx.driver().execute_async_script(&script, vec![]).await
    }

    /// Screen width and height in CSS pixels
    pub async fn get_screen_size(&self) -> Result<(u64, u64)> {
        let size = self
            .ctx
            .driver()
            .execute_script(sync::SCREEN_SIZE, vec![])
            .await?;
        match size.as_array().map(Vec::as_slice) {
            Some([width, height]) => match (width.as_u64(), height.as_u64()) {
                (Some(width), Some(height)) => Ok((width, height)),
                _ => Err(Error::internal(format!("Unexpected screen size {}", size))),
            },
            _ => Err(Error::internal(format!("Unexpected screen size {}", size))),
        }
    }

    /// Console entries since the last read. Verbosity follows the session's
    /// logging preferences.
    pub async fn get_browser_logs(&self) -> Result<Vec<LogEntry>> {
        self.ctx.driver().browser_logs().await
    }

    /// Log console entries as one warning, prefixed with `label`.
    ///
    /// Entries whose message contains any of `excludes` are dropped. Returns
    /// the entries that were reported.
    pub async fn warn_any_javascript_errors(&self, excludes: &[&str], label: &str) -> Result<Vec<LogEntry>> {
        let errors: Vec<LogEntry> = self
            .get_browser_logs()
            .await?
            .into_iter()
            .filter(|entry| !excludes.iter().any(|e| entry.message.contains(*e)))
            .collect();

        if !errors.is_empty() {
            let messages: Vec<&str> = errors.iter().map(|entry| entry.message.as_str()).collect();
            warn!("{} {:?}", label, messages);
        }
        Ok(errors)
    }
}
