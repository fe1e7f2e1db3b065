//! Page-ready hooks
//!
//! Keywords registered here run at the end of every page-readiness cycle, in
//! registration order.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{Error, Result};

/// Runs a keyword by name on behalf of the page-readiness controller
#[async_trait]
pub trait KeywordRunner: Send + Sync + fmt::Debug {
    async fn run_keyword(&self, name: &str) -> Result<Value>;
}

/// Ordered list of page-ready keyword names.
///
/// Cloning shares the list. Duplicates are allowed.
#[derive(Debug, Clone, Default)]
pub struct PageReadyHooks {
    names: Arc<RwLock<Vec<String>>>,
}

impl PageReadyHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a keyword to run after every page-readiness cycle
    pub async fn register<S: Into<String>>(&self, name: S) {
        let name = name.into();
        info!("Registering page ready keyword '{}'", name);
        self.names.write().await.push(name);
    }

    /// Remove the first registration of `name`
    pub async fn remove(&self, name: &str) -> Result<()> {
        let mut names = self.names.write().await;
        let position = names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::HookNotRegistered(name.to_string()))?;
        names.remove(position);
        info!("Removed page ready keyword '{}'", name);
        Ok(())
    }

    /// Copy of the current list; a running cycle only sees this copy
    pub async fn snapshot(&self) -> Vec<String> {
        self.names.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.names.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.names.read().await.is_empty()
    }
}

type KeywordFn = Arc<dyn Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Closure-backed [`KeywordRunner`]
#[derive(Clone, Default)]
pub struct KeywordRegistry {
    keywords: Arc<RwLock<HashMap<String, KeywordFn>>>,
}

impl fmt::Debug for KeywordRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordRegistry").finish_non_exhaustive()
    }
}

impl KeywordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the keyword `name`
    pub async fn register<F, Fut>(&self, name: &str, keyword: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let keyword: KeywordFn = Arc::new(move || keyword().boxed());
        self.keywords.write().await.insert(name.to_string(), keyword);
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.keywords.read().await.contains_key(name)
    }
}

#[async_trait]
impl KeywordRunner for KeywordRegistry {
    async fn run_keyword(&self, name: &str) -> Result<Value> {
        let keyword = self
            .keywords
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::KeywordNotFound(name.to_string()))?;
        debug!("Running keyword '{}'", name);
        keyword().await
    }
}
