//! Shared polling primitive
//!
//! Every "wait until X" keyword, and the readiness controllers, poll through
//! [`Wait`]. A predicate is evaluated at least once, the first satisfied result
//! returns immediately, and attempts are never closer together than the poll
//! frequency.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::{Error, Result};

/// Deadline tracker with a fixed tick
#[derive(Debug)]
pub struct Poller {
    deadline: Instant,
    poll_frequency: Duration,
    attempts: u32,
}

impl Poller {
    pub fn new(timeout: Duration, poll_frequency: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            poll_frequency,
            attempts: 0,
        }
    }

    /// Sleep until the next attempt is due.
    ///
    /// Returns `false` once the deadline has passed; the final sleep is cut
    /// short at the deadline so one more attempt can still land in time.
    pub async fn tick(&mut self) -> bool {
        self.attempts += 1;
        let now = Instant::now();
        if now >= self.deadline {
            return false;
        }
        let wake = (now + self.poll_frequency).min(self.deadline);
        sleep(wake - now).await;
        true
    }

    /// Number of completed ticks
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Poll a condition until it holds or the timeout elapses
#[derive(Debug, Clone)]
pub struct Wait {
    timeout: Duration,
    poll_frequency: Duration,
    message: String,
}

impl Wait {
    pub fn new(timeout: Duration, poll_frequency: Duration) -> Self {
        Self {
            timeout,
            poll_frequency,
            message: String::new(),
        }
    }

    /// Message carried by the [`Error::Timeout`] raised on expiry
    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = message.into();
        self
    }

    /// Poll `condition` until it yields `Some`.
    ///
    /// Element-not-found and stale-element errors count as "not yet"; any other
    /// error ends the wait and is returned as is.
    pub async fn until_some<T, F, Fut>(&self, mut condition: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let mut poller = Poller::new(self.timeout, self.poll_frequency);
        let mut last_transient: Option<Error> = None;

        loop {
            match condition().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    trace!("Wait: ignoring transient error: {}", e);
                    last_transient = Some(e);
                }
                Err(e) => return Err(e),
            }

            if !poller.tick().await {
                break;
            }
        }

        let mut message = self.message.clone();
        if let Some(cause) = last_transient {
            if message.is_empty() {
                message = cause.to_string();
            }
        }
        Err(Error::timeout(message))
    }

    /// Poll until `condition` returns `true`
    pub async fn until<F, Fut>(&self, mut condition: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.until_some(|| {
            let fut = condition();
            async move { Ok(fut.await?.then_some(())) }
        })
        .await
    }

    /// Poll until `condition` returns `false`
    pub async fn until_not<F, Fut>(&self, mut condition: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.until_some(|| {
            let fut = condition();
            async move { Ok((!fut.await?).then_some(())) }
        })
        .await
    }

    /// Poll until `condition` yields a truthy script value, and return it
    pub async fn until_truthy<F, Fut>(&self, mut condition: F) -> Result<Value>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        self.until_some(|| {
            let fut = condition();
            async move {
                let value = fut.await?;
                Ok(is_truthy(&value).then_some(value))
            }
        })
        .await
    }
}

/// JavaScript truthiness of a value returned from the browser
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
