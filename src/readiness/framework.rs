//! Framework readiness
//!
//! Blocks until AngularJS reports no outstanding asynchronous work. Pages
//! without the framework resolve through the same script immediately.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument};

use super::scripts::{self, ScriptParts};
use super::{apply_script_timeout, current_script_timeout, FrameworkOutcome, SuppressedError};
use crate::config::SessionConfig;
use crate::timeout::{format_timeout, normalize, TimeoutArg};
use crate::wait::Wait;
use crate::webdriver::WebDriver;

const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct FrameworkReadiness {
    driver: Arc<dyn WebDriver>,
    config: Arc<SessionConfig>,
}

impl FrameworkReadiness {
    pub fn new(driver: Arc<dyn WebDriver>, config: Arc<SessionConfig>) -> Self {
        Self { driver, config }
    }

    /// Wait until AngularJS has no outstanding requests.
    ///
    /// `timeout` defaults to `implicit_wait`; `error` replaces the default
    /// "AngularJS is not ready in ..." message, which is only ever logged.
    /// Never fails: timeouts and script errors end up in
    /// [`FrameworkOutcome::suppressed`].
    #[instrument(skip(self, timeout, error))]
    pub async fn wait_until_angular_ready(
        &self,
        timeout: Option<TimeoutArg>,
        error: Option<&str>,
    ) -> FrameworkOutcome {
        let default = self.config.implicit_wait_duration();
        let timeout = normalize(timeout, default).unwrap_or_else(|e| {
            debug!("{}, using {}", e, format_timeout(default));
            default
        });
        let message = error
            .map(str::to_string)
            .unwrap_or_else(|| not_ready_message(timeout));

        self.settle(self.driver.as_ref(), timeout, &message).await
    }

    /// Run the framework check against `driver` with the script timeout raised to
    /// `timeout`, restoring the previous value afterwards.
    pub(crate) async fn settle(
        &self,
        driver: &dyn WebDriver,
        timeout: Duration,
        message: &str,
    ) -> FrameworkOutcome {
        let prior = current_script_timeout(driver, self.config.timeout_duration()).await;
        apply_script_timeout(driver, timeout).await;

        let outcome = self.poll_framework(driver, timeout, message).await;

        apply_script_timeout(driver, prior).await;
        outcome
    }

    /// Both attempts share one deadline, so a late failure leaves the retry
    /// only what remains of `timeout`.
    async fn poll_framework(&self, driver: &dyn WebDriver, timeout: Duration, message: &str) -> FrameworkOutcome {
        let script = scripts::compose(&ScriptParts::framework_check());
        let script = script.as_str();
        let deadline = Instant::now() + timeout;
        let mut outcome = FrameworkOutcome::default();

        for attempt in 1..=MAX_ATTEMPTS {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if attempt > 1 {
                if remaining.is_zero() {
                    debug!("{}: no time left for attempt {}", message, attempt);
                    break;
                }
                apply_script_timeout(driver, remaining).await;
            }

            outcome.attempts = attempt;
            let wait = Wait::new(remaining, self.config.poll_interval()).with_message(message);
            match wait
                .until_truthy(move || driver.execute_async_script(script, vec![]))
                .await
            {
                Ok(_) => {
                    outcome.settled = true;
                    break;
                }
                Err(e) if e.is_timeout() => {
                    debug!("{} (attempt {}): {}", message, attempt, e);
                    outcome.suppressed.push(SuppressedError::Timeout {
                        attempt,
                        message: message.to_string(),
                    });
                    break;
                }
                Err(e) => {
                    debug!("Framework check failed (attempt {}): {}", attempt, e);
                    outcome.suppressed.push(SuppressedError::Script {
                        attempt,
                        message: e.to_string(),
                    });
                    if attempt < MAX_ATTEMPTS {
                        sleep(self.config.breath_delay()).await;
                    }
                }
            }
        }

        outcome
    }
}

pub(crate) fn not_ready_message(timeout: Duration) -> String {
    format!("AngularJS is not ready in {}", format_timeout(timeout))
}
