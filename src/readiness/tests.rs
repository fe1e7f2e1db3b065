//! Readiness controller tests against the mock browser

use super::*;
use crate::config::SessionConfig;
use crate::webdriver::{MockBrowser, MockElement, MockFault, MockMutation};
use crate::Error;
use serde_json::json;
use std::time::Instant;

const NOTIFY: &str = "notifyWhenNoOutstandingRequests";

fn fast_config() -> Arc<SessionConfig> {
    Arc::new(
        SessionConfig::builder()
            .timeout(1.0)
            .implicit_wait(1.0)
            .poll_frequency(0.02)
            .browser_breath_delay(0.05)
            .build()
            .unwrap(),
    )
}

fn page_readiness(browser: &MockBrowser, config: Arc<SessionConfig>) -> (PageReadiness, KeywordRegistry) {
    let registry = KeywordRegistry::new();
    let page = PageReadiness::new(
        Arc::new(browser.clone()),
        config,
        PageReadyHooks::new(),
        Arc::new(registry.clone()),
    );
    (page, registry)
}

#[tokio::test]
async fn test_disabled_blocking_returns_default_response() {
    let browser = MockBrowser::angular("https://app.test/").await;
    let config = Arc::new(
        SessionConfig::builder()
            .block_until_page_ready(false)
            .build()
            .unwrap(),
    );
    let (page, registry) = page_readiness(&browser, config);
    registry.register("Never", || async { Err(Error::internal("must not run")) }).await;
    page.hooks().register("Never").await;

    let outcome = page
        .wait_until_page_ready(
            ReadinessRequest::builder()
                .default_response(json!("fallback"))
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.response, Some(json!("fallback")));
    assert!(outcome.hooks.is_empty());
    assert!(browser.script_calls().await.is_empty());
}

#[tokio::test]
async fn test_hooks_run_in_order_and_removal_applies_to_next_cycle() {
    let browser = MockBrowser::plain("https://app.test/").await;
    let (page, registry) = page_readiness(&browser, fast_config());
    registry.register("First", || async { Ok(json!(1)) }).await;
    registry.register("Second", || async { Ok(json!(2)) }).await;
    page.hooks().register("First").await;
    page.hooks().register("Second").await;

    let outcome = page.wait_until_page_ready(ReadinessRequest::new()).await.unwrap();
    let names: Vec<_> = outcome.hooks.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);

    page.hooks().remove("First").await.unwrap();
    let outcome = page.wait_until_page_ready(ReadinessRequest::new()).await.unwrap();
    let names: Vec<_> = outcome.hooks.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["Second"]);
}

#[tokio::test]
async fn test_failing_hook_does_not_stop_the_others() {
    let browser = MockBrowser::plain("https://app.test/").await;
    let (page, registry) = page_readiness(&browser, fast_config());
    registry.register("Ok", || async { Ok(json!(true)) }).await;
    page.hooks().register("Unknown").await;
    page.hooks().register("Ok").await;

    let outcome = page.wait_until_page_ready(ReadinessRequest::new()).await.unwrap();

    assert_eq!(outcome.hooks.len(), 2);
    assert!(!outcome.hooks[0].is_ok());
    assert!(outcome.hooks[1].is_ok());
}

#[tokio::test]
async fn test_missing_target_is_raised() {
    let browser = MockBrowser::plain("https://app.test/").await;
    let (page, _) = page_readiness(&browser, fast_config());

    let err = page
        .wait_until_page_ready(ReadinessRequest::builder().target("css=#missing").build())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ElementNotFound(ref l) if l == "css=#missing"));
}

#[tokio::test]
async fn test_response_comes_from_readiness_script() {
    let browser = MockBrowser::angular("https://app.test/cart").await;
    let (page, _) = page_readiness(&browser, fast_config());

    let outcome = page
        .wait_until_page_ready(ReadinessRequest::builder().script(ScriptParts::location()).build())
        .await
        .unwrap();

    assert_eq!(outcome.response, Some(json!("https://app.test/cart")));
}

#[tokio::test]
async fn test_target_is_passed_as_first_argument() {
    let browser = MockBrowser::angular("https://app.test/").await;
    browser
        .add_element("id=agree", MockElement::new("input").attribute("type", "checkbox"))
        .await;
    let (page, _) = page_readiness(&browser, fast_config());

    let outcome = page
        .wait_until_page_ready(
            ReadinessRequest::builder()
                .target("id=agree")
                .skip_stale_check(true)
                .script(ScriptParts::select_checkable())
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.response, Some(json!(true)));
    assert!(browser.is_element_selected("id=agree").await);
}

#[tokio::test]
async fn test_jquery_bootstrap_only_with_stale_check() {
    let browser = MockBrowser::plain("https://app.test/").await;
    let (page, _) = page_readiness(&browser, fast_config());

    page.wait_until_page_ready(ReadinessRequest::builder().skip_stale_check(true).build())
        .await
        .unwrap();
    assert_eq!(browser.jquery_injections().await, 0);

    page.wait_until_page_ready(ReadinessRequest::new()).await.unwrap();
    assert_eq!(browser.jquery_injections().await, 1);
}

#[tokio::test]
async fn test_waits_for_document_to_load() {
    let browser = MockBrowser::plain("https://app.test/").await;
    browser
        .apply(MockMutation::Loading(Duration::from_millis(150)))
        .await;
    let (page, _) = page_readiness(&browser, fast_config());

    let started = Instant::now();
    page.wait_until_page_ready(ReadinessRequest::new()).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_replaced_document_is_followed() {
    let browser = MockBrowser::plain("https://app.test/").await;
    browser
        .schedule(
            Duration::from_millis(30),
            MockMutation::Navigate("https://app.test/next".into()),
        )
        .await;
    let (page, _) = page_readiness(&browser, fast_config());

    let outcome = page
        .wait_until_page_ready(ReadinessRequest::builder().script(ScriptParts::location()).build())
        .await
        .unwrap();

    assert_eq!(outcome.response, Some(json!("https://app.test/next")));
}

#[tokio::test]
async fn test_page_cycle_restores_script_timeout() {
    let browser = MockBrowser::angular("https://app.test/").await;
    browser.set_script_timeout_value(Duration::from_secs(7)).await;
    let (page, _) = page_readiness(&browser, fast_config());

    page.wait_until_page_ready(ReadinessRequest::builder().timeout("2s").build())
        .await
        .unwrap();

    let history = browser.script_timeout_history().await;
    assert!(history.contains(&Duration::from_secs(2)));
    assert_eq!(history.last(), Some(&Duration::from_secs(7)));
    assert_eq!(browser.current_script_timeout().await, Duration::from_secs(7));
}

#[tokio::test]
async fn test_browser_override_is_used() {
    let own = MockBrowser::plain("https://own.test/").await;
    let other = MockBrowser::plain("https://other.test/").await;
    let (page, _) = page_readiness(&own, fast_config());

    let outcome = page
        .wait_until_page_ready(
            ReadinessRequest::builder()
                .script(ScriptParts::location())
                .browser(Arc::new(other.clone()))
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.response, Some(json!("https://other.test/")));
    assert!(own.script_calls().await.is_empty());
}

#[tokio::test]
async fn test_no_framework_check_is_fast() {
    let browser = MockBrowser::plain("https://app.test/").await;
    let framework = FrameworkReadiness::new(Arc::new(browser.clone()), fast_config());

    let started = Instant::now();
    let outcome = framework.wait_until_angular_ready(None, None).await;

    assert!(started.elapsed() < Duration::from_millis(50));
    assert!(outcome.settled);
    assert_eq!(outcome.attempts, 1);
}

#[tokio::test]
async fn test_idle_framework_settles_on_first_attempt() {
    let browser = MockBrowser::angular("https://app.test/").await;
    let framework = FrameworkReadiness::new(Arc::new(browser.clone()), fast_config());

    let outcome = framework.wait_until_angular_ready(Some(3.into()), None).await;

    assert!(outcome.settled);
    assert_eq!(outcome.attempts, 1);
    assert!(outcome.suppressed.is_empty());
    assert_eq!(browser.async_calls_containing(NOTIFY).await, 1);
}

#[tokio::test]
async fn test_pending_requests_block_until_settled() {
    let browser = MockBrowser::angular("https://app.test/").await;
    browser
        .apply(MockMutation::PendingRequests(Duration::from_millis(200)))
        .await;
    let framework = FrameworkReadiness::new(Arc::new(browser.clone()), fast_config());

    let started = Instant::now();
    let outcome = framework.wait_until_angular_ready(None, None).await;

    assert!(outcome.settled);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_error_once_is_retried_after_breath() {
    let browser = MockBrowser::angular("https://app.test/").await;
    browser
        .fail_next_async(MockFault::ScriptError("angular is bootstrapping".into()))
        .await;
    let framework = FrameworkReadiness::new(Arc::new(browser.clone()), fast_config());

    let outcome = framework.wait_until_angular_ready(None, None).await;

    assert!(outcome.settled);
    assert_eq!(outcome.attempts, 2);
    assert!(matches!(
        outcome.suppressed.as_slice(),
        [SuppressedError::Script { attempt: 1, .. }]
    ));

    let checks: Vec<_> = browser
        .script_calls()
        .await
        .into_iter()
        .filter(|c| c.is_async && c.script.contains(NOTIFY))
        .collect();
    assert_eq!(checks.len(), 2);
    assert!(checks[1].at - checks[0].at >= Duration::from_millis(50));
}

#[tokio::test]
async fn test_persistent_failure_is_suppressed() {
    let browser = MockBrowser::angular("https://app.test/").await;
    browser
        .fail_all_async(Some(MockFault::ScriptError("boom".into())))
        .await;
    let framework = FrameworkReadiness::new(Arc::new(browser.clone()), fast_config());

    let started = Instant::now();
    let outcome = framework.wait_until_angular_ready(Some(1.into()), None).await;

    assert!(!outcome.settled);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.suppressed.len(), 2);
    assert!(started.elapsed() < Duration::from_millis(1000 + 50 + 250));
    assert_eq!(browser.current_script_timeout().await, Duration::from_secs(30));
}

#[tokio::test]
async fn test_timeout_is_not_retried() {
    let browser = MockBrowser::angular("https://app.test/").await;
    browser
        .apply(MockMutation::PendingRequests(Duration::from_secs(10)))
        .await;
    let framework = FrameworkReadiness::new(Arc::new(browser.clone()), fast_config());

    let started = Instant::now();
    let outcome = framework.wait_until_angular_ready(Some("300ms".into()), None).await;

    assert!(!outcome.settled);
    assert_eq!(outcome.attempts, 1);
    assert!(matches!(
        outcome.suppressed.as_slice(),
        [SuppressedError::Timeout { attempt: 1, .. }]
    ));
    assert!(started.elapsed() < Duration::from_millis(800));
    assert_eq!(browser.current_script_timeout().await, Duration::from_secs(30));
}

#[tokio::test]
async fn test_custom_error_message_is_recorded() {
    let browser = MockBrowser::angular("https://app.test/").await;
    browser
        .apply(MockMutation::PendingRequests(Duration::from_secs(10)))
        .await;
    let framework = FrameworkReadiness::new(Arc::new(browser.clone()), fast_config());

    let outcome = framework
        .wait_until_angular_ready(Some(0.1.into()), Some("dashboard never loaded"))
        .await;
    assert_eq!(
        outcome.suppressed,
        vec![SuppressedError::Timeout {
            attempt: 1,
            message: "dashboard never loaded".to_string(),
        }]
    );

    let outcome = framework.wait_until_angular_ready(Some(0.1.into()), None).await;
    assert!(matches!(
        outcome.suppressed.as_slice(),
        [SuppressedError::Timeout { message, .. }] if message == "AngularJS is not ready in 100ms"
    ));
}

#[tokio::test]
async fn test_late_failure_leaves_retry_the_remaining_time() {
    let browser = MockBrowser::angular("https://app.test/").await;
    let check = scripts::compose(&ScriptParts::framework_check());
    browser.set_script_result(&check, json!(false)).await;
    browser
        .schedule(
            Duration::from_millis(600),
            MockMutation::FailNextAsync(MockFault::ScriptError("digest in progress".into())),
        )
        .await;
    let framework = FrameworkReadiness::new(Arc::new(browser.clone()), fast_config());

    let started = Instant::now();
    let outcome = framework.wait_until_angular_ready(Some(1.into()), None).await;
    let elapsed = started.elapsed();

    assert!(!outcome.settled);
    assert_eq!(outcome.attempts, 2);
    assert!(matches!(
        outcome.suppressed.as_slice(),
        [
            SuppressedError::Script { attempt: 1, .. },
            SuppressedError::Timeout { attempt: 2, .. }
        ]
    ));
    assert!(elapsed >= Duration::from_millis(1000), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1000 + 50 + 250), "{:?}", elapsed);
    assert_eq!(browser.current_script_timeout().await, Duration::from_secs(30));
}

#[test]
fn test_not_ready_message_format() {
    assert_eq!(
        framework::not_ready_message(Duration::from_secs(3)),
        "AngularJS is not ready in 3s"
    );
}
