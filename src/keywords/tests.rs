//! Keyword tests against the mock browser

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

use crate::config::SessionConfig;
use crate::readiness::scripts::{self, sync, ScriptParts};
use crate::webdriver::{MockBrowser, MockElement, MockFault, MockMutation};
use crate::{Error, Library};

fn fast_config() -> SessionConfig {
    SessionConfig::builder()
        .timeout(1.0)
        .implicit_wait(1.0)
        .poll_frequency(0.02)
        .browser_breath_delay(0.01)
        .build()
        .unwrap()
}

fn library(browser: &MockBrowser) -> Library {
    Library::new(Arc::new(browser.clone()), fast_config())
}

#[tokio::test]
async fn test_click_element_runs_readiness_and_hooks() {
    let browser = MockBrowser::angular("https://shop.test/").await;
    browser.add_element("id=buy", MockElement::new("button")).await;
    let lib = library(&browser);

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    lib.registry()
        .unwrap()
        .register("Count", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!(null))
            }
        })
        .await;
    lib.register_page_ready_keyword("Count").await;

    assert_ok!(lib.elements().click_element("id=buy", false).await);

    assert_eq!(browser.clicks("id=buy").await, 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(browser.async_calls_containing("notifyWhenNoOutstandingRequests").await >= 2);
}

#[tokio::test]
async fn test_skip_ready_runs_no_scripts() {
    let browser = MockBrowser::angular("https://shop.test/").await;
    browser.add_element("id=buy", MockElement::new("button")).await;
    let lib = library(&browser);

    assert_ok!(lib.elements().click_element("id=buy", true).await);

    assert!(browser.script_calls().await.is_empty());
}

#[tokio::test]
async fn test_click_missing_element_fails() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    let lib = library(&browser);

    let err = assert_err!(lib.elements().click_element("css=.nope", false).await);
    assert_eq!(err.to_string(), "Element 'css=.nope' not found.");
}

#[tokio::test]
async fn test_double_click_element() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser.add_element("css=.row", MockElement::new("div")).await;
    let lib = library(&browser);

    assert_ok!(lib.elements().double_click_element("css=.row", true).await);
    assert_eq!(browser.clicks("css=.row").await, 2);
}

#[tokio::test]
async fn test_click_element_at_coordinates() {
    let browser = MockBrowser::angular("https://shop.test/").await;
    browser.add_element("css=canvas.map", MockElement::new("canvas")).await;
    browser
        .on_click(
            "css=canvas.map",
            MockMutation::PendingRequests(Duration::from_millis(100)),
        )
        .await;
    let lib = library(&browser);

    assert_ok!(
        lib.elements()
            .click_element_at_coordinates("css=canvas.map", -20, 15, false)
            .await
    );

    assert_eq!(browser.pointer_clicks("css=canvas.map").await, vec![(-20, 15)]);
    assert_eq!(browser.clicks("css=canvas.map").await, 1);
    assert!(browser.async_calls_containing("document.readyState").await >= 1);

    let err = assert_err!(
        lib.elements()
            .click_element_at_coordinates("css=canvas.none", 0, 0, true)
            .await
    );
    assert!(matches!(err, Error::ElementNotFound(_)));
}

#[tokio::test]
async fn test_click_link_falls_back_to_link_text() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser.add_element("link=Checkout", MockElement::new("a")).await;
    let lib = library(&browser);

    assert_ok!(lib.elements().click_link("Checkout", true).await);
    assert_eq!(browser.clicks("link=Checkout").await, 1);

    let err = assert_err!(lib.elements().click_link("css=a.checkout", true).await);
    assert!(matches!(err, Error::ElementNotFound(_)));
}

#[tokio::test]
async fn test_click_button_requires_button_tag() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser.add_element("id=save", MockElement::new("button")).await;
    browser.add_element("id=banner", MockElement::new("div")).await;
    let lib = library(&browser);

    assert_ok!(lib.forms().click_button("id=save", true).await);
    assert_eq!(browser.clicks("id=save").await, 1);

    let err = assert_err!(lib.forms().click_button("id=banner", true).await);
    assert!(matches!(err, Error::ElementNotFound(_)));
}

#[tokio::test]
async fn test_submit_form_defaults_to_first_form() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser.add_element("xpath=//form", MockElement::new("form")).await;
    let lib = library(&browser);

    assert_ok!(lib.forms().submit_form(None, true).await);

    let calls = browser.script_calls().await;
    assert!(calls.iter().any(|c| !c.is_async && c.script == sync::SUBMIT));
}

#[tokio::test]
async fn test_input_text_triggers_change() {
    let browser = MockBrowser::angular("https://shop.test/").await;
    browser.add_element("id=email", MockElement::new("input")).await;
    let lib = library(&browser);

    assert_ok!(lib.forms().input_text("id=email", "alice@shop.test", false).await);

    assert_eq!(browser.typed_text("id=email").await, "alice@shop.test");
    assert_eq!(browser.async_calls_containing("triggerHandler('change')").await, 1);
}

#[tokio::test]
async fn test_input_password_skip_ready() {
    let browser = MockBrowser::angular("https://shop.test/").await;
    browser.add_element("id=pw", MockElement::new("input")).await;
    let lib = library(&browser);

    assert_ok!(lib.forms().input_password("id=pw", "hunter2", true).await);

    assert_eq!(browser.typed_text("id=pw").await, "hunter2");
    assert_eq!(browser.async_calls_containing("triggerHandler('change')").await, 0);
}

#[tokio::test]
async fn test_select_checkbox_through_angular() {
    let browser = MockBrowser::angular("https://shop.test/").await;
    browser
        .add_element("id=terms", MockElement::new("input").attribute("type", "checkbox"))
        .await;
    let lib = library(&browser);

    assert_ok!(lib.forms().select_checkbox("id=terms").await);
    assert!(browser.is_element_selected("id=terms").await);

    // already checked: nothing more happens
    assert_ok!(lib.forms().select_checkbox("id=terms").await);
    assert_eq!(browser.async_calls_containing("prop('checked',true)").await, 1);
}

#[tokio::test]
async fn test_select_checkbox_without_angular_clicks() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser
        .add_element("id=terms", MockElement::new("input").attribute("type", "checkbox"))
        .await;
    let lib = library(&browser);

    assert_ok!(lib.forms().select_checkbox("id=terms").await);

    assert!(browser.is_element_selected("id=terms").await);
    assert_eq!(browser.clicks("id=terms").await, 1);
}

#[tokio::test]
async fn test_select_radio_button() {
    let browser = MockBrowser::angular("https://shop.test/").await;
    let locator = "xpath=//input[@type='radio' and @name='size' and (@value='XL' or @id='XL')]";
    browser
        .add_element(locator, MockElement::new("input").attribute("type", "radio"))
        .await;
    let lib = library(&browser);

    assert_ok!(lib.forms().select_radio_button("size", "XL").await);
    assert!(browser.is_element_selected(locator).await);
}

#[tokio::test]
async fn test_form_actions_happen_with_blocking_disabled() {
    let browser = MockBrowser::angular("https://shop.test/").await;
    browser
        .add_element("id=terms", MockElement::new("input").attribute("type", "checkbox"))
        .await;
    browser.add_element("id=name", MockElement::new("input")).await;
    browser.add_element("id=country", MockElement::new("select")).await;
    let config = SessionConfig::builder()
        .block_until_page_ready(false)
        .build()
        .unwrap();
    let lib = Library::new(Arc::new(browser.clone()), config);

    assert_ok!(lib.forms().select_checkbox("id=terms").await);
    assert_ok!(lib.forms().input_text("id=name", "bob", false).await);
    assert_ok!(lib.selects().select_from_list_by_value("id=country", &["fi"]).await);

    assert!(browser.is_element_selected("id=terms").await);
    assert_eq!(browser.typed_text("id=name").await, "bob");
    assert_eq!(browser.async_calls_containing("triggerHandler('change')").await, 2);
    // the actions ran, the readiness cycles did not
    assert_eq!(browser.async_calls_containing("document.readyState").await, 0);
}

#[tokio::test]
async fn test_select_from_list_triggers_change() {
    let browser = MockBrowser::angular("https://shop.test/").await;
    browser.add_element("id=country", MockElement::new("select")).await;
    let lib = library(&browser);

    assert_ok!(lib.selects().select_from_list_by_value("id=country", &["fi"]).await);
    assert_ok!(lib.selects().select_from_list_by_label("id=country", &["Finland"]).await);
    assert_ok!(lib.selects().select_from_list_by_index("id=country", &[2]).await);

    assert_eq!(browser.async_calls_containing("triggerHandler('change')").await, 3);
}

#[tokio::test]
async fn test_select_from_list_without_match_fails() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser.add_element("id=country", MockElement::new("select")).await;
    browser.set_script_result(sync::SELECT_OPTIONS, json!(0)).await;
    let lib = library(&browser);

    let err = assert_err!(lib.selects().select_from_list_by_value("id=country", &["xx"]).await);
    assert!(matches!(err, Error::AssertionFailed(_)));
    assert!(err.to_string().contains("'xx'"));
}

#[tokio::test]
async fn test_select_all_requires_multiselect() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser.add_element("id=tags", MockElement::new("select")).await;
    let lib = library(&browser);

    assert_ok!(lib.selects().select_all_from_list("id=tags").await);

    browser.set_script_result(sync::SELECT_ALL_OPTIONS, json!(-1)).await;
    let err = assert_err!(lib.selects().select_all_from_list("id=tags").await);
    assert!(matches!(err, Error::AssertionFailed(_)));
}

#[tokio::test]
async fn test_get_location_ladder() {
    let browser = MockBrowser::angular("https://shop.test/cart").await;
    let lib = library(&browser);

    assert_eq!(lib.location().get_location().await.unwrap(), "https://shop.test/cart");

    // async script broken: falls back to the sync script
    browser
        .fail_all_async(Some(MockFault::ScriptError("boom".into())))
        .await;
    assert_eq!(lib.location().get_location().await.unwrap(), "https://shop.test/cart");

    // sync script yields nothing: falls back to the driver
    browser.set_script_result(sync::LOCATION, json!(null)).await;
    assert_eq!(lib.location().get_location().await.unwrap(), "https://shop.test/cart");
}

#[tokio::test]
async fn test_element_inspection() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser
        .add_element(
            "css=div.card",
            MockElement::new("div").attribute("class", "card active"),
        )
        .await;
    browser
        .add_element("css=div.hidden", MockElement::new("div").displayed(false))
        .await;
    let lib = library(&browser);
    let elements = lib.elements();

    assert!(elements.is_element_visible("css=div.card").await.unwrap());
    assert!(!elements.is_element_visible("css=div.hidden").await.unwrap());
    assert!(!elements.is_element_visible("css=div.none").await.unwrap());

    assert_eq!(
        elements.get_element_attribute("css=div.card@class").await.unwrap(),
        Some("card active".to_string())
    );
    assert_ok!(elements.scroll_element_into_view("css=div.card").await);

    assert_ok!(elements.element_attribute_should_contain("css=div.card@class", "active", None).await);
    let err = assert_err!(
        elements
            .element_attribute_should_contain("css=div.card@class", "disabled", None)
            .await
    );
    assert_eq!(
        err.to_string(),
        "Element attribute 'css=div.card@class' should have contained 'disabled' but its value was 'card active'."
    );

    let err = assert_err!(
        elements
            .element_attribute_should_not_contain("css=div.card@class", "active", Some("still active"))
            .await
    );
    assert_eq!(err.to_string(), "still active");
}

#[tokio::test]
async fn test_wait_until_element_is_visible() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser
        .add_element("id=toast", MockElement::new("div").displayed(false))
        .await;
    browser
        .schedule(
            Duration::from_millis(100),
            MockMutation::SetDisplayed("id=toast".into(), true),
        )
        .await;
    let lib = library(&browser);

    assert_ok!(lib.waiting().wait_until_element_is_visible("id=toast", None, None).await);

    let err = assert_err!(
        lib.waiting()
            .wait_until_element_is_not_visible("id=toast", Some("100ms".into()), None)
            .await
    );
    assert_eq!(err.to_string(), "Element 'id=toast' was still visible after 100ms");

    let err = assert_err!(lib.waiting().wait_until_element_is_visible("id=gone", None, None).await);
    assert!(matches!(err, Error::ElementNotFound(_)));
}

#[tokio::test]
async fn test_wait_until_element_contains_attribute() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser
        .add_element("id=order", MockElement::new("div").attribute("class", "pending"))
        .await;
    browser
        .schedule(
            Duration::from_millis(80),
            MockMutation::SetAttribute("id=order".into(), "class".into(), "done".into()),
        )
        .await;
    let lib = library(&browser);
    let waiting = lib.waiting();

    assert_ok!(
        waiting
            .wait_until_element_contains_attribute("id=order@class", "done", None, None)
            .await
    );
    assert_ok!(
        waiting
            .wait_until_element_does_not_contain_attribute("id=order@class", "pending", None, None)
            .await
    );

    let err = assert_err!(
        waiting
            .wait_until_element_contains_attribute("id=order@class", "shipped", Some(0.1.into()), None)
            .await
    );
    assert_eq!(err.to_string(), "Element did not contain attribute 'shipped' after 100ms");
}

#[tokio::test]
async fn test_wait_for_conditions() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser.set_script_result("return window.loaded;", json!(true)).await;
    browser
        .set_script_result("arguments[arguments.length-1](window.loaded)", json!(true))
        .await;
    let lib = library(&browser);
    let waiting = lib.waiting();

    assert_ok!(waiting.wait_for_condition("return window.loaded;", None, None).await);
    assert_ok!(
        waiting
            .wait_for_async_condition("arguments[arguments.length-1](window.loaded)", None, None)
            .await
    );

    let err = assert_err!(
        waiting
            .wait_for_condition("return window.never;", Some("100ms".into()), None)
            .await
    );
    assert_eq!(
        err.to_string(),
        "Condition 'return window.never;' did not become true in 100ms"
    );
}

#[tokio::test]
async fn test_fast_wait_until_page_contains() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser.set_page_text("Order confirmed. Thank you!").await;
    let lib = library(&browser);
    let waiting = lib.waiting();

    assert_ok!(
        waiting
            .fast_wait_until_page_contains("Order confirmed", &["Payment failed"], None, None)
            .await
    );

    browser.set_page_text("Payment failed").await;
    let err = assert_err!(
        waiting
            .fast_wait_until_page_contains("Order confirmed", &["Payment failed"], None, None)
            .await
    );
    assert_eq!(err.to_string(), "Exclude text 'Payment failed' appears on the page.");

    let err = assert_err!(
        waiting
            .fast_wait_until_page_contains("Order confirmed", &[], Some(0.1.into()), None)
            .await
    );
    assert_eq!(err.to_string(), "Text 'Order confirmed' did not appear in 100ms");
}

#[tokio::test]
async fn test_javascript_keywords() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser.set_script_result("return 1+1;", json!(2)).await;
    let lib = library(&browser);
    let js = lib.javascript();

    assert_eq!(js.execute_javascript(&["return ", "1+1;"]).await.unwrap(), json!(2));
    assert_eq!(js.get_screen_size().await.unwrap(), (1920, 1080));
}

#[tokio::test]
async fn test_browser_logs_are_read_once() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    browser
        .apply(MockMutation::ConsoleLog("SEVERE".into(), "app.js Uncaught TypeError".into()))
        .await;
    let lib = library(&browser);

    let logs = lib.javascript().get_browser_logs().await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, "SEVERE");
    assert!(lib.javascript().get_browser_logs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_warn_any_javascript_errors_filters_excludes() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    for message in [
        "favicon.ico Failed to load resource",
        "app.js Uncaught TypeError: x is undefined",
        "analytics.js blocked",
    ] {
        browser
            .apply(MockMutation::ConsoleLog("SEVERE".into(), message.into()))
            .await;
    }
    let lib = library(&browser);

    let reported = lib
        .javascript()
        .warn_any_javascript_errors(&["favicon", "analytics"], "checkout")
        .await
        .unwrap();

    assert_eq!(reported.len(), 1);
    assert!(reported[0].message.contains("TypeError"));

    let reported = lib.javascript().warn_any_javascript_errors(&[], "").await.unwrap();
    assert!(reported.is_empty());
}

#[tokio::test]
async fn test_open_browser_waits_for_page() {
    let browser = MockBrowser::angular("about:blank").await;
    browser
        .apply(MockMutation::PendingRequests(Duration::from_millis(100)))
        .await;
    let lib = library(&browser);

    assert_ok!(lib.open_browser("https://shop.test/").await);

    assert_eq!(lib.location().get_location().await.unwrap(), "https://shop.test/");
    assert!(browser.async_calls_containing("document.readyState").await >= 1);

    // the page cycle already ends with the framework step
    let check = scripts::compose(&ScriptParts::framework_check());
    let checks = browser
        .script_calls()
        .await
        .into_iter()
        .filter(|c| c.is_async && c.script == check)
        .count();
    assert_eq!(checks, 1);
}

#[tokio::test]
async fn test_remove_unregistered_page_ready_keyword() {
    let browser = MockBrowser::plain("https://shop.test/").await;
    let lib = library(&browser);

    let err = assert_err!(lib.remove_page_ready_keyword("Nope").await);
    assert!(matches!(err, Error::HookNotRegistered(_)));
}
