//! JavaScript injected by the readiness controllers
//!
//! Every readiness script has the same shape:
//!
//! ```text
//! PREFIX + <$browser lookup>.notifyWhenNoOutstandingRequests( + HANDLER + ) + SUFFIX
//! ```
//!
//! The prefix opens an `if(window.angular){` guard, the handler runs once
//! AngularJS has no outstanding requests and the suffix closes the guard with
//! a fallback for pages without the framework. All scripts here are
//! asynchronous: the completion callback is the last argument.

/// Resolve the application's `$browser` service.
///
/// Uses the injector attached to the bootstrapped root element, or a fresh
/// `ng` injector when the app was bootstrapped manually on a detached node.
pub const BROWSER_LOOKUP: &str = "(angular.element(document.querySelector('[data-ng-app],[ng-app],.ng-scope')||document).injector()||angular.injector(['ng'])).get('$browser')";

/// Default page-readiness prefix
pub const DEFAULT_PREFIX: &str = "var cb=arguments[arguments.length-1];if(window.angular){";

/// Default handler: report that the framework settled
pub const DEFAULT_HANDLER: &str = "function(){cb(true)}";

/// Default page-readiness suffix: no framework, report `false`
pub const DEFAULT_SUFFIX: &str = "}else{cb(false)}";

/// Framework check suffix: no framework means nothing to wait for
pub const FRAMEWORK_SUFFIX: &str = "}else{cb(true)}";

/// Prefix exposing `arguments[0]` as `el`
pub const ELEMENT_PREFIX: &str = "var cb=arguments[arguments.length-1];var el=arguments[0];if(window.angular){";

/// Where the DOM utility library is fetched from when a page lacks it
pub const JQUERY_URL: &str = "//code.jquery.com/jquery-1.11.3.min.js";

/// Resolves with whether the document finished loading and has a body
const DOCUMENT_READY_CHECK: &str = "var cb=arguments[arguments.length-1];\
function ready(){cb(document.readyState==='complete'&&!!document.body&&document.body.childNodes.length>0)}";

/// Prefix / handler / suffix triple of a readiness script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptParts {
    pub prefix: String,
    pub handler: String,
    pub suffix: String,
}

impl Default for ScriptParts {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_HANDLER, DEFAULT_SUFFIX)
    }
}

impl ScriptParts {
    pub fn new<P, H, S>(prefix: P, handler: H, suffix: S) -> Self
    where
        P: Into<String>,
        H: Into<String>,
        S: Into<String>,
    {
        Self {
            prefix: prefix.into(),
            handler: handler.into(),
            suffix: suffix.into(),
        }
    }

    /// Script polled by the framework-readiness controller
    pub fn framework_check() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_HANDLER, FRAMEWORK_SUFFIX)
    }

    /// Resolves with `document.location.href` whether or not AngularJS runs
    pub fn location() -> Self {
        Self::new(
            DEFAULT_PREFIX,
            "function(){cb(document.location.href)}",
            "}else{cb(document.location.href)}",
        )
    }

    /// Check a checkbox or radio button passed as `arguments[0]`.
    ///
    /// Under AngularJS the model is updated through `triggerHandler('click')`;
    /// otherwise the element is clicked natively.
    pub fn select_checkable() -> Self {
        Self::new(
            ELEMENT_PREFIX,
            "function(){angular.element(el).prop('checked',true).triggerHandler('click');cb(true)}",
            "}else{el.click();cb(false)}",
        )
    }

    /// Fire `change` and `focusout` on `arguments[0]` once AngularJS is idle.
    ///
    /// Goes through jqLite, so the page does not need jQuery.
    pub fn trigger_change() -> Self {
        Self::new(
            ELEMENT_PREFIX,
            "function(){angular.element(el).triggerHandler('change').triggerHandler('focusout');cb(true)}",
            DEFAULT_SUFFIX,
        )
    }
}

/// Assemble the readiness script from its parts
pub fn compose(parts: &ScriptParts) -> String {
    format!(
        "{}{}.notifyWhenNoOutstandingRequests({}){}",
        parts.prefix, BROWSER_LOOKUP, parts.handler, parts.suffix
    )
}

/// Document-ready check.
///
/// With `ensure_jq`, a page without `window.jQuery` gets it injected first and
/// the check resolves once the library loaded (or failed to).
pub fn document_ready(ensure_jq: bool) -> String {
    if ensure_jq {
        format!(
            "{}if(!window.jQuery){{var s=document.createElement('script');s.src='{}';\
s.onload=ready;s.onerror=ready;document.getElementsByTagName('head')[0].appendChild(s)}}else{{ready()}}",
            DOCUMENT_READY_CHECK, JQUERY_URL
        )
    } else {
        format!("{}ready()", DOCUMENT_READY_CHECK)
    }
}

/// Synchronous scripts used by the keyword layer
pub mod sync {
    pub const LOCATION: &str = "return document.location.href;";

    pub const SCREEN_SIZE: &str = "return [screen.width, screen.height];";

    pub const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView(true);";

    pub const DOUBLE_CLICK: &str = "var ev=document.createEvent('MouseEvents');\
ev.initEvent('dblclick',true,true);arguments[0].dispatchEvent(ev);";

    pub const SUBMIT: &str = "var f=arguments[0];if(f.requestSubmit){f.requestSubmit()}else{f.submit()}";

    /// `arguments[1]` is matched against each option's `arguments[2]`
    /// property (`value`, `label` or `index`); returns how many were selected.
    pub const SELECT_OPTIONS: &str = "var sel=arguments[0],wanted=arguments[1].map(String),key=arguments[2],n=0;\
for(var i=0;i<sel.options.length;i++){var o=sel.options[i];\
var v=key==='label'?(o.label||o.text):String(o[key]);\
if(wanted.indexOf(v)>=0){o.selected=true;n++}}\
if(n){sel.dispatchEvent(new Event('change',{bubbles:true}))}return n;";

    /// Selects every option of a multi-select list
    pub const SELECT_ALL_OPTIONS: &str = "var sel=arguments[0];\
if(!sel.multiple){return -1}\
for(var i=0;i<sel.options.length;i++){sel.options[i].selected=true}\
sel.dispatchEvent(new Event('change',{bubbles:true}));return sel.options.length;";

    /// Whether the body's visible text contains `arguments[0]`
    pub const PAGE_CONTAINS_TEXT: &str =
        "return !!document.body&&document.body.innerText.indexOf(arguments[0])>=0;";
}
