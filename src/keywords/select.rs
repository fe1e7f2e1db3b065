//! Select list keywords
//!
//! Options are selected by script; the list then gets `change` / `focusout`
//! once AngularJS is idle.

use serde_json::{json, Value};
use tracing::{info, instrument};

use super::KeywordContext;
use crate::readiness::scripts::sync;
use crate::webdriver::WebElement;
use crate::{Error, Result};

/// Option property matched by a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionKey {
    Value,
    Label,
    Index,
}

impl OptionKey {
    fn as_str(self) -> &'static str {
        match self {
            OptionKey::Value => "value",
            OptionKey::Label => "label",
            OptionKey::Index => "index",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectKeywords {
    ctx: KeywordContext,
}

impl SelectKeywords {
    pub fn new(ctx: KeywordContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self))]
    pub async fn select_from_list_by_value(&self, locator: &str, values: &[&str]) -> Result<()> {
        self.select_by(locator, OptionKey::Value, values).await
    }

    #[instrument(skip(self))]
    pub async fn select_from_list_by_label(&self, locator: &str, labels: &[&str]) -> Result<()> {
        self.select_by(locator, OptionKey::Label, labels).await
    }

    #[instrument(skip(self))]
    pub async fn select_from_list_by_index(&self, locator: &str, indexes: &[usize]) -> Result<()> {
        let indexes: Vec<String> = indexes.iter().map(|i| i.to_string()).collect();
        let indexes: Vec<&str> = indexes.iter().map(String::as_str).collect();
        self.select_by(locator, OptionKey::Index, &indexes).await
    }

    /// Select every option of a multi-select list
    #[instrument(skip(self))]
    pub async fn select_all_from_list(&self, locator: &str) -> Result<()> {
        info!("Selecting all options from list '{}'.", locator);
        let list = self.find_list(locator).await?;
        let selected = self
            .ctx
            .driver()
            .execute_script(sync::SELECT_ALL_OPTIONS, vec![list.to_json()])
            .await?;
        if selected_count(&selected) < 0 {
            return Err(Error::assertion_failed(
                "Keyword 'Select all from list' works only for multiselect lists.",
            ));
        }
        self.ctx.trigger_change(&list).await
    }

    async fn select_by(&self, locator: &str, key: OptionKey, items: &[&str]) -> Result<()> {
        info!(
            "Selecting options from selection list '{}' by {} {}.",
            locator,
            key.as_str(),
            items.join(", ")
        );
        if items.is_empty() {
            return Err(Error::assertion_failed(format!(
                "No {} given.",
                key.as_str()
            )));
        }

        let list = self.find_list(locator).await?;
        let selected = self
            .ctx
            .driver()
            .execute_script(
                sync::SELECT_OPTIONS,
                vec![list.to_json(), json!(items), json!(key.as_str())],
            )
            .await?;
        if selected_count(&selected) <= 0 {
            return Err(Error::assertion_failed(format!(
                "Options with {} '{}' not found from select list '{}'.",
                key.as_str(),
                items.join(", "),
                locator
            )));
        }
        self.ctx.trigger_change(&list).await
    }

    async fn find_list(&self, locator: &str) -> Result<WebElement> {
        self.ctx.find_with_tag(locator, &["select"]).await
    }
}

fn selected_count(value: &Value) -> i64 {
    value.as_i64().unwrap_or(0)
}
