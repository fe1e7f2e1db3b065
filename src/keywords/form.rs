//! Form keywords
//!
//! Text entry and checkbox/radio selection go through AngularJS when the page
//! runs it, so the application model sees the change.

use tracing::{info, instrument};

use super::KeywordContext;
use crate::readiness::scripts::{sync, ScriptParts};
use crate::webdriver::WebElement;
use crate::Result;

/// Form submitted when `submit_form` gets no locator
pub const DEFAULT_FORM_LOCATOR: &str = "xpath=//form";

#[derive(Debug, Clone)]
pub struct FormKeywords {
    ctx: KeywordContext,
}

impl FormKeywords {
    pub fn new(ctx: KeywordContext) -> Self {
        Self { ctx }
    }

    /// Click an `input` button, or a `button` element when there is none
    #[instrument(skip(self))]
    pub async fn click_button(&self, locator: &str, skip_ready: bool) -> Result<()> {
        info!("Clicking button '{}'.", locator);
        let element = self.ctx.find_with_tag(locator, &["input", "button"]).await?;
        self.ctx.driver().click(&element).await?;
        if !skip_ready {
            self.ctx.wait_until_page_ready().await?;
        }
        Ok(())
    }

    /// Submit a form, the first one on the page by default
    #[instrument(skip(self))]
    pub async fn submit_form(&self, locator: Option<&str>, skip_ready: bool) -> Result<()> {
        let locator = locator
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(DEFAULT_FORM_LOCATOR);
        info!("Submitting form '{}'.", locator);
        let form = self.ctx.find_with_tag(locator, &["form"]).await?;
        self.ctx
            .driver()
            .execute_script(sync::SUBMIT, vec![form.to_json()])
            .await?;
        if !skip_ready {
            self.ctx.wait_until_page_ready().await?;
        }
        Ok(())
    }

    #[instrument(skip(self, text))]
    pub async fn input_text(&self, locator: &str, text: &str, skip_ready: bool) -> Result<()> {
        info!("Typing text '{}' into text field '{}'.", text, locator);
        self.type_into(locator, text, skip_ready).await
    }

    /// Like `input_text`, without logging the value
    #[instrument(skip(self, text))]
    pub async fn input_password(&self, locator: &str, text: &str, skip_ready: bool) -> Result<()> {
        info!("Typing password into text field '{}'.", locator);
        self.type_into(locator, text, skip_ready).await
    }

    /// Check a checkbox; does nothing if it is already checked
    #[instrument(skip(self))]
    pub async fn select_checkbox(&self, locator: &str) -> Result<()> {
        info!("Selecting checkbox '{}'.", locator);
        let element = self.ctx.find_with_tag(locator, &["input"]).await?;
        self.select_checkable(&element).await
    }

    /// Select the radio button of `group_name` whose value or id is `value`
    #[instrument(skip(self))]
    pub async fn select_radio_button(&self, group_name: &str, value: &str) -> Result<()> {
        info!("Selecting '{}' from radio button '{}'.", value, group_name);
        let locator = format!(
            "xpath=//input[@type='radio' and @name='{0}' and (@value='{1}' or @id='{1}')]",
            group_name, value
        );
        let element = self.ctx.find(&locator).await?;
        self.select_checkable(&element).await
    }

    async fn type_into(&self, locator: &str, text: &str, skip_ready: bool) -> Result<()> {
        let element = self.ctx.find(locator).await?;
        self.ctx.driver().clear(&element).await?;
        self.ctx.driver().send_keys(&element, text).await?;
        if !skip_ready {
            self.ctx.trigger_change(&element).await?;
        }
        Ok(())
    }

    async fn select_checkable(&self, element: &WebElement) -> Result<()> {
        if self.ctx.driver().is_selected(element).await? {
            return Ok(());
        }
        self.ctx
            .run_on_element(element, ScriptParts::select_checkable())
            .await?;
        self.ctx.wait_until_page_settled().await
    }
}
