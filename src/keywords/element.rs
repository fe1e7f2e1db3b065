//! Element keywords

use tracing::{info, instrument};

use super::KeywordContext;
use crate::readiness::scripts::sync;
use crate::webdriver::{AttributeLocator, Locator, Strategy, WebElement};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ElementKeywords {
    ctx: KeywordContext,
}

impl ElementKeywords {
    pub fn new(ctx: KeywordContext) -> Self {
        Self { ctx }
    }

    /// Click the element identified by `locator`
    #[instrument(skip(self))]
    pub async fn click_element(&self, locator: &str, skip_ready: bool) -> Result<()> {
        info!("Clicking element '{}'.", locator);
        let element = self.ctx.find(locator).await?;
        self.ctx.driver().click(&element).await?;
        self.after_action(skip_ready).await
    }

    /// Click at an offset from the center of the element
    #[instrument(skip(self))]
    pub async fn click_element_at_coordinates(
        &self,
        locator: &str,
        x_offset: i64,
        y_offset: i64,
        skip_ready: bool,
    ) -> Result<()> {
        info!(
            "Clicking element '{}' at coordinates x={}, y={}.",
            locator, x_offset, y_offset
        );
        let element = self.ctx.find(locator).await?;
        self.ctx.driver().click_at(&element, x_offset, y_offset).await?;
        self.after_action(skip_ready).await
    }

    #[instrument(skip(self))]
    pub async fn double_click_element(&self, locator: &str, skip_ready: bool) -> Result<()> {
        info!("Double clicking element '{}'.", locator);
        let element = self.ctx.find(locator).await?;
        self.ctx
            .driver()
            .execute_script(sync::DOUBLE_CLICK, vec![element.to_json()])
            .await?;
        self.after_action(skip_ready).await
    }

    /// Click a link; a bare locator also matches the link text
    #[instrument(skip(self))]
    pub async fn click_link(&self, locator: &str, skip_ready: bool) -> Result<()> {
        info!("Clicking link '{}'.", locator);
        let element = self
            .find_with_fallback(locator, |value| format!("link={}", value))
            .await?;
        self.ctx.driver().click(&element).await?;
        self.after_action(skip_ready).await
    }

    /// Click an image; a bare locator also matches `src` and `alt`
    #[instrument(skip(self))]
    pub async fn click_image(&self, locator: &str, skip_ready: bool) -> Result<()> {
        info!("Clicking image '{}'.", locator);
        let element = self
            .find_with_fallback(locator, |value| {
                format!("xpath=//img[@src='{0}' or @alt='{0}']", value)
            })
            .await?;
        self.ctx.driver().click(&element).await?;
        self.after_action(skip_ready).await
    }

    pub async fn scroll_element_into_view(&self, locator: &str) -> Result<WebElement> {
        let element = self.ctx.find(locator).await?;
        self.ctx
            .driver()
            .execute_script(sync::SCROLL_INTO_VIEW, vec![element.to_json()])
            .await?;
        Ok(element)
    }

    /// Visibility of the element; `false` if there is no such element
    pub async fn is_element_visible(&self, locator: &str) -> Result<bool> {
        match self.ctx.find(locator).await {
            Ok(element) => self.ctx.driver().is_displayed(&element).await,
            Err(Error::ElementNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Attribute value for `locator@attribute`
    pub async fn get_element_attribute(&self, attribute_locator: &str) -> Result<Option<String>> {
        let parsed = AttributeLocator::parse(attribute_locator)?;
        let element = self.ctx.driver().find_element(&parsed.locator).await?;
        self.ctx.driver().get_attribute(&element, &parsed.attribute).await
    }

    pub async fn element_attribute_should_contain(
        &self,
        attribute_locator: &str,
        expected: &str,
        message: Option<&str>,
    ) -> Result<()> {
        let actual = self
            .get_element_attribute(attribute_locator)
            .await?
            .unwrap_or_default();
        if actual.contains(expected) {
            return Ok(());
        }
        Err(Error::assertion_failed(message.map(str::to_string).unwrap_or_else(|| {
            format!(
                "Element attribute '{}' should have contained '{}' but its value was '{}'.",
                attribute_locator, expected, actual
            )
        })))
    }

    pub async fn element_attribute_should_not_contain(
        &self,
        attribute_locator: &str,
        unexpected: &str,
        message: Option<&str>,
    ) -> Result<()> {
        let actual = self
            .get_element_attribute(attribute_locator)
            .await?
            .unwrap_or_default();
        if !actual.contains(unexpected) {
            return Ok(());
        }
        Err(Error::assertion_failed(message.map(str::to_string).unwrap_or_else(|| {
            format!(
                "Element attribute '{}' should not contain '{}' but it did.",
                attribute_locator, unexpected
            )
        })))
    }

    /// Try `locator` as written; a bare value also gets a second chance
    /// through `fallback`.
    async fn find_with_fallback<F>(&self, locator: &str, fallback: F) -> Result<WebElement>
    where
        F: Fn(&str) -> String,
    {
        match self.ctx.find(locator).await {
            Err(Error::ElementNotFound(_)) => {
                let parsed = Locator::parse(locator)?;
                if parsed.strategy() != Strategy::Default {
                    return Err(Error::element_not_found(locator));
                }
                self.ctx
                    .find(&fallback(parsed.value()))
                    .await
                    .map_err(|_| Error::element_not_found(locator))
            }
            found => found,
        }
    }

    async fn after_action(&self, skip_ready: bool) -> Result<()> {
        if !skip_ready {
            self.ctx.wait_until_page_ready().await?;
        }
        Ok(())
    }
}
