//! Scrape target definition.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// A configured web page to scrape, identified by its unique name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Unique resource name (also the SeenSet key)
    pub name: String,

    /// Page URL to fetch
    pub url: String,

    /// Selector for each item container
    pub item_selector: String,

    /// Selector for the title element within an item
    pub title_selector: String,

    /// Selector for the link element within an item
    pub link_selector: String,

    /// Paused resources are skipped by scheduled runs
    #[serde(default)]
    pub paused: bool,
}

impl ResourceConfig {
    /// Create an active resource.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        item_selector: impl Into<String>,
        title_selector: impl Into<String>,
        link_selector: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            item_selector: item_selector.into(),
            title_selector: title_selector.into(),
            link_selector: link_selector.into(),
            paused: false,
        }
    }

    /// Check that the definition is usable before it is stored.
    ///
    /// Selector syntax is checked separately by the extractor.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("resource name is empty"));
        }

        let url = Url::parse(&self.url)
            .map_err(|e| AppError::validation(format!("{}: invalid url: {e}", self.name)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "{}: url scheme must be http or https",
                self.name
            )));
        }

        for (field, value) in [
            ("item_selector", &self.item_selector),
            ("title_selector", &self.title_selector),
            ("link_selector", &self.link_selector),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "{}: {field} is empty",
                    self.name
                )));
            }
        }

        Ok(())
    }
}
