// src/services/extractor.rs

//! Item extraction.
//!
//! Turns a fetched document into ordered `(title, url)` items using the
//! three selectors configured on a resource.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Item, MISSING_TITLE, NO_TITLE, ResourceConfig};
use crate::utils::{normalize_whitespace, resolve_http_url};

/// Compiled selectors for one resource.
#[derive(Debug)]
pub struct Extractor {
    item: Selector,
    title: Selector,
    link: Selector,
}

impl Extractor {
    /// Compile raw selector strings.
    pub fn new(item: &str, title: &str, link: &str) -> Result<Self> {
        Ok(Self {
            item: parse_selector(item)?,
            title: parse_selector(title)?,
            link: parse_selector(link)?,
        })
    }

    /// Compile the selectors of a resource.
    pub fn for_resource(resource: &ResourceConfig) -> Result<Self> {
        Self::new(
            &resource.item_selector,
            &resource.title_selector,
            &resource.link_selector,
        )
    }

    /// Extract up to `limit` candidates in document order.
    ///
    /// The limit applies to matched containers, before candidates without
    /// a usable link are dropped.
    pub fn extract(&self, document: &Html, base_url: &Url, limit: usize) -> Vec<Item> {
        document
            .select(&self.item)
            .take(limit)
            .filter_map(|element| self.extract_item(&element, base_url))
            .collect()
    }

    /// Parse raw HTML and extract from it.
    pub fn extract_html(&self, html: &str, base_url: &Url, limit: usize) -> Vec<Item> {
        let document = Html::parse_document(html);
        let matched = document.select(&self.item).count();
        log::info!("Matched {matched} item elements on {base_url}, taking up to {limit}");
        self.extract(&document, base_url, limit)
    }

    fn extract_item(&self, element: &ElementRef, base_url: &Url) -> Option<Item> {
        let href = element
            .select(&self.link)
            .next()
            .and_then(|link| link.value().attr("href"))?;
        let url = resolve_http_url(base_url, href)?;

        let title = match element.select(&self.title).next() {
            Some(title) => {
                let text = normalize_whitespace(&title.text().collect::<String>());
                if text.is_empty() {
                    NO_TITLE.to_string()
                } else {
                    text
                }
            }
            None => MISSING_TITLE.to_string(),
        };

        Some(Item { title, url })
    }
}

/// Parse a user-supplied selector, reporting syntax errors as values.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Extract items from a parsed document with raw selector strings.
pub fn extract(
    document: &Html,
    item_selector: &str,
    title_selector: &str,
    link_selector: &str,
    base_url: &Url,
    limit: usize,
) -> Result<Vec<Item>> {
    let extractor = Extractor::new(item_selector, title_selector, link_selector)?;
    Ok(extractor.extract(document, base_url, limit))
}
