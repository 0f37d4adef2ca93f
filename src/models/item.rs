//! Extracted item and per-resource history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Title used when an item has no title element.
pub const MISSING_TITLE: &str = "—";

/// Title used when the title element has no text.
pub const NO_TITLE: &str = "No title";

/// One extracted (title, URL) pair.
///
/// Equality compares both fields. Seen-history deduplication matches on the
/// URL only, so a retitled item is not reported as new.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Plain-text title, never empty
    pub title: String,

    /// Absolute http(s) URL
    pub url: String,
}

impl Item {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Resource name → items observed so far, in first-seen order.
///
/// Sorted keys keep the serialized form stable across runs.
pub type SeenSet = BTreeMap<String, Vec<Item>>;
