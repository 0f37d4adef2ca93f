//! Diff calculation for new-item notifications.
//!
//! Computes which freshly extracted items were not present in a
//! resource's seen history, and appends them to that history.

use std::collections::HashSet;

use crate::models::Item;

/// Result of diffing one resource's extraction against its history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Items whose URL was unknown before this run, in extraction order
    pub added: Vec<Item>,
    /// Number of extracted items whose URL was already known
    pub known: usize,
}

impl DiffResult {
    /// Check if there are any new items.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Partition `current` into new and known items by URL.
///
/// Only the history from before the run counts as known: a URL listed
/// twice on the same page is reported as new twice.
pub fn calculate_diff(previous: &[Item], current: &[Item]) -> DiffResult {
    let known_urls: HashSet<&str> = previous.iter().map(|item| item.url.as_str()).collect();

    let (known, added): (Vec<&Item>, Vec<&Item>) = current
        .iter()
        .partition(|item| known_urls.contains(item.url.as_str()));

    DiffResult {
        added: added.into_iter().cloned().collect(),
        known: known.len(),
    }
}

/// Append new items to a resource's history, keeping first-seen order.
///
/// Returns `true` when the history changed.
pub fn merge_into(history: &mut Vec<Item>, diff: &DiffResult) -> bool {
    if !diff.has_changes() {
        return false;
    }
    history.extend(diff.added.iter().cloned());
    true
}
