//! Output of a single scrape run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Item;

/// An item tagged with the resource it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaggedItem {
    pub resource: String,
    pub item: Item,
}

/// A resource whose fetch or extraction failed during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceFailure {
    pub resource: String,
    pub message: String,
}

/// What a batch means for the notification that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// The resource store had no entries
    NoResources,
    /// Resources exist but none produced an item
    Empty,
    /// At least one item was extracted
    Collected,
}

/// Result of one diff-engine run.
///
/// Built fresh each run and consumed once by the notifier; only the
/// updated SeenSet is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunBatch {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Size of the resource store snapshot (paused included)
    pub resource_count: usize,

    /// Every freshly extracted item, in resource then document order
    pub all_items: Vec<TaggedItem>,

    /// Items whose URL was unknown at the start of the run
    pub new_items: Vec<TaggedItem>,

    /// Resources that were reduced to zero items by a failure
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ResourceFailure>,
}

impl RunBatch {
    /// Create an empty batch for a store snapshot of `resource_count` entries.
    pub fn new(started_at: DateTime<Utc>, resource_count: usize) -> Self {
        Self {
            started_at,
            resource_count,
            all_items: Vec::new(),
            new_items: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Batch for a run that found no configured resources.
    pub fn no_resources(started_at: DateTime<Utc>) -> Self {
        Self::new(started_at, 0)
    }

    /// Append one resource's results.
    pub fn extend(&mut self, resource: &str, all: &[Item], fresh: &[Item]) {
        let tag = |item: &Item| TaggedItem {
            resource: resource.to_string(),
            item: item.clone(),
        };
        self.all_items.extend(all.iter().map(tag));
        self.new_items.extend(fresh.iter().map(tag));
    }

    pub fn status(&self) -> BatchStatus {
        if self.resource_count == 0 {
            BatchStatus::NoResources
        } else if self.all_items.is_empty() {
            BatchStatus::Empty
        } else {
            BatchStatus::Collected
        }
    }

    pub fn has_new_items(&self) -> bool {
        !self.new_items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_distinguishes_empty_from_unconfigured() {
        let now = Utc::now();
        assert_eq!(RunBatch::no_resources(now).status(), BatchStatus::NoResources);
        assert_eq!(RunBatch::new(now, 2).status(), BatchStatus::Empty);

        let mut batch = RunBatch::new(now, 1);
        batch.extend("blog", &[Item::new("A", "http://example.com/a")], &[]);
        assert_eq!(batch.status(), BatchStatus::Collected);
        assert!(!batch.has_new_items());
    }

    #[test]
    fn test_extend_tags_items_in_order() {
        let mut batch = RunBatch::new(Utc::now(), 2);
        let a = Item::new("A", "http://example.com/a");
        let b = Item::new("B", "http://example.com/b");
        batch.extend("one", &[a.clone(), b.clone()], &[b.clone()]);
        batch.extend("two", &[a.clone()], &[a.clone()]);

        let order: Vec<_> = batch
            .all_items
            .iter()
            .map(|t| (t.resource.as_str(), t.item.url.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("one", "http://example.com/a"),
                ("one", "http://example.com/b"),
                ("two", "http://example.com/a"),
            ]
        );
        assert_eq!(batch.new_items.len(), 2);
        assert_eq!(batch.new_items[0].resource, "one");
        assert_eq!(batch.new_items[1].resource, "two");
    }
}
