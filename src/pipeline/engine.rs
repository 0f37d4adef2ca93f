// src/pipeline/engine.rs

//! Incremental scrape run.
//!
//! One run snapshots both stores, scrapes every active resource, diffs the
//! results against the seen history and persists the history in a single
//! write. The engine keeps no state between runs.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use url::Url;

use crate::error::Result;
use crate::models::{Item, ResourceConfig, ResourceFailure, RunBatch};
use crate::pipeline::diff::{calculate_diff, merge_into};
use crate::services::{Extractor, Fetcher};
use crate::storage::{ResourceStore, SeenStore};

/// Tunables for a run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Maximum items extracted per resource
    pub limit: usize,
    /// Maximum concurrent page fetches
    pub max_concurrent: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            limit: 50,
            max_concurrent: 4,
        }
    }
}

/// Computes new items per resource and maintains the seen history.
pub struct DiffEngine {
    resources: Arc<dyn ResourceStore>,
    seen: Arc<dyn SeenStore>,
    fetcher: Arc<dyn Fetcher>,
    options: RunOptions,
    /// Held for the whole load → diff → persist sequence.
    run_lock: Mutex<()>,
}

impl DiffEngine {
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        seen: Arc<dyn SeenStore>,
        fetcher: Arc<dyn Fetcher>,
        options: RunOptions,
    ) -> Self {
        Self {
            resources,
            seen,
            fetcher,
            options,
            run_lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Run once, waiting for any run already in flight to finish first.
    pub async fn run_once(&self) -> Result<RunBatch> {
        let _guard = self.run_lock.lock().await;
        self.run_locked().await
    }

    /// Run once unless another run is in flight, in which case `None`.
    pub async fn try_run_once(&self) -> Result<Option<RunBatch>> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            log::warn!("Previous run still in progress, skipping");
            return Ok(None);
        };
        self.run_locked().await.map(Some)
    }

    /// Preview a resource without diffing or touching the seen history.
    ///
    /// Unlike a scheduled run, failures are returned to the caller.
    pub async fn parse_once(&self, resource: &ResourceConfig, limit: usize) -> Result<Vec<Item>> {
        parse_once(self.fetcher.as_ref(), resource, limit).await
    }

    async fn run_locked(&self) -> Result<RunBatch> {
        let started_at = Utc::now();
        log::info!("Starting run, checking resources for new items");

        let resources = self.resources.load_resources().await?;
        if resources.is_empty() {
            log::warn!("Resource store is empty");
            return Ok(RunBatch::no_resources(started_at));
        }
        let mut seen = self.seen.load_seen().await?;

        let active: Vec<&ResourceConfig> = resources
            .iter()
            .filter(|resource| {
                if resource.paused {
                    log::info!("Resource {} is paused, skipping", resource.name);
                }
                !resource.paused
            })
            .collect();

        // All fetches complete before any diff is computed; `buffered`
        // yields results in store order.
        let limit = self.options.limit;
        let fetcher = self.fetcher.as_ref();
        let scraped: Vec<(&ResourceConfig, Result<Vec<Item>>)> = stream::iter(active)
            .map(|resource| async move { (resource, parse_once(fetcher, resource, limit).await) })
            .buffered(self.options.max_concurrent.max(1))
            .collect()
            .await;

        let mut batch = RunBatch::new(started_at, resources.len());
        let mut dirty = false;

        for (resource, result) in scraped {
            let items = match result {
                Ok(items) => items,
                Err(error) => {
                    log::error!("Failed to parse {}: {}", resource.name, error);
                    batch.failures.push(ResourceFailure {
                        resource: resource.name.clone(),
                        message: error.to_string(),
                    });
                    Vec::new()
                }
            };

            let history = seen.entry(resource.name.clone()).or_default();
            let diff = calculate_diff(history, &items);
            if merge_into(history, &diff) {
                dirty = true;
                log::info!(
                    "Added {} new items to history for {}",
                    diff.added.len(),
                    resource.name
                );
            } else if history.is_empty() {
                // Do not create entries for resources that never produced an item.
                seen.remove(&resource.name);
            }

            log::info!(
                "Parsed {} items from {} ({} new)",
                items.len(),
                resource.name,
                diff.added.len()
            );
            batch.extend(&resource.name, &items, &diff.added);
        }

        if dirty {
            self.seen.save_seen(&seen).await?;
        }

        log::info!(
            "Run finished: {} items, {} new, {} failed resources",
            batch.all_items.len(),
            batch.new_items.len(),
            batch.failures.len()
        );
        Ok(batch)
    }
}

/// Fetch and extract a single resource.
pub async fn parse_once(
    fetcher: &dyn Fetcher,
    resource: &ResourceConfig,
    limit: usize,
) -> Result<Vec<Item>> {
    log::info!("Parsing {} -> {}", resource.name, resource.url);

    let extractor = Extractor::for_resource(resource)?;
    let base_url = Url::parse(&resource.url)?;
    let html = fetcher.fetch(&resource.url).await?;

    let items = extractor.extract_html(&html, &base_url, limit);
    if items.is_empty() {
        log::warn!("No usable items for {} with the configured selectors", resource.name);
    } else {
        log::info!("Extracted {} items from {} (limit {})", items.len(), resource.name, limit);
    }
    Ok(items)
}
