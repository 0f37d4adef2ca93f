//! Resource lifecycle management.
//!
//! `active ⇄ paused`, and either state `→ deleted`. Deleting or renaming a
//! resource abandons its seen history instead of removing it.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::ResourceConfig;
use crate::services::Extractor;
use crate::storage::ResourceStore;

/// Serialized create/update/delete/pause operations on a resource store.
pub struct ResourceRegistry {
    store: Arc<dyn ResourceStore>,
    lock: Mutex<()>,
}

impl ResourceRegistry {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Result<Vec<ResourceConfig>> {
        self.store.load_resources().await
    }

    pub async fn get(&self, name: &str) -> Result<ResourceConfig> {
        self.list()
            .await?
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| unknown(name))
    }

    /// Append a new resource; names must be unique.
    pub async fn add(&self, resource: ResourceConfig) -> Result<()> {
        check(&resource)?;

        let _guard = self.lock.lock().await;
        let mut resources = self.store.load_resources().await?;
        if resources.iter().any(|r| r.name == resource.name) {
            return Err(AppError::validation(format!(
                "resource '{}' already exists",
                resource.name
            )));
        }

        log::info!("Adding resource {}", resource.name);
        resources.push(resource);
        self.store.save_resources(&resources).await
    }

    /// Replace `name` in place with `resource`, which may carry a new name.
    pub async fn update(&self, name: &str, resource: ResourceConfig) -> Result<()> {
        check(&resource)?;

        let _guard = self.lock.lock().await;
        let mut resources = self.store.load_resources().await?;
        let index = position(&resources, name)?;
        if resource.name != name && resources.iter().any(|r| r.name == resource.name) {
            return Err(AppError::validation(format!(
                "resource '{}' already exists",
                resource.name
            )));
        }

        log::info!("Updating resource {} -> {}", name, resource.name);
        resources[index] = resource;
        self.store.save_resources(&resources).await
    }

    /// Delete a resource and return its last definition.
    pub async fn remove(&self, name: &str) -> Result<ResourceConfig> {
        let _guard = self.lock.lock().await;
        let mut resources = self.store.load_resources().await?;
        let index = position(&resources, name)?;

        let removed = resources.remove(index);
        self.store.save_resources(&resources).await?;
        log::info!("Removed resource {}", removed.name);
        Ok(removed)
    }

    /// Flip the paused flag and return its new value.
    pub async fn toggle_pause(&self, name: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut resources = self.store.load_resources().await?;
        let index = position(&resources, name)?;

        let resource = &mut resources[index];
        resource.paused = !resource.paused;
        let paused = resource.paused;
        self.store.save_resources(&resources).await?;

        log::info!(
            "Resource {} is now {}",
            name,
            if paused { "paused" } else { "active" }
        );
        Ok(paused)
    }
}

/// Validate fields and selector syntax.
pub fn check(resource: &ResourceConfig) -> Result<()> {
    resource.validate()?;
    Extractor::for_resource(resource)?;
    Ok(())
}

fn position(resources: &[ResourceConfig], name: &str) -> Result<usize> {
    resources
        .iter()
        .position(|r| r.name == name)
        .ok_or_else(|| unknown(name))
}

fn unknown(name: &str) -> AppError {
    AppError::validation(format!("unknown resource '{name}'"))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{Item, SeenSet};
    use crate::storage::{LocalStorage, SeenStore};

    fn resource(name: &str) -> ResourceConfig {
        ResourceConfig::new(name, format!("http://{name}.example/"), ".post", ".t", "a")
    }

    fn registry(tmp: &TempDir) -> (LocalStorage, ResourceRegistry) {
        let storage = LocalStorage::new(tmp.path());
        let registry = ResourceRegistry::new(Arc::new(storage.clone()));
        (storage, registry)
    }

    fn names(resources: &[ResourceConfig]) -> Vec<&str> {
        resources.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_add_appends_and_rejects_duplicates() {
        let tmp = TempDir::new().unwrap();
        let (_, registry) = registry(&tmp);

        registry.add(resource("one")).await.unwrap();
        registry.add(resource("two")).await.unwrap();
        assert!(registry.add(resource("one")).await.is_err());

        assert_eq!(names(&registry.list().await.unwrap()), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_selector() {
        let tmp = TempDir::new().unwrap();
        let (_, registry) = registry(&tmp);

        let mut bad = resource("bad");
        bad.title_selector = "[[".into();
        let err = registry.add(bad).await.unwrap_err();
        assert!(matches!(err, AppError::Selector { .. }));
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let tmp = TempDir::new().unwrap();
        let (_, registry) = registry(&tmp);
        for name in ["a", "b", "c"] {
            registry.add(resource(name)).await.unwrap();
        }

        registry.update("b", resource("renamed")).await.unwrap();
        assert_eq!(
            names(&registry.list().await.unwrap()),
            vec!["a", "renamed", "c"]
        );
        assert!(registry.update("a", resource("c")).await.is_err());
        assert!(registry.update("missing", resource("x")).await.is_err());
    }

    #[tokio::test]
    async fn test_toggle_pause() {
        let tmp = TempDir::new().unwrap();
        let (_, registry) = registry(&tmp);
        registry.add(resource("one")).await.unwrap();

        assert!(registry.toggle_pause("one").await.unwrap());
        assert!(registry.get("one").await.unwrap().paused);
        assert!(!registry.toggle_pause("one").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_abandons_seen_entry() {
        let tmp = TempDir::new().unwrap();
        let (storage, registry) = registry(&tmp);
        registry.add(resource("one")).await.unwrap();

        let mut seen = SeenSet::new();
        seen.insert("one".into(), vec![Item::new("A", "http://one.example/a")]);
        storage.save_seen(&seen).await.unwrap();

        let removed = registry.remove("one").await.unwrap();
        assert_eq!(removed.name, "one");
        assert!(registry.list().await.unwrap().is_empty());
        assert!(storage.load_seen().await.unwrap().contains_key("one"));
        assert!(registry.remove("one").await.is_err());
    }
}
