//! Local filesystem storage implementation.
//!
//! Every write goes to a temporary sibling file that is then renamed over
//! the target, so readers only ever observe a complete previous or new
//! version. Writers are serialized through a single lock shared by clones.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── resources.json        # Resource definitions
//! └── last_results.json     # Seen items per resource
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{ResourceConfig, SeenSet};
use crate::storage::{ResourceStore, SeenStore};

const RESOURCES_FILE: &str = "resources.json";
const SEEN_FILE: &str = "last_results.json";

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl LocalStorage {
    /// Create a LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        let _guard = self.write_lock.lock().await;

        let io = |e: std::io::Error| AppError::persistence(&path, e);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io)?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await.map_err(io)?;
        file.write_all(bytes).await.map_err(io)?;
        file.flush().await.map_err(io)?;
        file.sync_all().await.map_err(io)?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await.map_err(io)?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::persistence(&self.path(key), e))?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::persistence(&path, e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| AppError::persistence(&self.path(key), e)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ResourceStore for LocalStorage {
    async fn load_resources(&self) -> Result<Vec<ResourceConfig>> {
        match self.read_json::<Vec<ResourceConfig>>(RESOURCES_FILE).await? {
            Some(resources) => {
                log::info!("Loaded {} resources from {}", resources.len(), RESOURCES_FILE);
                Ok(resources)
            }
            None => {
                log::warn!("No {} found", RESOURCES_FILE);
                Ok(Vec::new())
            }
        }
    }

    async fn save_resources(&self, resources: &[ResourceConfig]) -> Result<()> {
        self.write_json(RESOURCES_FILE, resources).await?;
        log::info!("Saved {} resources", resources.len());
        Ok(())
    }
}

#[async_trait]
impl SeenStore for LocalStorage {
    async fn load_seen(&self) -> Result<SeenSet> {
        let seen = self.read_json::<SeenSet>(SEEN_FILE).await?.unwrap_or_default();
        log::debug!("Loaded seen items for {} resources", seen.len());
        Ok(seen)
    }

    async fn save_seen(&self, seen: &SeenSet) -> Result<()> {
        self.write_json(SEEN_FILE, seen).await?;
        log::info!("Saved seen items for {} resources", seen.len());
        Ok(())
    }
}
