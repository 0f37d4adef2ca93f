//! Storage abstractions for resource definitions and seen items.
//!
//! Both stores follow a whole-value contract: `load` returns the complete
//! snapshot and `save` atomically replaces it.
//!
//! ## Directory Structure
//!
//! ```text
//! data/
//! ├── resources.json        # Ordered list of ResourceConfig
//! └── last_results.json     # SeenSet: resource name → seen items
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ResourceConfig, SeenSet};

// Re-export for convenience
pub use local::LocalStorage;

/// Durable, ordered list of resource definitions.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn load_resources(&self) -> Result<Vec<ResourceConfig>>;

    async fn save_resources(&self, resources: &[ResourceConfig]) -> Result<()>;
}

/// Durable map of previously observed items per resource.
#[async_trait]
pub trait SeenStore: Send + Sync {
    async fn load_seen(&self) -> Result<SeenSet>;

    async fn save_seen(&self, seen: &SeenSet) -> Result<()>;
}
