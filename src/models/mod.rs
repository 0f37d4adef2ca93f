// src/models/mod.rs

//! Domain models for the scraper.

mod batch;
mod config;
mod item;
mod resource;

// Re-export all public types
pub use batch::{BatchStatus, ResourceFailure, RunBatch, TaggedItem};
pub use config::{Config, NotifierConfig, NotifierKind, PathsConfig, ScheduleConfig, ScraperConfig};
pub use item::{Item, MISSING_TITLE, NO_TITLE, SeenSet};
pub use resource::ResourceConfig;
