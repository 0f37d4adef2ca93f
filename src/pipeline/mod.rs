//! Pipeline entry points for scraper operations.
//!
//! - `DiffEngine::run_once`: scrape active resources and report new items
//! - `parse_once`: preview a single resource without touching history
//! - `ResourceRegistry`: resource lifecycle
//! - `Scheduler`: periodic single-flight runs

pub mod diff;
mod engine;
mod registry;
mod schedule;

pub use diff::{DiffResult, calculate_diff};
pub use engine::{DiffEngine, RunOptions, parse_once};
pub use registry::{ResourceRegistry, check as check_resource};
pub use schedule::{Scheduler, TickOutcome};
