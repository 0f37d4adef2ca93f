// src/lib.rs

//! sitewatch: scrape configured pages and announce new items.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
