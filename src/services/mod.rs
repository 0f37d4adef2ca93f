//! Service layer for the scraper.
//!
//! This module contains:
//! - Item extraction from fetched pages (`Extractor`)
//! - Page fetching (`Fetcher`, `HttpFetcher`)
//! - Chat notifications (`Notifier`, `ChatTransport`)

pub mod extractor;
mod fetcher;
mod notifier;

pub use extractor::{Extractor, extract, parse_selector};
pub use fetcher::{Fetcher, HttpFetcher};
pub use notifier::{
    ChatTransport, LogTransport, Notifier, TELEGRAM_MESSAGE_LIMIT, TelegramTransport,
    render_batch, render_error, render_startup, split_message,
};
