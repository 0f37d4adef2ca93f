// src/error.rs

//! Unified error handling for the scraper.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Fetching a page failed (network, timeout or HTTP status)
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Page could not be turned into items
    #[error("Extraction error for {context}: {message}")]
    Extraction { context: String, message: String },

    /// Store read/write failed
    #[error("Persistence error for {path}: {message}")]
    Persistence { path: String, message: String },

    /// Notification could not be delivered
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create an extraction error with context.
    pub fn extraction(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Extraction {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error for a store location.
    pub fn persistence(path: &Path, message: impl fmt::Display) -> Self {
        Self::Persistence {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error.
    pub fn delivery(message: impl fmt::Display) -> Self {
        Self::Delivery(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = AppError::fetch("http://example.com", "status 500");
        assert_eq!(
            err.to_string(),
            "Fetch failed for http://example.com: status 500"
        );
    }
}
