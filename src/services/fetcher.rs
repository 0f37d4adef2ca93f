// src/services/fetcher.rs

//! Page fetching.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::ScraperConfig;

/// Source of raw page bodies.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the body of `url`. Timeouts and non-success statuses are errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client with the configured User-Agent and timeout.
    ///
    /// Certificate verification follows `verify_tls`, which is off by default.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        if !config.verify_tls {
            log::debug!("TLS certificate verification is disabled for scraping");
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("HTTP status {status}")));
        }

        response.text().await.map_err(|e| AppError::fetch(url, e))
    }
}
