//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP fetching behavior
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Periodic run settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Data file locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Chat delivery settings
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply `TG_BOT_TOKEN`, `TG_CHAT_ID` and `PARSER_INTERVAL_MINUTES`
    /// from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TG_BOT_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.notifier.telegram_token = token;
            self.notifier.kind = NotifierKind::Telegram;
        }
        if let Some(chat_id) = lookup("TG_CHAT_ID").filter(|v| !v.trim().is_empty()) {
            self.notifier.telegram_chat_id = chat_id;
            self.notifier.kind = NotifierKind::Telegram;
        }
        if let Some(minutes) = lookup("PARSER_INTERVAL_MINUTES") {
            self.schedule.interval_minutes = minutes.trim().parse().map_err(|_| {
                AppError::config(format!("PARSER_INTERVAL_MINUTES is not a number: {minutes}"))
            })?;
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.scraper.max_concurrent == 0 {
            return Err(AppError::validation("scraper.max_concurrent must be > 0"));
        }
        if self.schedule.interval_minutes == 0 {
            return Err(AppError::validation("schedule.interval_minutes must be > 0"));
        }
        if self.schedule.interval_minutes > ScheduleConfig::MAX_INTERVAL_MINUTES {
            return Err(AppError::validation(format!(
                "schedule.interval_minutes must be at most {}",
                ScheduleConfig::MAX_INTERVAL_MINUTES
            )));
        }
        if self.schedule.run_limit == 0 || self.schedule.preview_limit == 0 {
            return Err(AppError::validation("schedule limits must be > 0"));
        }
        if self.notifier.kind == NotifierKind::Telegram {
            if self.notifier.telegram_token.trim().is_empty() {
                return Err(AppError::validation("notifier.telegram_token is empty"));
            }
            if self.notifier.telegram_chat_id.trim().is_empty() {
                return Err(AppError::validation("notifier.telegram_chat_id is empty"));
            }
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent page fetches within one run
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Verify TLS certificates. Off by default: scraped sites often
    /// serve broken chains.
    #[serde(default)]
    pub verify_tls: bool,
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            verify_tls: false,
        }
    }
}

/// Scheduled run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "defaults::interval_minutes")]
    pub interval_minutes: u64,

    #[serde(default = "defaults::initial_delay")]
    pub initial_delay_secs: u64,

    /// Item limit per resource for scheduled runs
    #[serde(default = "defaults::limit")]
    pub run_limit: usize,

    /// Item limit per resource for manual previews
    #[serde(default = "defaults::limit")]
    pub preview_limit: usize,
}

impl ScheduleConfig {
    /// Longest accepted interval: one week.
    pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: defaults::interval_minutes(),
            initial_delay_secs: defaults::initial_delay(),
            run_limit: defaults::limit(),
            preview_limit: defaults::limit(),
        }
    }
}

/// Data file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding `resources.json` and `last_results.json`
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

/// Which chat transport delivers notifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Write messages to the log only
    #[default]
    Log,
    /// Telegram Bot API
    Telegram,
}

/// Chat delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,

    #[serde(default)]
    pub telegram_token: String,

    #[serde(default)]
    pub telegram_chat_id: String,

    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            telegram_token: String::new(),
            telegram_chat_id: String::new(),
            api_base: defaults::api_base(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn interval_minutes() -> u64 {
        10
    }
    pub fn initial_delay() -> u64 {
        30
    }
    pub fn limit() -> usize {
        50
    }
    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
}
