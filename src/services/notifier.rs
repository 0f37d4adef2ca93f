// src/services/notifier.rs

//! Chat notifications.
//!
//! `Notifier` renders run batches and error reports into Telegram-style
//! HTML and hands them to a `ChatTransport`.

use std::sync::Arc;

use async_trait::async_trait;
use html_escape::{encode_single_quoted_attribute, encode_text};
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{BatchStatus, NotifierConfig, NotifierKind, RunBatch, TaggedItem};

/// Telegram rejects messages longer than this.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Delivers a rendered message to a channel.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;

    /// Maximum message length in characters.
    fn max_len(&self) -> usize {
        TELEGRAM_MESSAGE_LIMIT
    }
}

/// Transport that only writes messages to the log.
#[derive(Debug, Default, Clone)]
pub struct LogTransport;

#[async_trait]
impl ChatTransport for LogTransport {
    async fn send_text(&self, text: &str) -> Result<()> {
        log::info!("Notification:\n{text}");
        Ok(())
    }

    fn max_len(&self) -> usize {
        usize::MAX
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Telegram Bot API `sendMessage` transport.
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramTransport {
    pub fn new(api_base: &str, token: &str, chat_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token),
            chat_id: chat_id.into(),
        })
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(AppError::delivery)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::delivery(format!("Telegram returned {status}: {detail}")));
        }

        log::info!("Message delivered to Telegram chat {}", self.chat_id);
        Ok(())
    }
}

/// Renders and delivers notifications.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn ChatTransport>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    /// Build the notifier selected by configuration.
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        let transport: Arc<dyn ChatTransport> = match config.kind {
            NotifierKind::Log => Arc::new(LogTransport),
            NotifierKind::Telegram => Arc::new(TelegramTransport::new(
                &config.api_base,
                &config.telegram_token,
                config.telegram_chat_id.clone(),
            )?),
        };
        Ok(Self::new(transport))
    }

    /// Send the summary of a run.
    pub async fn send_batch(&self, batch: &RunBatch) -> Result<()> {
        self.send(&render_batch(batch)).await
    }

    /// Send a run-level failure report.
    pub async fn send_error(&self, report: &str) -> Result<()> {
        self.send(&render_error(report)).await
    }

    /// Announce that the scheduler is running.
    pub async fn send_startup(&self, initial_delay_secs: u64, interval_minutes: u64) -> Result<()> {
        self.send(&render_startup(initial_delay_secs, interval_minutes))
            .await
    }

    /// Announce that the scheduler is stopping.
    pub async fn send_shutdown(&self) -> Result<()> {
        self.send(&render_shutdown()).await
    }

    async fn send(&self, message: &str) -> Result<()> {
        for chunk in split_message(message, self.transport.max_len()) {
            self.transport.send_text(&chunk).await?;
        }
        Ok(())
    }
}

/// Render a batch according to its status.
pub fn render_batch(batch: &RunBatch) -> String {
    match batch.status() {
        BatchStatus::NoResources => "Resource list is empty".to_string(),
        BatchStatus::Empty => "Nothing was scraped 😔".to_string(),
        BatchStatus::Collected => {
            let mut message = format!("<b>🔥 Fresh articles ({})</b>\n", batch.all_items.len());
            message.push_str(&render_grouped(&batch.all_items));

            if batch.has_new_items() {
                message.push_str(&format!(
                    "\n\n<b>New among them ({}):</b>\n",
                    batch.new_items.len()
                ));
                message.push_str(&render_grouped(&batch.new_items));
            }
            message
        }
    }
}

/// Render a run-level failure with a visible error marker.
pub fn render_error(report: &str) -> String {
    format!(
        "<b>🚨 Scraper error!</b>\n\n{}\n\nCheck the logs for details.",
        encode_text(report)
    )
}

pub fn render_startup(initial_delay_secs: u64, interval_minutes: u64) -> String {
    format!(
        "<b>Scraper started!</b>\n\nFirst run in {initial_delay_secs} seconds\nThen every {interval_minutes} minutes ✅"
    )
}

pub fn render_shutdown() -> String {
    "<b>🛑 Scraper is shutting down…</b>\n\nNo further runs until it is restarted.".to_string()
}

/// Items grouped under a heading per consecutive resource.
fn render_grouped(items: &[TaggedItem]) -> String {
    let mut lines = Vec::new();
    let mut current: Option<&str> = None;

    for tagged in items {
        if current != Some(tagged.resource.as_str()) {
            current = Some(tagged.resource.as_str());
            lines.push(format!("\n<b>📍 {}</b>\n", encode_text(&tagged.resource)));
        }
        lines.push(format!(
            "• <a href='{}'>{}</a>",
            encode_single_quoted_attribute(&tagged.item.url),
            encode_text(&tagged.item.title)
        ));
    }

    lines.join("\n")
}

/// Split on line boundaries so every chunk fits within `max_len` chars.
///
/// A single line longer than the limit is shortened instead of cut, so no
/// chunk ever carries half of an element.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.chars().count() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in message.split('\n') {
        let shortened;
        let line = if line.chars().count() > max_len {
            shortened = shorten_line(line, max_len);
            shortened.as_str()
        } else {
            line
        };
        let line_len = line.chars().count();
        let sep = usize::from(!current.is_empty());

        if current_len + sep + line_len > max_len && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

/// A piece of a rendered line: a tag, an entity or a single character.
struct Token<'a> {
    text: &'a str,
    markup: bool,
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = line;

    while let Some(first) = rest.chars().next() {
        let end = match first {
            '<' => rest.find('>').map(|i| i + 1),
            '&' => rest
                .find(';')
                .filter(|&i| i <= 10 && !rest[..i].contains(char::is_whitespace))
                .map(|i| i + 1),
            _ => None,
        }
        .unwrap_or(first.len_utf8());

        tokens.push(Token {
            text: &rest[..end],
            markup: first == '<' && end > 1,
        });
        rest = &rest[end..];
    }
    tokens
}

/// Trim the text of an over-long line to `max_len` chars, keeping every tag.
///
/// When the tags alone do not fit, the markup is dropped and plain text is
/// trimmed instead.
fn shorten_line(line: &str, max_len: usize) -> String {
    let tokens = tokenize(line);
    let markup_len: usize = tokens
        .iter()
        .filter(|t| t.markup)
        .map(|t| t.text.chars().count())
        .sum();
    let keep_markup = markup_len < max_len;
    let mut budget = if keep_markup {
        max_len - markup_len - 1
    } else {
        max_len.saturating_sub(1)
    };

    let mut out = String::new();
    let mut truncated = false;
    for token in tokens {
        if token.markup {
            if keep_markup {
                out.push_str(token.text);
            }
            continue;
        }
        if truncated {
            continue;
        }
        let len = token.text.chars().count();
        if len <= budget {
            out.push_str(token.text);
            budget -= len;
        } else {
            out.push('…');
            truncated = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::models::Item;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
        limit: Option<usize>,
    }

    #[async_trait]
    impl ChatTransport for Recorder {
        async fn send_text(&self, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn max_len(&self) -> usize {
            self.limit.unwrap_or(TELEGRAM_MESSAGE_LIMIT)
        }
    }

    fn batch() -> RunBatch {
        let mut batch = RunBatch::new(Utc::now(), 2);
        let a = Item::new("First <post>", "http://example.com/a");
        let b = Item::new("Second", "http://example.com/b");
        let c = Item::new("Other", "http://other.org/c");
        batch.extend("blog", &[a.clone(), b], &[a]);
        batch.extend("news", &[c], &[]);
        batch
    }

    #[test]
    fn test_render_collected_batch() {
        let message = render_batch(&batch());
        assert!(message.starts_with("<b>🔥 Fresh articles (3)</b>"));
        assert!(message.contains("<b>📍 blog</b>"));
        assert!(message.contains("<b>📍 news</b>"));
        assert!(message.contains("• <a href='http://example.com/a'>First &lt;post&gt;</a>"));
        assert!(message.contains("<b>New among them (1):</b>"));
    }

    #[test]
    fn test_render_without_new_items_has_no_new_section() {
        let mut batch = RunBatch::new(Utc::now(), 1);
        batch.extend("blog", &[Item::new("A", "http://example.com/a")], &[]);
        assert!(!render_batch(&batch).contains("New among them"));
    }

    #[test]
    fn test_render_empty_and_unconfigured_differ() {
        let empty = render_batch(&RunBatch::new(Utc::now(), 3));
        let none = render_batch(&RunBatch::no_resources(Utc::now()));
        assert_ne!(empty, none);
        assert_eq!(none, "Resource list is empty");
    }

    #[test]
    fn test_render_error_has_marker() {
        let message = render_error("disk full");
        assert!(message.contains("🚨"));
        assert!(message.contains("disk full"));
    }

    #[test]
    fn test_split_message_on_lines() {
        let message = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(message, 100), vec![message.to_string()]);
        assert_eq!(split_message(message, 9), vec!["aaaa\nbbbb", "cccc"]);
        assert_eq!(split_message("abcdefgh", 3), vec!["ab…"]);
    }

    #[test]
    fn test_split_keeps_long_link_balanced() {
        let message = format!(
            "<b>h</b>\n• <a href='http://example.com/a'>{}</a>",
            "x".repeat(5000)
        );
        let chunks = split_message(&message, TELEGRAM_MESSAGE_LIMIT);

        for chunk in &chunks {
            assert!(chunk.chars().count() <= TELEGRAM_MESSAGE_LIMIT);
            assert_eq!(chunk.matches("<a ").count(), chunk.matches("</a>").count());
        }
        let last = chunks.last().unwrap();
        assert!(last.starts_with("• <a href='http://example.com/a'>xxx"));
        assert!(last.ends_with("x…</a>"));
    }

    #[test]
    fn test_split_does_not_cut_entities() {
        let line = format!("<i>{}</i>", "&amp;".repeat(10));
        let chunks = split_message(&line, 18);
        assert_eq!(chunks, vec!["<i>&amp;&amp;…</i>"]);
    }

    #[test]
    fn test_split_drops_markup_that_cannot_fit() {
        let line = format!("<a href='http://example.com/{}'>t</a>", "p".repeat(50));
        let chunks = split_message(&line, 10);
        assert_eq!(chunks, vec!["t"]);
    }

    #[tokio::test]
    async fn test_notifier_chunks_long_messages() {
        let recorder = Arc::new(Recorder {
            limit: Some(40),
            ..Recorder::default()
        });
        let notifier = Notifier::new(recorder.clone());
        notifier.send_batch(&batch()).await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert!(sent.len() > 1);
        assert!(sent.iter().all(|chunk| chunk.chars().count() <= 40));
    }

    #[test]
    fn test_render_escapes_link_attribute() {
        let mut batch = RunBatch::new(Utc::now(), 1);
        batch.extend(
            "blog",
            &[Item::new("Q&A", "http://example.com/?q=it's&x=1")],
            &[],
        );
        let message = render_batch(&batch);
        assert!(message.contains(">Q&amp;A</a>"));
        assert!(message.contains("&amp;x=1'"));
        assert!(!message.contains("it's"));
    }

    #[test]
    fn test_render_shutdown() {
        let message = render_shutdown();
        assert!(message.starts_with("<b>🛑 Scraper is shutting down"));
    }

    #[tokio::test]
    async fn test_notifier_delivers_every_chunk_of_oversized_title() {
        let recorder = Arc::new(Recorder::default());
        let notifier = Notifier::new(recorder.clone());

        let mut batch = RunBatch::new(Utc::now(), 1);
        let long = Item::new("y".repeat(TELEGRAM_MESSAGE_LIMIT + 10), "http://example.com/long");
        let short = Item::new("Short", "http://example.com/short");
        batch.extend("blog", &[long, short], &[]);
        notifier.send_batch(&batch).await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert!(sent.len() > 1);
        for chunk in sent.iter() {
            assert!(chunk.chars().count() <= TELEGRAM_MESSAGE_LIMIT);
            assert_eq!(chunk.matches("<a ").count(), chunk.matches("</a>").count());
        }
        assert!(sent.last().unwrap().contains(">Short</a>"));
    }

    #[tokio::test]
    async fn test_notifier_sends_error_report() {
        let recorder = Arc::new(Recorder::default());
        let notifier = Notifier::new(recorder.clone());
        notifier.send_error("boom").await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("<b>🚨 Scraper error!</b>"));
    }
}
