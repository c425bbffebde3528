//! Alert delivery
//!
//! Alerts are HTML formatted for the Telegram Bot API. Delivery never fails the
//! scanner: transient errors are retried briefly, anything left is logged.

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Destination for operator-facing messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one HTML message
    async fn send(&self, message: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Telegram delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_bot_token")]
    pub bot_token: String,

    #[serde(default = "default_chat_id")]
    pub chat_id: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Total time spent retrying one message
    #[serde(default = "default_max_retry_ms")]
    pub max_retry_ms: u64,
}

fn default_bot_token() -> String {
    std::env::var("TELEGRAM_TOKEN").unwrap_or_default()
}
fn default_chat_id() -> String {
    std::env::var("TELEGRAM_CHAT_ID").unwrap_or_default()
}
fn default_api_url() -> String { "https://api.telegram.org".to_string() }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_max_retry_ms() -> u64 { 5_000 }

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: default_bot_token(),
            chat_id: default_chat_id(),
            api_url: default_api_url(),
            timeout_ms: default_timeout_ms(),
            max_retry_ms: default_max_retry_ms(),
        }
    }
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

/// Telegram Bot API response envelope
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through the Telegram Bot API
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    /// Single delivery attempt
    async fn send_once(&self, message: &str) -> Result<()> {
        let body = json!({
            "chat_id": self.config.chat_id,
            "text": message,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            // reqwest errors can echo the URL, which carries the bot token
            .map_err(|e| Error::Notification(e.without_url().to_string()))?;

        let status = response.status();
        let parsed: Option<TelegramResponse> = response.json().await.ok();
        let description = parsed
            .as_ref()
            .and_then(|r| r.description.clone())
            .unwrap_or_else(|| status.to_string());

        if status.is_success() && parsed.as_ref().map(|r| r.ok).unwrap_or(true) {
            return Ok(());
        }

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Err(Error::Notification(description))
        } else {
            Err(Error::NotificationRejected(description))
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_millis(2_000),
            max_elapsed_time: Some(Duration::from_millis(self.config.max_retry_ms)),
            ..Default::default()
        };

        retry(backoff, || async {
            match self.send_once(message).await {
                Ok(()) => Ok(()),
                Err(e) if e.is_retryable() => {
                    debug!(error = %e, "Retryable Telegram error");
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

/// Writes messages to the log only
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        info!(message = %strip_tags(message), "Alert");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Telegram when credentials are present, log-only otherwise
pub fn from_config(config: &TelegramConfig) -> Result<Box<dyn Notifier>> {
    if config.is_configured() {
        Ok(Box::new(TelegramNotifier::new(config.clone())?))
    } else {
        warn!("Telegram credentials not set, alerts will only be logged");
        Ok(Box::new(LogNotifier))
    }
}

/// Plain-text rendering of an HTML message for the audit log
pub fn strip_tags(message: &str) -> String {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    match TAGS.get_or_init(|| Regex::new(r"<[^>]+>").ok()) {
        Some(tags) => tags.replace_all(message, "").into_owned(),
        None => message.to_string(),
    }
}

/// Escape text interpolated into an HTML message
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
