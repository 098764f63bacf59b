//! Telegram Bot API client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{TelegramError, TelegramResult};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Longest Retry-After the client will sleep through before giving up.
const MAX_RETRY_AFTER_SECS: u64 = 30;

/// Configuration for the Telegram client.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Numeric chat ID or `@channel` username.
    pub chat_id: String,
    pub api_base: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }

    /// Create config from environment variables.
    ///
    /// Returns `Ok(None)` when neither `TELEGRAM_BOT_TOKEN` nor
    /// `TELEGRAM_CHAT_ID` is set; setting only one of them is an error.
    pub fn from_env() -> TelegramResult<Option<Self>> {
        let token = non_empty_env("TELEGRAM_BOT_TOKEN");
        let chat_id = non_empty_env("TELEGRAM_CHAT_ID");

        let (bot_token, chat_id) = match (token, chat_id) {
            (None, None) => return Ok(None),
            (Some(token), Some(chat)) => (token, chat),
            (Some(_), None) => {
                return Err(TelegramError::Config(
                    "TELEGRAM_CHAT_ID must be set together with TELEGRAM_BOT_TOKEN".into(),
                ))
            }
            (None, Some(_)) => {
                return Err(TelegramError::Config(
                    "TELEGRAM_BOT_TOKEN must be set together with TELEGRAM_CHAT_ID".into(),
                ))
            }
        };

        let mut config = Self::new(bot_token, chat_id);
        if let Some(base) = non_empty_env("TELEGRAM_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        config.timeout = Duration::from_secs(
            std::env::var("TELEGRAM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        );
        config.max_retries = std::env::var("TELEGRAM_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2);

        Ok(Some(config))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

// =============================================================================
// Client
// =============================================================================

/// Sends HTML messages to one chat.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> TelegramResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("vpipe-telegram/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TelegramError::Network)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Send an HTML-formatted message to the configured chat.
    pub async fn send_message(&self, html: &str) -> TelegramResult<()> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.send_once(html).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = match e {
                        TelegramError::RateLimited(secs) if secs > MAX_RETRY_AFTER_SECS => {
                            return Err(e)
                        }
                        TelegramError::RateLimited(secs) => Duration::from_secs(secs),
                        _ => Duration::from_millis(500 * 2u64.pow(attempt)),
                    };
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Telegram send failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| TelegramError::api(0, "retries exhausted")))
    }

    async fn send_once(&self, html: &str) -> TelegramResult<()> {
        let url = format!("{}/bot{}/sendMessage", self.config.api_base, self.config.bot_token);
        let body = SendMessageRequest {
            chat_id: &self.config.chat_id,
            text: html,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let parsed: Option<ApiResponse> = serde_json::from_str(&text).ok();
        match parsed {
            Some(api) if api.ok => {
                debug!(chat_id = %self.config.chat_id, "Telegram message sent");
                Ok(())
            }
            Some(api) => {
                let code = api.error_code.unwrap_or(status.as_u16());
                if let Some(secs) = api.parameters.and_then(|p| p.retry_after) {
                    return Err(TelegramError::RateLimited(secs));
                }
                Err(TelegramError::api(
                    code,
                    api.description.unwrap_or_else(|| "no description".into()),
                ))
            }
            None if status.is_success() => Ok(()),
            None => Err(TelegramError::api(status.as_u16(), text)),
        }
    }
}
