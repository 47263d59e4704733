//! Telegram Bot API client for channel delivery.
//!
//! Wraps `reqwest` with Telegram-specific error handling and typed response
//! deserialization. Every response envelope carries an `ok` flag; API-level
//! failures surface as [`ChannelError::Api`].

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org/";

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {description}")]
    Api { description: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    description: Option<String>,
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Client for the Telegram Bot API.
///
/// Use [`ChannelClient::new`] for production or
/// [`ChannelClient::with_base_url`] to point at a mock server in tests.
pub struct ChannelClient {
    client: Client,
    token: String,
    base_url: Url,
}

impl ChannelClient {
    /// # Errors
    ///
    /// Returns [`ChannelError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, ChannelError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ChannelError::Http`] if the client cannot be constructed, or
    /// [`ChannelError::Api`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ChannelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ChannelError::Api {
            description: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url,
        })
    }

    /// Send a Markdown-formatted message to a chat or channel.
    ///
    /// Returns the Telegram message id.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::Api`] — Telegram answered `ok=false` or an error status.
    /// - [`ChannelError::Http`] — network failure.
    /// - [`ChannelError::Deserialize`] — response shape mismatch.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<i64, ChannelError> {
        let url = self
            .base_url
            .join(&format!("bot{}/sendMessage", self.token))
            .map_err(|e| ChannelError::Api {
                description: format!("invalid sendMessage path: {e}"),
            })?;

        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: false,
        };

        let response = self.client.post(url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| ChannelError::Deserialize {
                context: format!("sendMessage to {chat_id} (status {status})"),
                source: e,
            })?;

        if !envelope.ok {
            return Err(ChannelError::Api {
                description: envelope
                    .description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            });
        }

        let message_id = envelope
            .result
            .map(|m| m.message_id)
            .ok_or_else(|| ChannelError::Api {
                description: "ok response without result".to_string(),
            })?;

        tracing::debug!(chat_id, message_id, "channel message sent");
        Ok(message_id)
    }
}
