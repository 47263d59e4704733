//! Minimal chat-completions client.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::ContentError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/";
pub(crate) const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage<'a>],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for the chat-completions endpoint.
///
/// Use [`OpenAiClient::new`] for production or
/// [`OpenAiClient::with_base_url`] to point at a mock server in tests.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`ContentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ContentError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ContentError::Http`] if the client cannot be constructed, or
    /// [`ContentError::Api`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ContentError::Api {
            status: 0,
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Run one chat completion and return the first choice's content.
    ///
    /// # Errors
    ///
    /// - [`ContentError::AuthRejected`] — 401/403.
    /// - [`ContentError::QuotaExceeded`] — 429.
    /// - [`ContentError::Api`] — any other non-2xx status.
    /// - [`ContentError::Http`] — network failure.
    /// - [`ContentError::Deserialize`] — response shape mismatch.
    /// - [`ContentError::EmptyCompletion`] — no choices or empty content.
    pub async fn chat(
        &self,
        messages: &[ChatMessage<'_>],
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, ContentError> {
        let url = self
            .base_url
            .join("v1/chat/completions")
            .map_err(|e| ContentError::Api {
                status: 0,
                message: format!("invalid completions path: {e}"),
            })?;

        let request = ChatRequest {
            model: DEFAULT_MODEL,
            messages,
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ContentError::AuthRejected);
        }
        if status.as_u16() == 429 {
            return Err(ContentError::QuotaExceeded);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ContentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ContentError::Deserialize {
                context: "chat completion".to_string(),
                source: e,
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ContentError::EmptyCompletion)
    }

    /// Cheap connectivity probe used by the degraded-mode recheck.
    ///
    /// # Errors
    ///
    /// Same classification as [`OpenAiClient::chat`].
    pub async fn ping(&self) -> Result<(), ContentError> {
        let messages = [ChatMessage {
            role: "user",
            content: "Hello",
        }];
        self.chat(&messages, 10, 0.0).await.map(|_| ())
    }
}
