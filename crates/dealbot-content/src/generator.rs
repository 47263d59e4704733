//! The generator state machine.

use std::sync::Mutex;

use dealbot_core::{Candidate, ContentStyle};

use crate::fallback;
use crate::openai::{ChatMessage, OpenAiClient};

/// Observable backend state. The only transition back to `Live` is an
/// explicit [`ContentGenerator::recheck`] — no silent recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    Live,
    Degraded,
}

const SYSTEM_PROMPT: &str = "You are an expert Amazon affiliate marketer. Create engaging, \
     concise Telegram messages that drive clicks and conversions. Use emojis, highlight \
     savings, and create urgency. Keep messages under 300 words. Format for Telegram Markdown.";

/// Generates channel copy for a deal. Never fails: every error path lands on
/// the deterministic fallback templates.
pub struct ContentGenerator {
    client: Option<OpenAiClient>,
    mode: Mutex<GeneratorMode>,
}

impl ContentGenerator {
    /// Build a generator. `None` (no API key configured) starts — and stays —
    /// in `Degraded` mode.
    ///
    /// A bad key is not detected here; the first backend rejection flips the
    /// mode.
    #[must_use]
    pub fn new(api_key: Option<&str>, timeout_secs: u64) -> Self {
        let client = api_key.and_then(|key| match OpenAiClient::new(key, timeout_secs) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "content backend client build failed; using fallback templates");
                None
            }
        });
        Self::from_client(client)
    }

    /// Build from a preconstructed client (tests point this at a mock server).
    #[must_use]
    pub fn from_client(client: Option<OpenAiClient>) -> Self {
        let mode = if client.is_some() {
            GeneratorMode::Live
        } else {
            tracing::warn!("no content backend configured; using fallback templates");
            GeneratorMode::Degraded
        };
        Self {
            client,
            mode: Mutex::new(mode),
        }
    }

    #[must_use]
    pub fn mode(&self) -> GeneratorMode {
        *self.mode.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_mode(&self, mode: GeneratorMode) {
        *self
            .mode
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = mode;
    }

    /// Generate the channel message for one deal. Infallible by contract:
    /// backend errors degrade to templates.
    pub async fn telegram_message(
        &self,
        candidate: &Candidate,
        affiliate_url: &str,
        style: ContentStyle,
    ) -> String {
        let Some(client) = &self.client else {
            return fallback::render(candidate, affiliate_url, style);
        };
        if self.mode() == GeneratorMode::Degraded {
            return fallback::render(candidate, affiliate_url, style);
        }

        let prompt = build_prompt(candidate, style);
        let messages = [
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: &prompt,
            },
        ];

        match client.chat(&messages, 400, 0.8).await {
            Ok(text) => format!("{text}\n\n🛒 **[Get This Deal]({affiliate_url})**"),
            Err(e) => {
                if e.is_degrading() {
                    tracing::warn!(error = %e, "content backend unusable; switching to degraded mode");
                    self.set_mode(GeneratorMode::Degraded);
                } else {
                    tracing::error!(error = %e, "content generation failed; using fallback for this deal");
                }
                fallback::render(candidate, affiliate_url, style)
            }
        }
    }

    /// Probe the backend and return to `Live` on success.
    ///
    /// Returns the mode after the check. A generator without a client stays
    /// `Degraded` forever.
    pub async fn recheck(&self) -> GeneratorMode {
        let Some(client) = &self.client else {
            return GeneratorMode::Degraded;
        };

        match client.ping().await {
            Ok(()) => {
                if self.mode() == GeneratorMode::Degraded {
                    tracing::info!("content backend recovered; returning to live mode");
                }
                self.set_mode(GeneratorMode::Live);
                GeneratorMode::Live
            }
            Err(e) => {
                tracing::warn!(error = %e, "content backend still unavailable");
                self.set_mode(GeneratorMode::Degraded);
                GeneratorMode::Degraded
            }
        }
    }
}

fn build_prompt(candidate: &Candidate, style: ContentStyle) -> String {
    let description = if candidate.description.is_empty() {
        "Great deal on Amazon!"
    } else {
        &candidate.description
    };
    format!(
        "Create a {style} Telegram message for this Amazon deal:\n\n\
         Product: {title}\n\
         Price: {price}\n\
         Discount: {discount}\n\
         Category: {category}\n\
         Rating: {rating}/5 ⭐ ({reviews} reviews)\n\
         Description: {description}\n\n\
         Requirements:\n\
         - Start with eye-catching emojis\n\
         - Highlight the discount/savings\n\
         - Create urgency\n\
         - Use Telegram markdown formatting\n\
         - End with a strong call-to-action\n\
         - Keep under 280 characters\n\n\
         Do NOT include the affiliate link - it will be added separately.",
        title = candidate.title,
        price = candidate.price,
        discount = candidate.discount,
        category = candidate.category,
        rating = candidate.rating,
        reviews = candidate.review_count,
    )
}
