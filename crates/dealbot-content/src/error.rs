use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401/403 from the backend — the key is bad, not the request.
    #[error("content backend rejected credentials")]
    AuthRejected,

    /// 429 from the backend.
    #[error("content backend quota exceeded")]
    QuotaExceeded,

    #[error("content backend error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("content backend returned an empty completion")]
    EmptyCompletion,
}

impl ContentError {
    /// Errors that flip the generator to `Degraded` (retrying other requests
    /// will not help until the key or quota changes).
    #[must_use]
    pub fn is_degrading(&self) -> bool {
        matches!(self, ContentError::AuthRejected | ContentError::QuotaExceeded)
    }
}
