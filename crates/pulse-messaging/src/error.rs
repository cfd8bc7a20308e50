use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid recipient {number}: {reason}")]
    InvalidRecipient { number: String, reason: String },

    #[error("message send failed (HTTP {status}, code {code:?}): {message}")]
    SendFailed {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("failed to deserialize {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
