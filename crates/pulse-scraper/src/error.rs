use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("scraper rejected credentials (HTTP {status})")]
    Auth { status: u16 },

    #[error("rate limited by scraper (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("scraper unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid scraper base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
