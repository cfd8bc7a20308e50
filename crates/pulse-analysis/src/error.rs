use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("analysis request timed out")]
    Timeout,

    #[error("rate limited by analysis API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("analysis API unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("analysis API rejected credentials (HTTP {status})")]
    Auth { status: u16 },

    #[error("unexpected HTTP status {status} from analysis API: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("malformed analysis response: {reason}")]
    Malformed { reason: String },

    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
