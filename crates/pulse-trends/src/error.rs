use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("failed to parse feed {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("all {count} trend feeds failed")]
    AllFeedsFailed { count: usize },
}
