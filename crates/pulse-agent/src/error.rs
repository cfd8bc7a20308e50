use pulse_analysis::AnalysisError;
use pulse_db::DbError;
use pulse_messaging::MessagingError;
use pulse_scraper::ScraperError;
use pulse_trends::TrendError;
use thiserror::Error;

/// Broad failure classes used in logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CollaboratorUnavailable,
    CollaboratorMalformed,
    StoreWrite,
    AlreadyFired,
    Timeout,
    Configuration,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::CollaboratorUnavailable => "collaborator-unavailable",
            ErrorKind::CollaboratorMalformed => "collaborator-malformed-response",
            ErrorKind::StoreWrite => "store-write-failure",
            ErrorKind::AlreadyFired => "already-fired",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one slot action attempt.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("scraper: {0}")]
    Scraper(#[from] ScraperError),

    #[error("trend source: {0}")]
    Trends(#[from] TrendError),

    #[error("analysis: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("messaging: {0}")]
    Messaging(#[from] MessagingError),

    #[error("store: {0}")]
    Db(#[from] DbError),

    #[error("slot action timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("not configured: {0}")]
    NotConfigured(&'static str),
}

impl SlotError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlotError::Scraper(
                ScraperError::Deserialize { .. } | ScraperError::UnexpectedStatus { .. },
            )
            | SlotError::Trends(TrendError::Parse { .. })
            | SlotError::Analysis(AnalysisError::Malformed { .. }) => {
                ErrorKind::CollaboratorMalformed
            }
            SlotError::Scraper(ScraperError::Auth { .. } | ScraperError::InvalidBaseUrl { .. })
            | SlotError::Analysis(AnalysisError::Auth { .. } | AnalysisError::InvalidBaseUrl { .. })
            | SlotError::Messaging(
                MessagingError::InvalidRecipient { .. } | MessagingError::InvalidBaseUrl { .. },
            )
            | SlotError::NotConfigured(_) => ErrorKind::Configuration,
            SlotError::Scraper(_)
            | SlotError::Trends(_)
            | SlotError::Analysis(_)
            | SlotError::Messaging(_) => ErrorKind::CollaboratorUnavailable,
            SlotError::Db(DbError::AlreadyFired { .. }) => ErrorKind::AlreadyFired,
            SlotError::Db(_) => ErrorKind::StoreWrite,
            SlotError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// `true` when the slot already fired for the day, possibly by another path.
    #[must_use]
    pub fn is_already_fired(&self) -> bool {
        self.kind() == ErrorKind::AlreadyFired
    }
}
