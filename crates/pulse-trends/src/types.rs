use chrono::{DateTime, Utc};

/// One headline read from a feed, before relevance scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub headline: String,
    /// Plain-text summary with markup removed; may be empty.
    pub summary: String,
    pub link: Option<String>,
    /// Feed title, or the feed URL when the feed has no title.
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
}
