use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scored headline ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrendItem {
    pub headline: String,
    pub summary: String,
    pub link: Option<String>,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub relevance_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendItem {
    pub id: i64,
    pub fetched_at: DateTime<Utc>,
    pub headline: String,
    pub summary: String,
    pub link: Option<String>,
    pub source: String,
    pub relevance_score: f64,
}

impl TrendItem {
    /// Lowercased words of the headline longer than three characters.
    #[must_use]
    pub fn headline_terms(&self) -> Vec<String> {
        self.headline
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 3)
            .map(str::to_lowercase)
            .collect()
    }
}
