use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;

use crate::error::TrendError;
use crate::parse::parse_feed;
use crate::types::FeedEntry;

/// Feeds fetched at the same time.
const MAX_CONCURRENT_FEEDS: usize = 4;

/// Reads headline entries from a list of feeds.
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Entries from every reachable feed, grouped in feed-list order.
    ///
    /// A feed that cannot be fetched or parsed is skipped. An empty feed list
    /// yields an empty result.
    async fn fetch_headlines(&self, feeds: &[String]) -> Result<Vec<FeedEntry>, TrendError>;
}

/// HTTP feed reader for RSS, Atom and JSON Feed documents.
pub struct RssTrendSource {
    client: Client,
}

impl RssTrendSource {
    /// # Errors
    ///
    /// Returns [`TrendError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, TrendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_one(&self, url: &str) -> Result<Vec<FeedEntry>, TrendError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TrendError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        let body = response.bytes().await?;
        parse_feed(url, &body)
    }
}

#[async_trait]
impl TrendSource for RssTrendSource {
    async fn fetch_headlines(&self, feeds: &[String]) -> Result<Vec<FeedEntry>, TrendError> {
        if feeds.is_empty() {
            return Ok(Vec::new());
        }

        // `buffered` keeps feed order so downstream ties stay deterministic.
        let fetches: Vec<_> = feeds
            .iter()
            .map(|url| async move { (url, self.fetch_one(url).await) })
            .collect();
        let results = stream::iter(fetches)
        .buffered(MAX_CONCURRENT_FEEDS)
        .collect::<Vec<_>>()
        .await;

        let mut entries = Vec::new();
        let mut failed = 0usize;
        for (url, result) in results {
            match result {
                Ok(mut feed_entries) => {
                    tracing::debug!(url = %url, entries = feed_entries.len(), "feed fetched");
                    entries.append(&mut feed_entries);
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(url = %url, error = %e, "feed fetch failed, skipping");
                }
            }
        }

        if failed == feeds.len() {
            return Err(TrendError::AllFeedsFailed { count: failed });
        }

        tracing::info!(
            feeds = feeds.len(),
            failed,
            entries = entries.len(),
            "trend feeds fetched"
        );
        Ok(entries)
    }
}
