use std::time::Duration;

use async_trait::async_trait;
use pulse_core::{Platform, ProfilePost};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ScraperError;
use crate::normalize::{normalize_instagram, normalize_tiktok};
use crate::rate_limit::retry_with_backoff;
use crate::types::{InstagramProfileItem, TiktokItem};

const DEFAULT_BASE_URL: &str = "https://api.apify.com/";

/// Fetches a creator's recent posts from a social platform.
#[async_trait]
pub trait ScraperClient: Send + Sync {
    /// Up to `limit` of the most recent posts for `handle`, newest first.
    async fn fetch_recent_posts(
        &self,
        platform: Platform,
        handle: &str,
        limit: u32,
    ) -> Result<Vec<ProfilePost>, ScraperError>;
}

/// Client for Apify's synchronous actor-run endpoint.
///
/// Each call starts an actor run, waits for it to finish and reads the
/// dataset items from the same response. Use [`ApifyClient::new`] for
/// production or [`ApifyClient::with_base_url`] to point at a mock server.
pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl ApifyClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        token: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        Self::with_base_url(
            token,
            timeout_secs,
            user_agent,
            max_retries,
            backoff_base_secs,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ScraperError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url,
            max_retries,
            backoff_base_secs,
        })
    }

    fn actor_id(platform: Platform) -> &'static str {
        match platform {
            Platform::Instagram => "apify~instagram-profile-scraper",
            Platform::Tiktok => "clockworks~tiktok-scraper",
        }
    }

    fn run_input(platform: Platform, handle: &str, limit: u32) -> Value {
        match platform {
            Platform::Instagram => json!({
                "usernames": [handle],
                "resultsLimit": limit,
            }),
            Platform::Tiktok => json!({
                "profiles": [handle],
                "resultsPerPage": limit,
                "shouldDownloadVideos": false,
                "shouldDownloadCovers": false,
                "shouldDownloadSubtitles": false,
                "shouldDownloadSlideshowImages": false,
            }),
        }
    }

    fn run_url(&self, platform: Platform) -> Result<Url, ScraperError> {
        let path = format!(
            "v2/acts/{}/run-sync-get-dataset-items",
            Self::actor_id(platform)
        );
        self.base_url
            .join(&path)
            .map_err(|e| ScraperError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Run the platform's actor and decode its dataset items as `T`.
    async fn run_actor<T: DeserializeOwned>(
        &self,
        platform: Platform,
        handle: &str,
        limit: u32,
    ) -> Result<Vec<T>, ScraperError> {
        let url = self.run_url(platform)?;
        let input = Self::run_input(platform, handle, limit);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            let input = input.clone();
            async move {
                let response = self
                    .client
                    .post(url.clone())
                    .bearer_auth(&self.token)
                    .json(&input)
                    .send()
                    .await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ScraperError::RateLimited { retry_after_secs });
                }
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    return Err(ScraperError::Auth {
                        status: status.as_u16(),
                    });
                }
                if status == StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound {
                        url: url.to_string(),
                    });
                }
                // 408 is returned when the synchronous run outlives the request.
                if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
                    return Err(ScraperError::Unavailable {
                        status: status.as_u16(),
                    });
                }
                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<Vec<T>>(&body).map_err(|e| ScraperError::Deserialize {
                    context: format!("{platform} dataset for @{handle}"),
                    source: e,
                })
            }
        })
        .await
    }
}

#[async_trait]
impl ScraperClient for ApifyClient {
    async fn fetch_recent_posts(
        &self,
        platform: Platform,
        handle: &str,
        limit: u32,
    ) -> Result<Vec<ProfilePost>, ScraperError> {
        let handle = handle.trim().trim_start_matches('@');
        let max = usize::try_from(limit).unwrap_or(usize::MAX);

        let posts = match platform {
            Platform::Instagram => {
                let items: Vec<InstagramProfileItem> =
                    self.run_actor(platform, handle, limit).await?;
                normalize_instagram(items, max)
            }
            Platform::Tiktok => {
                let items: Vec<TiktokItem> = self.run_actor(platform, handle, limit).await?;
                normalize_tiktok(items, max)
            }
        };

        tracing::info!(
            platform = %platform,
            handle,
            posts = posts.len(),
            "fetched recent posts"
        );
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_url_uses_actor_path() {
        let client = ApifyClient::with_base_url("t", 5, "ua", 0, 0, "http://localhost:9999").unwrap();
        assert_eq!(
            client.run_url(Platform::Tiktok).unwrap().as_str(),
            "http://localhost:9999/v2/acts/clockworks~tiktok-scraper/run-sync-get-dataset-items"
        );
    }

    #[test]
    fn instagram_input_requests_limit() {
        let input = ApifyClient::run_input(Platform::Instagram, "noam.creates", 10);
        assert_eq!(input["usernames"][0], "noam.creates");
        assert_eq!(input["resultsLimit"], 10);
    }

    #[test]
    fn tiktok_input_disables_downloads() {
        let input = ApifyClient::run_input(Platform::Tiktok, "noam", 5);
        assert_eq!(input["resultsPerPage"], 5);
        assert_eq!(input["shouldDownloadVideos"], false);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ApifyClient::with_base_url("t", 5, "ua", 0, 0, "not a url");
        assert!(matches!(result, Err(ScraperError::InvalidBaseUrl { .. })));
    }
}
