use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::Tiktok),
            other => Err(CoreError::UnknownVariant {
                kind: "platform",
                value: other.to_string(),
            }),
        }
    }
}

/// One post from the creator's own profile, with the metrics seen at scrape time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePost {
    pub platform: Platform,
    pub post_id: String,
    pub url: Option<String>,
    pub caption: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

impl ProfilePost {
    /// Interactions on the post. Views are excluded; they are not reported
    /// consistently across platforms.
    #[must_use]
    pub fn engagement(&self) -> i64 {
        self.likes + self.comments + self.shares
    }
}

/// Mean engagement across `posts`, or `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_engagement(posts: &[ProfilePost]) -> Option<f64> {
    if posts.is_empty() {
        return None;
    }
    let total: i64 = posts.iter().map(ProfilePost::engagement).sum();
    Some(total as f64 / posts.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(likes: i64, comments: i64, shares: i64) -> ProfilePost {
        ProfilePost {
            platform: Platform::Instagram,
            post_id: format!("p{likes}"),
            url: None,
            caption: String::new(),
            posted_at: None,
            views: 10_000,
            likes,
            comments,
            shares,
        }
    }

    #[test]
    fn engagement_sums_interactions() {
        assert_eq!(post(100, 20, 5).engagement(), 125);
    }

    #[test]
    fn mean_engagement_of_empty_slice_is_none() {
        assert_eq!(mean_engagement(&[]), None);
    }

    #[test]
    fn mean_engagement_averages() {
        let posts = vec![post(100, 0, 0), post(200, 0, 0)];
        assert_eq!(mean_engagement(&posts), Some(150.0));
    }

    #[test]
    fn platform_round_trips_through_str() {
        assert_eq!("tiktok".parse::<Platform>().unwrap(), Platform::Tiktok);
        assert_eq!(Platform::Instagram.to_string(), "instagram");
        assert!("myspace".parse::<Platform>().is_err());
    }
}
