//! Dataset item shapes returned by the Apify actors.
//!
//! ## Instagram (`apify/instagram-profile-scraper`)
//! One item per requested profile. Posts live under `latestPosts`. The
//! stable identifier is `shortCode`; `id` is a numeric string and used as a
//! fallback. Like counts are `-1` when the owner hides them.
//!
//! ## TikTok (`clockworks/tiktok-scraper`)
//! One item per video. `createTimeISO` is preferred; older runs only carry
//! the unix `createTime`.
//!
//! Every metric is optional. Missing, `null` and negative counts normalize to 0.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramProfileItem {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub latest_posts: Vec<InstagramPost>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramPost {
    #[serde(default)]
    pub short_code: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub likes_count: Option<i64>,
    #[serde(default)]
    pub comments_count: Option<i64>,
    #[serde(default)]
    pub video_view_count: Option<i64>,
    #[serde(default)]
    pub video_play_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TiktokItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub web_video_url: Option<String>,
    #[serde(default, rename = "createTimeISO")]
    pub create_time_iso: Option<String>,
    #[serde(default)]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub play_count: Option<i64>,
    #[serde(default)]
    pub digg_count: Option<i64>,
    #[serde(default)]
    pub comment_count: Option<i64>,
    #[serde(default)]
    pub share_count: Option<i64>,
}
