use std::collections::HashSet;

use chrono::{DateTime, Utc};
use pulse_core::{Platform, ProfilePost};

use crate::types::{InstagramProfileItem, TiktokItem};

/// Flatten Instagram profile items into posts, newest first, at most `limit`.
///
/// Posts without any identifier are dropped; duplicates keep the first copy.
#[must_use]
pub fn normalize_instagram(items: Vec<InstagramProfileItem>, limit: usize) -> Vec<ProfilePost> {
    let posts = items
        .into_iter()
        .flat_map(|item| item.latest_posts)
        .filter_map(|post| {
            let post_id = non_empty(post.short_code.clone()).or_else(|| non_empty(post.id.clone()))?;
            let url = non_empty(post.url)
                .or_else(|| Some(format!("https://www.instagram.com/p/{post_id}/")));
            Some(ProfilePost {
                platform: Platform::Instagram,
                url,
                caption: post.caption.unwrap_or_default(),
                posted_at: post.timestamp.as_deref().and_then(parse_timestamp),
                views: count(post.video_view_count.or(post.video_play_count)),
                likes: count(post.likes_count),
                comments: count(post.comments_count),
                shares: 0,
                post_id,
            })
        });
    finish(posts, limit)
}

/// Convert TikTok video items into posts, newest first, at most `limit`.
#[must_use]
pub fn normalize_tiktok(items: Vec<TiktokItem>, limit: usize) -> Vec<ProfilePost> {
    let posts = items.into_iter().filter_map(|item| {
        let post_id = non_empty(item.id)?;
        let posted_at = item
            .create_time_iso
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| item.create_time.and_then(|t| DateTime::from_timestamp(t, 0)));
        Some(ProfilePost {
            platform: Platform::Tiktok,
            post_id,
            url: non_empty(item.web_video_url),
            caption: item.text.unwrap_or_default(),
            posted_at,
            views: count(item.play_count),
            likes: count(item.digg_count),
            comments: count(item.comment_count),
            shares: count(item.share_count),
        })
    });
    finish(posts, limit)
}

fn finish(posts: impl Iterator<Item = ProfilePost>, limit: usize) -> Vec<ProfilePost> {
    let mut seen = HashSet::new();
    let mut posts: Vec<ProfilePost> = posts.filter(|p| seen.insert(p.post_id.clone())).collect();
    // Stable sort keeps provider order among posts with equal or missing times.
    posts.sort_by(|a, b| match (a.posted_at, b.posted_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    posts.truncate(limit);
    posts
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn count(value: Option<i64>) -> i64 {
    value.unwrap_or(0).max(0)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
