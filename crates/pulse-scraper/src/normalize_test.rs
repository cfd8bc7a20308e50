use chrono::TimeZone;

use super::*;
use crate::types::InstagramPost;

fn ig_post(short_code: Option<&str>, timestamp: Option<&str>, likes: Option<i64>) -> InstagramPost {
    InstagramPost {
        short_code: short_code.map(str::to_owned),
        id: Some("3141592653".to_owned()),
        caption: Some("Date night 🍝".to_owned()),
        timestamp: timestamp.map(str::to_owned),
        likes_count: likes,
        comments_count: Some(12),
        video_view_count: Some(5400),
        ..InstagramPost::default()
    }
}

fn profile(posts: Vec<InstagramPost>) -> InstagramProfileItem {
    InstagramProfileItem {
        username: Some("noam.creates".to_owned()),
        latest_posts: posts,
    }
}

// -----------------------------------------------------------------------
// normalize_instagram
// -----------------------------------------------------------------------

#[test]
fn instagram_uses_short_code_and_builds_url() {
    let posts = normalize_instagram(
        vec![profile(vec![ig_post(Some("C0abc"), Some("2026-03-01T18:30:00.000Z"), Some(340))])],
        10,
    );
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.platform, Platform::Instagram);
    assert_eq!(post.post_id, "C0abc");
    assert_eq!(post.url.as_deref(), Some("https://www.instagram.com/p/C0abc/"));
    assert_eq!(post.likes, 340);
    assert_eq!(post.comments, 12);
    assert_eq!(post.views, 5400);
    assert_eq!(
        post.posted_at,
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap())
    );
}

#[test]
fn instagram_falls_back_to_numeric_id() {
    let posts = normalize_instagram(vec![profile(vec![ig_post(None, None, Some(1))])], 10);
    assert_eq!(posts[0].post_id, "3141592653");
}

#[test]
fn instagram_hidden_likes_clamp_to_zero() {
    let posts = normalize_instagram(vec![profile(vec![ig_post(Some("x"), None, Some(-1))])], 10);
    assert_eq!(posts[0].likes, 0);
}

#[test]
fn instagram_orders_newest_first_and_truncates() {
    let posts = normalize_instagram(
        vec![profile(vec![
            ig_post(Some("old"), Some("2026-01-01T00:00:00Z"), None),
            ig_post(Some("undated"), None, None),
            ig_post(Some("new"), Some("2026-02-01T00:00:00Z"), None),
        ])],
        2,
    );
    let ids: Vec<&str> = posts.iter().map(|p| p.post_id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[test]
fn instagram_drops_duplicates_across_items() {
    let posts = normalize_instagram(
        vec![
            profile(vec![ig_post(Some("dup"), None, Some(1))]),
            profile(vec![ig_post(Some("dup"), None, Some(2))]),
        ],
        10,
    );
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].likes, 1);
}

// -----------------------------------------------------------------------
// normalize_tiktok
// -----------------------------------------------------------------------

#[test]
fn tiktok_maps_metrics() {
    let item = TiktokItem {
        id: Some("7300000000000000001".to_owned()),
        text: Some("Guess the song 🎸".to_owned()),
        web_video_url: Some("https://www.tiktok.com/@noam/video/7300000000000000001".to_owned()),
        create_time_iso: Some("2026-03-02T20:00:00.000Z".to_owned()),
        play_count: Some(12_000),
        digg_count: Some(900),
        comment_count: Some(40),
        share_count: Some(25),
        ..TiktokItem::default()
    };
    let posts = normalize_tiktok(vec![item], 10);
    let post = &posts[0];
    assert_eq!(post.platform, Platform::Tiktok);
    assert_eq!(post.views, 12_000);
    assert_eq!(post.engagement(), 965);
    assert_eq!(
        post.posted_at,
        Some(Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap())
    );
}

#[test]
fn tiktok_falls_back_to_unix_create_time() {
    let item = TiktokItem {
        id: Some("1".to_owned()),
        create_time: Some(1_772_000_000),
        ..TiktokItem::default()
    };
    let posts = normalize_tiktok(vec![item], 10);
    assert_eq!(posts[0].posted_at, DateTime::from_timestamp(1_772_000_000, 0));
}

#[test]
fn tiktok_skips_items_without_id() {
    let item = TiktokItem {
        id: Some("   ".to_owned()),
        ..TiktokItem::default()
    };
    assert!(normalize_tiktok(vec![item], 10).is_empty());
}
