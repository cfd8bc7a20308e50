//! Weekly performance summary.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use pulse_core::ProfilePost;
use pulse_messaging::MAX_BODY_CHARS;

use crate::compose::truncate_body;

/// Days covered by one report.
pub const REPORT_DAYS: i64 = 7;

/// Totals for the last [`REPORT_DAYS`] days against the week before.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyStats {
    pub posts: usize,
    pub previous_posts: usize,
    pub views: i64,
    pub previous_views: i64,
    pub likes: i64,
    pub comments: i64,
    /// Local days with at least one post.
    pub posting_days: usize,
    pub top_post: Option<ProfilePost>,
}

impl WeeklyStats {
    /// Split `posts` into this week and the previous one, relative to `now`.
    /// Posts without a publish time are ignored.
    #[must_use]
    pub fn from_posts(posts: &[ProfilePost], now: DateTime<Utc>, tz: Tz) -> Self {
        let week_start = now - Duration::days(REPORT_DAYS);
        let previous_start = week_start - Duration::days(REPORT_DAYS);

        let this_week: Vec<&ProfilePost> = posts
            .iter()
            .filter(|p| p.posted_at.is_some_and(|t| t > week_start && t <= now))
            .collect();
        let previous: Vec<&ProfilePost> = posts
            .iter()
            .filter(|p| {
                p.posted_at
                    .is_some_and(|t| t > previous_start && t <= week_start)
            })
            .collect();

        let posting_days: BTreeSet<_> = this_week
            .iter()
            .filter_map(|p| p.posted_at)
            .map(|t| t.with_timezone(&tz).date_naive())
            .collect();

        Self {
            posts: this_week.len(),
            previous_posts: previous.len(),
            views: this_week.iter().map(|p| p.views).sum(),
            previous_views: previous.iter().map(|p| p.views).sum(),
            likes: this_week.iter().map(|p| p.likes).sum(),
            comments: this_week.iter().map(|p| p.comments).sum(),
            posting_days: posting_days.len(),
            top_post: this_week.iter().max_by_key(|p| p.views).map(|p| (*p).clone()),
        }
    }

    /// Change in views against the previous week, in percent. `None` when
    /// the previous week had no views.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn views_change_pct(&self) -> Option<f64> {
        (self.previous_views > 0).then(|| {
            (self.views - self.previous_views) as f64 / self.previous_views as f64 * 100.0
        })
    }

    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn average_views(&self) -> i64 {
        if self.posts == 0 {
            0
        } else {
            self.views / self.posts as i64
        }
    }
}

fn tip(stats: &WeeklyStats) -> &'static str {
    if stats.posts == 0 {
        "No posts this week. One short clip tomorrow restarts the streak."
    } else if stats.posting_days < 3 {
        "Spread posts over more days; consistency beats bursts."
    } else if stats.views_change_pct().is_some_and(|p| p < 0.0) {
        "Views dipped. Repeat the format of your top post this week."
    } else {
        "Keep the rhythm going and build on your top post."
    }
}

/// The report message, at most [`MAX_BODY_CHARS`] characters.
#[must_use]
pub fn render_weekly_report(stats: &WeeklyStats, creator_name: &str) -> String {
    let mut body = format!("📊 Weekly report for {creator_name}\n\n");
    body.push_str(&format!(
        "Posts: {} (last week {})\n",
        stats.posts, stats.previous_posts
    ));
    match stats.views_change_pct() {
        Some(pct) => body.push_str(&format!("Views: {} ({pct:+.0}%)\n", stats.views)),
        None => body.push_str(&format!("Views: {}\n", stats.views)),
    }
    body.push_str(&format!(
        "Likes: {}  Comments: {}\nAverage views per post: {}\nPosting days: {}/{REPORT_DAYS}\n",
        stats.likes,
        stats.comments,
        stats.average_views(),
        stats.posting_days
    ));
    if let Some(top) = &stats.top_post {
        let caption: String = top.caption.chars().take(80).collect();
        body.push_str(&format!("\n🏆 Top post: {} views\n{caption}\n", top.views));
        if let Some(url) = &top.url {
            body.push_str(url);
            body.push('\n');
        }
    }
    body.push_str(&format!("\n💡 {}", tip(stats)));
    truncate_body(&body, MAX_BODY_CHARS)
}
