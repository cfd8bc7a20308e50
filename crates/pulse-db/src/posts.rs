//! Database operations for `profile_posts` and the scan that writes them.

use chrono::{DateTime, Utc};
use pulse_core::{Platform, ProfilePost};
use sqlx::SqlitePool;

use crate::slot_runs::{insert_fired, SlotMark};
use crate::DbError;

/// A row from the `profile_posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfilePostRow {
    pub id: i64,
    pub platform: String,
    pub post_id: String,
    pub url: Option<String>,
    pub caption: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub scraped_at: DateTime<Utc>,
}

impl ProfilePostRow {
    /// # Errors
    ///
    /// Returns [`DbError::Core`] if the stored platform is not recognised.
    pub fn into_post(self) -> Result<ProfilePost, DbError> {
        Ok(ProfilePost {
            platform: self.platform.parse::<Platform>()?,
            post_id: self.post_id,
            url: self.url,
            caption: self.caption,
            posted_at: self.posted_at,
            views: self.views,
            likes: self.likes,
            comments: self.comments,
            shares: self.shares,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    pub inserted: usize,
    pub updated: usize,
    pub analysis_id: Option<i64>,
}

/// Store the result of a profile scan in one transaction: upsert every post by
/// `(platform, post_id)`, append the analysis text when present, and record
/// the slot as fired when `mark` is given.
///
/// # Errors
///
/// Returns [`DbError::AlreadyFired`] if `mark` already fired, or
/// [`DbError::Sqlx`] on any query failure. Nothing is written on error.
pub async fn save_scan(
    pool: &SqlitePool,
    posts: &[ProfilePost],
    analysis: Option<&str>,
    at: DateTime<Utc>,
    mark: Option<&SlotMark>,
) -> Result<ScanSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = ScanSummary::default();

    for post in posts {
        let updated = sqlx::query(
            "UPDATE profile_posts \
             SET url = ?3, caption = ?4, posted_at = ?5, views = ?6, likes = ?7, \
                 comments = ?8, shares = ?9, scraped_at = ?10 \
             WHERE platform = ?1 AND post_id = ?2",
        )
        .bind(post.platform.as_str())
        .bind(&post.post_id)
        .bind(&post.url)
        .bind(&post.caption)
        .bind(post.posted_at)
        .bind(post.views)
        .bind(post.likes)
        .bind(post.comments)
        .bind(post.shares)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() > 0 {
            summary.updated += 1;
            continue;
        }

        sqlx::query(
            "INSERT INTO profile_posts \
                 (platform, post_id, url, caption, posted_at, views, likes, comments, shares, \
                  scraped_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(post.platform.as_str())
        .bind(&post.post_id)
        .bind(&post.url)
        .bind(&post.caption)
        .bind(post.posted_at)
        .bind(post.views)
        .bind(post.likes)
        .bind(post.comments)
        .bind(post.shares)
        .bind(at)
        .execute(&mut *tx)
        .await?;
        summary.inserted += 1;
    }

    if let Some(body) = analysis.filter(|b| !b.trim().is_empty()) {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO profile_analyses (body, created_at) VALUES (?1, ?2) RETURNING id",
        )
        .bind(body)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;
        summary.analysis_id = Some(id);
    }

    if let Some(mark) = mark {
        let detail = format!(
            "{} new, {} updated posts",
            summary.inserted, summary.updated
        );
        insert_fired(&mut *tx, mark, at, Some(&detail)).await?;
    }

    tx.commit().await?;
    Ok(summary)
}

const POST_COLUMNS: &str = "id, platform, post_id, url, caption, posted_at, views, likes, \
                            comments, shares, scraped_at";

/// Most recent posts by publish time; posts without a publish time sort last.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row holds an unknown platform.
pub async fn list_recent_posts(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<ProfilePost>, DbError> {
    let rows = sqlx::query_as::<_, ProfilePostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM profile_posts \
         ORDER BY posted_at IS NULL, julianday(posted_at) DESC, id DESC \
         LIMIT ?1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ProfilePostRow::into_post).collect()
}

/// Posts published at or after `since`, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row holds an unknown platform.
pub async fn list_posts_since(
    pool: &SqlitePool,
    since: DateTime<Utc>,
) -> Result<Vec<ProfilePost>, DbError> {
    let rows = sqlx::query_as::<_, ProfilePostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM profile_posts \
         WHERE posted_at IS NOT NULL AND julianday(posted_at) >= julianday(?1) \
         ORDER BY julianday(posted_at), id"
    ))
    .bind(since)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ProfilePostRow::into_post).collect()
}
