//! Database operations for `trend_items`.

use chrono::{DateTime, Utc};
use pulse_core::{NewTrendItem, TrendItem};
use sqlx::SqlitePool;

use crate::slot_runs::{insert_fired, SlotMark};
use crate::DbError;

/// A row from the `trend_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendItemRow {
    pub id: i64,
    pub fetched_at: DateTime<Utc>,
    pub headline: String,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub source: String,
    pub relevance_score: f64,
}

impl From<TrendItemRow> for TrendItem {
    fn from(row: TrendItemRow) -> Self {
        TrendItem {
            id: row.id,
            fetched_at: row.fetched_at,
            headline: row.headline,
            summary: row.summary.unwrap_or_default(),
            link: row.link,
            source: row.source,
            relevance_score: row.relevance_score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrendSaveSummary {
    pub inserted: usize,
    /// Headlines already stored for the same source; their fetch time and
    /// score are updated so they survive pruning while still in the feed.
    pub refreshed: usize,
    pub pruned: u64,
}

/// Insert scored items and prune items fetched before `prune_before`, in one
/// transaction. Headlines already stored for the same source are refreshed.
///
/// # Errors
///
/// Returns [`DbError::AlreadyFired`] if `mark` already fired, or
/// [`DbError::Sqlx`] on any query failure. Nothing is written on error.
pub async fn save_trends(
    pool: &SqlitePool,
    items: &[NewTrendItem],
    fetched_at: DateTime<Utc>,
    prune_before: DateTime<Utc>,
    mark: Option<&SlotMark>,
) -> Result<TrendSaveSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = TrendSaveSummary::default();

    for item in items {
        let refreshed = sqlx::query(
            "UPDATE trend_items SET fetched_at = ?1, relevance_score = ?2 \
             WHERE source = ?3 AND headline = ?4",
        )
        .bind(fetched_at)
        .bind(item.relevance_score)
        .bind(&item.source)
        .bind(&item.headline)
        .execute(&mut *tx)
        .await?;
        if refreshed.rows_affected() > 0 {
            summary.refreshed += 1;
            continue;
        }

        sqlx::query(
            "INSERT INTO trend_items \
                 (fetched_at, headline, summary, link, source, published_at, relevance_score) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(fetched_at)
        .bind(&item.headline)
        .bind(&item.summary)
        .bind(&item.link)
        .bind(&item.source)
        .bind(item.published_at)
        .bind(item.relevance_score)
        .execute(&mut *tx)
        .await?;
        summary.inserted += 1;
    }

    let pruned = sqlx::query(
        "DELETE FROM trend_items WHERE julianday(fetched_at) < julianday(?1)",
    )
    .bind(prune_before)
    .execute(&mut *tx)
    .await?;
    summary.pruned = pruned.rows_affected();

    if let Some(mark) = mark {
        let detail = format!("{} new trends", summary.inserted);
        insert_fired(&mut *tx, mark, fetched_at, Some(&detail)).await?;
    }

    tx.commit().await?;
    Ok(summary)
}

/// Highest-scoring trends fetched at or after `since`, newest first on ties.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_top_trends(
    pool: &SqlitePool,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<TrendItem>, DbError> {
    let rows = sqlx::query_as::<_, TrendItemRow>(
        "SELECT id, fetched_at, headline, summary, link, source, relevance_score \
         FROM trend_items \
         WHERE julianday(fetched_at) >= julianday(?1) \
         ORDER BY relevance_score DESC, julianday(fetched_at) DESC, id DESC \
         LIMIT ?2",
    )
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TrendItem::from).collect())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_trends(pool: &SqlitePool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM trend_items")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
