//! Database operations for `pattern_weights` and the feedback commit.

use chrono::{DateTime, Utc};
use pulse_core::{IdeaStatus, WeightSet};
use sqlx::SqlitePool;

use crate::ideas::advance_status;
use crate::slot_runs::{insert_fired, SlotMark};
use crate::DbError;

/// A `sent` idea resolved to `used` or `skipped` by usage detection.
#[derive(Debug, Clone, PartialEq)]
pub struct IdeaResolution {
    pub idea_id: i64,
    pub status: IdeaStatus,
    pub observed_engagement: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedbackSummary {
    pub resolved: usize,
    pub weights_written: usize,
    pub evaluated: usize,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_weights(pool: &SqlitePool) -> Result<WeightSet, DbError> {
    let rows = sqlx::query_as::<_, (String, f64)>(
        "SELECT pattern, weight FROM pattern_weights ORDER BY pattern",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Commit one feedback pass atomically: status resolutions, new pattern
/// weights, and `evaluated_at` marks for the ideas that produced them.
///
/// # Errors
///
/// Returns [`DbError::InvalidIdeaTransition`] if a resolved idea is no longer
/// `sent`, [`DbError::AlreadyFired`] if `mark` already fired, or
/// [`DbError::Sqlx`] on query failure. Nothing is written on error.
pub async fn apply_feedback(
    pool: &SqlitePool,
    resolutions: &[IdeaResolution],
    weights: &[(String, f64)],
    evaluated_ids: &[i64],
    at: DateTime<Utc>,
    mark: Option<&SlotMark>,
) -> Result<FeedbackSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = FeedbackSummary::default();

    for resolution in resolutions {
        advance_status(
            &mut *tx,
            resolution.idea_id,
            IdeaStatus::Sent,
            resolution.status,
            at,
            resolution.observed_engagement,
        )
        .await?;
        summary.resolved += 1;
    }

    for (pattern, weight) in weights {
        sqlx::query(
            "INSERT INTO pattern_weights (pattern, weight, updated_at) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT (pattern) DO UPDATE SET \
                 weight = excluded.weight, \
                 updated_at = excluded.updated_at",
        )
        .bind(pattern)
        .bind(weight)
        .bind(at)
        .execute(&mut *tx)
        .await?;
        summary.weights_written += 1;
    }

    for id in evaluated_ids {
        let result = sqlx::query(
            "UPDATE ideas SET evaluated_at = ?1 WHERE id = ?2 AND evaluated_at IS NULL",
        )
        .bind(at)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        summary.evaluated += usize::try_from(result.rows_affected()).unwrap_or(0);
    }

    if let Some(mark) = mark {
        let detail = format!(
            "{} resolved, {} evaluated",
            summary.resolved, summary.evaluated
        );
        insert_fired(&mut *tx, mark, at, Some(&detail)).await?;
    }

    tx.commit().await?;
    Ok(summary)
}
