//! Database operations for `profile_analyses`. Rows are written by
//! [`crate::posts::save_scan`].

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileAnalysisRow {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// The most recently stored analysis, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_analysis(pool: &SqlitePool) -> Result<Option<ProfileAnalysisRow>, DbError> {
    let row = sqlx::query_as::<_, ProfileAnalysisRow>(
        "SELECT id, body, created_at FROM profile_analyses ORDER BY id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
