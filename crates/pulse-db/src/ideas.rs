//! Database operations for `ideas`.

use chrono::{DateTime, Utc};
use pulse_core::{Idea, IdeaStatus, NewIdea};
use sqlx::{SqliteConnection, SqlitePool};

use crate::DbError;

/// A row from the `ideas` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdeaRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub hook: Option<String>,
    pub description: String,
    pub pattern: String,
    pub predicted_engagement: Option<f64>,
    pub observed_engagement: Option<f64>,
    pub status: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub trend_id: Option<i64>,
}

impl IdeaRow {
    /// # Errors
    ///
    /// Returns [`DbError::Core`] if the stored status is not recognised.
    pub fn into_idea(self) -> Result<Idea, DbError> {
        Ok(Idea {
            id: self.id,
            created_at: self.created_at,
            title: self.title,
            hook: self.hook,
            description: self.description,
            pattern: self.pattern,
            predicted_engagement: self.predicted_engagement,
            observed_engagement: self.observed_engagement,
            status: self.status.parse::<IdeaStatus>()?,
            sent_at: self.sent_at,
            evaluated_at: self.evaluated_at,
            trend_id: self.trend_id,
        })
    }
}

const IDEA_COLUMNS: &str = "id, created_at, title, hook, description, pattern, \
                            predicted_engagement, observed_engagement, status, sent_at, \
                            evaluated_at, trend_id";

pub(crate) async fn insert_proposed(
    conn: &mut SqliteConnection,
    idea: &NewIdea,
    at: DateTime<Utc>,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO ideas \
             (created_at, title, hook, description, pattern, predicted_engagement, status, \
              trend_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'proposed', ?7) \
         RETURNING id",
    )
    .bind(at)
    .bind(&idea.title)
    .bind(&idea.hook)
    .bind(&idea.description)
    .bind(&idea.pattern)
    .bind(idea.predicted_engagement)
    .bind(idea.trend_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// Move an idea from `from` to `to`, stamping `sent_at` when it becomes sent.
///
/// The update is conditional on the current status so a concurrent change
/// is reported instead of overwritten.
pub(crate) async fn advance_status(
    conn: &mut SqliteConnection,
    id: i64,
    from: IdeaStatus,
    to: IdeaStatus,
    at: DateTime<Utc>,
    observed_engagement: Option<f64>,
) -> Result<(), DbError> {
    if !from.can_transition_to(to) {
        return Err(DbError::InvalidIdeaTransition { id, from, to });
    }

    let sent_at = (to == IdeaStatus::Sent).then_some(at);
    let result = sqlx::query(
        "UPDATE ideas \
         SET status = ?1, \
             sent_at = COALESCE(?2, sent_at), \
             observed_engagement = COALESCE(?3, observed_engagement) \
         WHERE id = ?4 AND status = ?5",
    )
    .bind(to.as_str())
    .bind(sent_at)
    .bind(observed_engagement)
    .bind(id)
    .bind(from.as_str())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIdeaTransition { id, from, to });
    }
    Ok(())
}

/// Store a new idea in `proposed` status. Returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_idea(
    pool: &SqlitePool,
    idea: &NewIdea,
    at: DateTime<Utc>,
) -> Result<i64, DbError> {
    let mut conn = pool.acquire().await?;
    insert_proposed(&mut conn, idea, at).await
}

/// Store several `proposed` ideas in one transaction. Returns their ids in
/// input order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails. Nothing is written on error.
pub async fn insert_ideas(
    pool: &SqlitePool,
    ideas: &[NewIdea],
    at: DateTime<Utc>,
) -> Result<Vec<i64>, DbError> {
    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(ideas.len());
    for idea in ideas {
        ids.push(insert_proposed(&mut *tx, idea, at).await?);
    }
    tx.commit().await?;
    Ok(ids)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no idea has `id`, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_idea(pool: &SqlitePool, id: i64) -> Result<Idea, DbError> {
    sqlx::query_as::<_, IdeaRow>(&format!("SELECT {IDEA_COLUMNS} FROM ideas WHERE id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?
        .into_idea()
}

/// Ideas in `status`, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn list_ideas_by_status(
    pool: &SqlitePool,
    status: IdeaStatus,
    limit: i64,
) -> Result<Vec<Idea>, DbError> {
    let rows = sqlx::query_as::<_, IdeaRow>(&format!(
        "SELECT {IDEA_COLUMNS} FROM ideas WHERE status = ?1 ORDER BY id DESC LIMIT ?2"
    ))
    .bind(status.as_str())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(IdeaRow::into_idea).collect()
}

/// The newest ideas regardless of status.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn list_recent_ideas(pool: &SqlitePool, limit: i64) -> Result<Vec<Idea>, DbError> {
    let rows = sqlx::query_as::<_, IdeaRow>(&format!(
        "SELECT {IDEA_COLUMNS} FROM ideas ORDER BY id DESC LIMIT ?1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(IdeaRow::into_idea).collect()
}

/// Validate and apply a status change.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the idea does not exist,
/// [`DbError::InvalidIdeaTransition`] if the move is not a single forward step
/// (or the status changed underneath), or [`DbError::Sqlx`] on query failure.
pub async fn set_idea_status(
    pool: &SqlitePool,
    id: i64,
    next: IdeaStatus,
    at: DateTime<Utc>,
) -> Result<(), DbError> {
    let current = get_idea(pool, id).await?.status;
    let mut conn = pool.acquire().await?;
    advance_status(&mut conn, id, current, next, at, None).await
}

/// Number of ideas per status. Statuses with no ideas report zero.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row holds an unknown status.
pub async fn count_ideas_by_status(
    pool: &SqlitePool,
) -> Result<Vec<(IdeaStatus, i64)>, DbError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM ideas GROUP BY status",
    )
    .fetch_all(pool)
    .await?;

    let mut counts: Vec<(IdeaStatus, i64)> =
        IdeaStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    for (status, count) in rows {
        let status = status.parse::<IdeaStatus>()?;
        if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == status) {
            slot.1 = count;
        }
    }
    Ok(counts)
}

/// Resolved ideas carrying both engagement figures that have not yet fed a
/// weight update.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn list_evaluable_ideas(pool: &SqlitePool) -> Result<Vec<Idea>, DbError> {
    let rows = sqlx::query_as::<_, IdeaRow>(&format!(
        "SELECT {IDEA_COLUMNS} FROM ideas \
         WHERE status IN ('used', 'skipped') \
           AND evaluated_at IS NULL \
           AND predicted_engagement IS NOT NULL \
           AND observed_engagement IS NOT NULL \
         ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(IdeaRow::into_idea).collect()
}
