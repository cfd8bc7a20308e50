//! Database operations for `slot_runs`, the persisted per-day slot state.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::DbError;

/// A row from the `slot_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SlotRunRow {
    pub id: i64,
    pub slot_name: String,
    pub slot_day: NaiveDate,
    /// `fired` or `missed`.
    pub status: String,
    pub recorded_at: DateTime<Utc>,
    pub detail: Option<String>,
}

/// Identifies the slot execution a write belongs to. When passed to a store
/// operation, the `fired` run is inserted in the same transaction as the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMark {
    pub slot_name: String,
    pub slot_day: NaiveDate,
}

impl SlotMark {
    #[must_use]
    pub fn new(slot_name: impl Into<String>, slot_day: NaiveDate) -> Self {
        Self {
            slot_name: slot_name.into(),
            slot_day,
        }
    }
}

pub(crate) async fn insert_fired(
    conn: &mut SqliteConnection,
    mark: &SlotMark,
    at: DateTime<Utc>,
    detail: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "INSERT INTO slot_runs (slot_name, slot_day, status, recorded_at, detail) \
         VALUES (?1, ?2, 'fired', ?3, ?4) \
         ON CONFLICT (slot_name, slot_day) DO NOTHING",
    )
    .bind(&mark.slot_name)
    .bind(mark.slot_day)
    .bind(at)
    .bind(detail)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::AlreadyFired {
            slot_name: mark.slot_name.clone(),
            slot_day: mark.slot_day,
        });
    }
    Ok(())
}

/// Record that a slot fired on `mark.slot_day`, for actions with no other writes.
///
/// # Errors
///
/// Returns [`DbError::AlreadyFired`] if the slot already has a run for that
/// day, or [`DbError::Sqlx`] if the insert fails.
pub async fn record_slot_fired(
    pool: &SqlitePool,
    mark: &SlotMark,
    at: DateTime<Utc>,
    detail: Option<&str>,
) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;
    insert_fired(&mut conn, mark, at, detail).await
}

/// Record a missed slot. Returns `false` when a run already exists for that day.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn record_slot_missed(
    pool: &SqlitePool,
    mark: &SlotMark,
    at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO slot_runs (slot_name, slot_day, status, recorded_at) \
         VALUES (?1, ?2, 'missed', ?3) \
         ON CONFLICT (slot_name, slot_day) DO NOTHING",
    )
    .bind(&mark.slot_name)
    .bind(mark.slot_day)
    .bind(at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// The run recorded for `mark`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_slot_run(
    pool: &SqlitePool,
    mark: &SlotMark,
) -> Result<Option<SlotRunRow>, DbError> {
    let row = sqlx::query_as::<_, SlotRunRow>(
        "SELECT id, slot_name, slot_day, status, recorded_at, detail \
         FROM slot_runs \
         WHERE slot_name = ?1 AND slot_day = ?2",
    )
    .bind(&mark.slot_name)
    .bind(mark.slot_day)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// All runs recorded for `day`, in recording order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_slot_runs_for_day(
    pool: &SqlitePool,
    day: NaiveDate,
) -> Result<Vec<SlotRunRow>, DbError> {
    let rows = sqlx::query_as::<_, SlotRunRow>(
        "SELECT id, slot_name, slot_day, status, recorded_at, detail \
         FROM slot_runs \
         WHERE slot_day = ?1 \
         ORDER BY id",
    )
    .bind(day)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
