//! Database operations for `sent_messages`.

use chrono::{DateTime, NaiveDate, Utc};
use pulse_core::{DeliveryStatus, IdeaStatus, MessageKind, NewIdea, SentMessage};
use sqlx::SqlitePool;

use crate::ideas::{advance_status, insert_proposed};
use crate::slot_runs::{insert_fired, SlotMark};
use crate::DbError;

/// A row from the `sent_messages` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SentMessageRow {
    pub id: i64,
    pub slot_name: String,
    pub slot_day: NaiveDate,
    pub category: String,
    pub body: String,
    pub delivery_status: String,
    pub provider_id: Option<String>,
    pub idea_id: Option<i64>,
    pub sent_at: DateTime<Utc>,
}

impl SentMessageRow {
    /// # Errors
    ///
    /// Returns [`DbError::Core`] if the category or delivery status is not recognised.
    pub fn into_message(self) -> Result<SentMessage, DbError> {
        Ok(SentMessage {
            id: self.id,
            slot_name: self.slot_name,
            slot_day: self.slot_day,
            sent_at: self.sent_at,
            category: self.category.parse::<MessageKind>()?,
            body: self.body,
            delivery_status: self.delivery_status.parse::<DeliveryStatus>()?,
            provider_id: self.provider_id,
        })
    }
}

/// A message that the provider accepted, ready to be recorded.
#[derive(Debug, Clone)]
pub struct NewDispatch {
    pub mark: SlotMark,
    pub category: MessageKind,
    pub body: String,
    pub delivery_status: DeliveryStatus,
    pub provider_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchRecord {
    pub message_id: i64,
    pub idea_id: Option<i64>,
}

/// Record a dispatched message in one transaction: the `fired` slot run, the
/// idea it carried (stored and advanced to `sent`), and the message itself.
///
/// # Errors
///
/// Returns [`DbError::AlreadyFired`] if the slot already fired that day, or
/// [`DbError::Sqlx`] on query failure. Nothing is written on error.
pub async fn record_dispatch(
    pool: &SqlitePool,
    dispatch: &NewDispatch,
    idea: Option<&NewIdea>,
) -> Result<DispatchRecord, DbError> {
    let mut tx = pool.begin().await?;

    insert_fired(
        &mut *tx,
        &dispatch.mark,
        dispatch.sent_at,
        Some(dispatch.category.as_str()),
    )
    .await?;

    let idea_id = match idea {
        Some(idea) => {
            let id = insert_proposed(&mut *tx, idea, dispatch.sent_at).await?;
            advance_status(
                &mut *tx,
                id,
                IdeaStatus::Proposed,
                IdeaStatus::Sent,
                dispatch.sent_at,
                None,
            )
            .await?;
            Some(id)
        }
        None => None,
    };

    let message_id: i64 = sqlx::query_scalar(
        "INSERT INTO sent_messages \
             (slot_name, slot_day, category, body, delivery_status, provider_id, idea_id, \
              sent_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         RETURNING id",
    )
    .bind(&dispatch.mark.slot_name)
    .bind(dispatch.mark.slot_day)
    .bind(dispatch.category.as_str())
    .bind(&dispatch.body)
    .bind(dispatch.delivery_status.as_str())
    .bind(&dispatch.provider_id)
    .bind(idea_id)
    .bind(dispatch.sent_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(DispatchRecord {
        message_id,
        idea_id,
    })
}

const MESSAGE_COLUMNS: &str = "id, slot_name, slot_day, category, body, delivery_status, \
                               provider_id, idea_id, sent_at";

/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn list_messages_for_day(
    pool: &SqlitePool,
    day: NaiveDate,
) -> Result<Vec<SentMessage>, DbError> {
    let rows = sqlx::query_as::<_, SentMessageRow>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM sent_messages WHERE slot_day = ?1 ORDER BY id"
    ))
    .bind(day)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(SentMessageRow::into_message).collect()
}

/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be converted.
pub async fn latest_message(pool: &SqlitePool) -> Result<Option<SentMessage>, DbError> {
    let row = sqlx::query_as::<_, SentMessageRow>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM sent_messages ORDER BY id DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;

    row.map(SentMessageRow::into_message).transpose()
}

/// The newest message of `kind`, if any.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be converted.
pub async fn latest_message_of_kind(
    pool: &SqlitePool,
    kind: MessageKind,
) -> Result<Option<SentMessage>, DbError> {
    let row = sqlx::query_as::<_, SentMessageRow>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM sent_messages WHERE category = ?1 ORDER BY id DESC LIMIT 1"
    ))
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(SentMessageRow::into_message).transpose()
}
