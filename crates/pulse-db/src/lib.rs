use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use pulse_core::{AppConfig, CoreError, IdeaStatus};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/pulse-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("slot {slot_name} already fired on {slot_day}")]
    AlreadyFired {
        slot_name: String,
        slot_day: NaiveDate,
    },
    #[error("idea {id} cannot move from {from} to {to}")]
    InvalidIdeaTransition {
        id: i64,
        from: IdeaStatus,
        to: IdeaStatus,
    },
    #[error("failed to prepare database directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to the SQLite database at `database_url`, creating the file (and
/// its parent directory) when missing.
///
/// # Errors
///
/// Returns [`DbError`] if the URL is invalid, the directory cannot be created,
/// or the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let filename = options.get_filename();
    if filename != Path::new(":memory:") {
        if let Some(parent) = filename.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DbError::Directory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Open a private in-memory database with all migrations applied.
///
/// The pool holds exactly one connection that never expires; every other
/// connection would see a different empty database.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or a migration fails.
pub async fn connect_in_memory() -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table does not exist on a fresh database; treat
    // absence as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &SqlitePool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}


pub mod analyses;
pub mod ideas;
pub mod messages;
pub mod posts;
pub mod slot_runs;
pub mod trends;
pub mod weights;

pub use analyses::{latest_analysis, ProfileAnalysisRow};
pub use ideas::{
    count_ideas_by_status, get_idea, insert_idea, insert_ideas, list_evaluable_ideas,
    list_ideas_by_status, list_recent_ideas, set_idea_status, IdeaRow,
};
pub use messages::{
    latest_message, latest_message_of_kind, list_messages_for_day, record_dispatch,
    DispatchRecord, NewDispatch, SentMessageRow,
};
pub use posts::{list_posts_since, list_recent_posts, save_scan, ProfilePostRow, ScanSummary};
pub use slot_runs::{
    find_slot_run, list_slot_runs_for_day, record_slot_fired, record_slot_missed, SlotMark, SlotRunRow,
};
pub use trends::{count_trends, list_top_trends, save_trends, TrendItemRow, TrendSaveSummary};
pub use weights::{apply_feedback, load_weights, FeedbackSummary, IdeaResolution};
