//! SQLite connection management

use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

/// Layout version stamped into `PRAGMA user_version`.
///
/// Version 0 is the legacy layout: marriages stored in whatever order the
/// players were given, with no uniqueness on the pair.
pub const SCHEMA_VERSION: i64 = 1;

/// Open (creating if needed) the database file at `db_path`.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await
        .map_err(|e| RepoError::database("connect", e))?;
    tracing::info!(db_path = %db_path, "Connected to SQLite");
    Ok(pool)
}

pub(crate) async fn user_version(pool: &SqlitePool) -> Result<i64, RepoError> {
    sqlx::query_scalar::<_, i64>("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| RepoError::database("user_version", e))
}

pub(crate) async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool, RepoError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
    )
    .bind(table)
    .fetch_one(pool)
    .await
    .map(|count| count > 0)
    .map_err(|e| RepoError::database("table_exists", e))
}
