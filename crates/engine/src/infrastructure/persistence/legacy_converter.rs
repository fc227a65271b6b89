//! Upgrades databases written before couples were normalized.
//!
//! Legacy (version 0) databases stored each marriage with the players in
//! whatever order they were given and had no uniqueness on the pair, so the
//! same couple could appear twice as (A, B) and (B, A). Conversion rewrites
//! every row into normalized order, keeps the earliest row per couple, drops
//! rows that pair a player with themself, and stamps the current version.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::connection::{table_exists, user_version, SCHEMA_VERSION};
use crate::infrastructure::ports::{LegacyConverter, RepoError};

pub struct SqliteLegacyConverter {
    pool: SqlitePool,
}

impl SqliteLegacyConverter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LegacyConverter for SqliteLegacyConverter {
    async fn is_outdated(&self) -> Result<bool, RepoError> {
        // A brand new file has no tables and is simply initialized later
        if !table_exists(&self.pool, "marriages").await? {
            return Ok(false);
        }
        Ok(user_version(&self.pool).await? < SCHEMA_VERSION)
    }

    async fn convert(&self) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::migration(e))?;

        let legacy_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM marriages")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepoError::migration(e))?;

        sqlx::query(
            r#"
            CREATE TABLE marriages_v1 (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player1 TEXT NOT NULL,
                player2 TEXT NOT NULL,
                priest TEXT,
                married_at TEXT NOT NULL,
                UNIQUE (player1, player2)
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::migration(e))?;

        // Lowercase hyphenated UUIDs sort the same way as their bytes, which
        // is the order `Couple` normalizes to.
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO marriages_v1 (player1, player2, priest, married_at)
            SELECT
                CASE WHEN lower(player1) < lower(player2) THEN lower(player1) ELSE lower(player2) END,
                CASE WHEN lower(player1) < lower(player2) THEN lower(player2) ELSE lower(player1) END,
                lower(priest),
                married_at
            FROM marriages
            WHERE lower(player1) <> lower(player2)
            ORDER BY id
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::migration(e))?;

        let kept_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM marriages_v1")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepoError::migration(e))?;

        for statement in [
            "DROP TABLE marriages",
            "ALTER TABLE marriages_v1 RENAME TO marriages",
            "CREATE INDEX IF NOT EXISTS idx_marriages_player2 ON marriages(player2)",
        ] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::migration(e))?;
        }

        let has_players: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'players'",
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepoError::migration(e))?;

        if has_players > 0 {
            sqlx::query("UPDATE OR IGNORE players SET id = lower(id)")
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::migration(e))?;
        }

        sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::migration(e))?;

        tx.commit().await.map_err(|e| RepoError::migration(e))?;

        tracing::info!(
            legacy_rows,
            kept_rows,
            dropped = legacy_rows - kept_rows,
            version = SCHEMA_VERSION,
            "Converted legacy marriage data"
        );
        Ok(())
    }
}

/// Converter for backends with no legacy format (in-memory storage).
pub struct NoopLegacyConverter;

#[async_trait]
impl LegacyConverter for NoopLegacyConverter {
    async fn is_outdated(&self) -> Result<bool, RepoError> {
        Ok(false)
    }

    async fn convert(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
