//! SQLite-backed marriage storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marriage_domain::{Couple, Gender, Marriage, MarriageList, MarriagePlayer, PlayerId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::connection::{user_version, SCHEMA_VERSION};
use crate::infrastructure::ports::{ClockPort, MarriageRepo, RepoError};

/// SQLite implementation of the marriage repository.
///
/// Couples are written in normalized order, so `UNIQUE(player1, player2)`
/// is enough to make the pair unique regardless of who proposed.
pub struct SqliteMarriageRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteMarriageRepo {
    /// Wrap an open pool, creating the current schema if it is missing.
    ///
    /// Legacy databases must go through `SqliteLegacyConverter` first.
    pub async fn new(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS players (
                id TEXT PRIMARY KEY,
                gender TEXT NOT NULL DEFAULT 'unspecified',
                last_name TEXT,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("schema", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS marriages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player1 TEXT NOT NULL,
                player2 TEXT NOT NULL,
                priest TEXT,
                married_at TEXT NOT NULL,
                UNIQUE (player1, player2)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("schema", e))?;

        // player1 lookups are covered by the unique index
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_marriages_player2 ON marriages(player2)")
            .execute(&pool)
            .await
            .map_err(|e| RepoError::database("schema", e))?;

        if user_version(&pool).await? < SCHEMA_VERSION {
            sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
                .execute(&pool)
                .await
                .map_err(|e| RepoError::database("schema", e))?;
        }

        Ok(Self { pool, clock })
    }

    /// Open the database file at `db_path` and prepare the schema.
    pub async fn open(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let pool = super::connect(db_path).await?;
        Self::new(pool, clock).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn parse_player_id(value: &str) -> Result<PlayerId, RepoError> {
    value
        .parse()
        .map_err(|e| RepoError::serialization(format!("bad player id {:?}: {}", value, e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("bad timestamp {:?}: {}", value, e)))
}

fn row_to_marriage(row: &SqliteRow) -> Result<Marriage, RepoError> {
    let player1: String = row
        .try_get("player1")
        .map_err(|e| RepoError::serialization(e))?;
    let player2: String = row
        .try_get("player2")
        .map_err(|e| RepoError::serialization(e))?;
    let priest: Option<String> = row
        .try_get("priest")
        .map_err(|e| RepoError::serialization(e))?;
    let married_at: String = row
        .try_get("married_at")
        .map_err(|e| RepoError::serialization(e))?;

    let couple = Couple::new(parse_player_id(&player1)?, parse_player_id(&player2)?)
        .map_err(RepoError::serialization)?;
    let priest = priest.as_deref().map(parse_player_id).transpose()?;

    Ok(Marriage::new(couple, priest, parse_timestamp(&married_at)?))
}

#[async_trait]
impl MarriageRepo for SqliteMarriageRepo {
    async fn load_player(&self, id: PlayerId) -> Result<MarriagePlayer, RepoError> {
        let player_row = sqlx::query("SELECT gender, last_name FROM players WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("load_player", e))?;

        let mut player = MarriagePlayer::new(id);
        if let Some(row) = player_row {
            let gender: String = row
                .try_get("gender")
                .map_err(|e| RepoError::serialization(e))?;
            let last_name: Option<String> = row
                .try_get("last_name")
                .map_err(|e| RepoError::serialization(e))?;
            player.set_gender(gender.parse::<Gender>().map_err(RepoError::serialization)?);
            player.set_last_name(last_name);
        }

        let rows = sqlx::query(
            r#"
            SELECT player1, player2, priest, married_at FROM marriages
            WHERE player1 = ? OR player2 = ?
            ORDER BY id
            "#,
        )
        .bind(id.to_string())
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("load_player", e))?;

        let marriages = rows
            .iter()
            .map(row_to_marriage)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(player.with_marriages(marriages))
    }

    async fn save_player(&self, player: &MarriagePlayer) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO players (id, gender, last_name, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                gender = excluded.gender,
                last_name = excluded.last_name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(player.id().to_string())
        .bind(player.gender().as_str())
        .bind(player.last_name())
        .bind(self.clock.now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("save_player", e))?;

        Ok(())
    }

    async fn save_marriage(&self, marriage: &Marriage) -> Result<(), RepoError> {
        // Upserting keeps the original rowid, so listing order is creation order
        sqlx::query(
            r#"
            INSERT INTO marriages (player1, player2, priest, married_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(player1, player2) DO UPDATE SET
                priest = excluded.priest,
                married_at = excluded.married_at
            "#,
        )
        .bind(marriage.player1().to_string())
        .bind(marriage.player2().to_string())
        .bind(marriage.priest().map(|p| p.to_string()))
        .bind(marriage.married_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("save_marriage", e))?;

        Ok(())
    }

    async fn delete_marriage(&self, couple: Couple) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM marriages WHERE player1 = ? AND player2 = ?")
            .bind(couple.first().to_string())
            .bind(couple.second().to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("delete_marriage", e))?;
        Ok(())
    }

    async fn list_marriages(&self, scale: u32, page: u32) -> Result<MarriageList, RepoError> {
        // Count and page read the same snapshot
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("list_marriages", e))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM marriages")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepoError::database("list_marriages", e))?;

        let offset = u64::from(scale) * u64::from(page);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r#"
            SELECT player1, player2, priest, married_at FROM marriages
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(i64::from(scale))
        .bind(offset)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| RepoError::database("list_marriages", e))?;

        tx.commit()
            .await
            .map_err(|e| RepoError::database("list_marriages", e))?;

        let marriages = rows
            .iter()
            .map(row_to_marriage)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MarriageList {
            scale,
            page,
            total: u64::try_from(total).unwrap_or_default(),
            marriages,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Closed SQLite pool");
    }
}
