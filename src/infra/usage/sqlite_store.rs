// SQLite implementation of the UsageStore trait.
//
// Tables:
// - users: one row per user, refreshed on every message
// - query_logs: one row per question

use crate::core::usage::{PopularQuery, UsageError, UsageStore, UserStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

pub struct SqliteUsageStore {
    pool: SqlitePool,
}

fn storage_err(e: sqlx::Error) -> UsageError {
    UsageError::StorageError(e.to_string())
}

fn parse_time(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl SqliteUsageStore {
    pub async fn new(pool: SqlitePool) -> anyhow::Result<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create tables.
    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                joined_at TEXT NOT NULL,
                last_active TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS query_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                query TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_query_logs_user ON query_logs(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl UsageStore for SqliteUsageStore {
    async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), UsageError> {
        let now = now.to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, joined_at, last_active)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                last_active = excluded.last_active
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn log_query(
        &self,
        user_id: i64,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<(), UsageError> {
        sqlx::query("INSERT INTO query_logs (user_id, query, timestamp) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(query)
            .bind(at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn popular_queries(&self, limit: usize) -> Result<Vec<PopularQuery>, UsageError> {
        let rows = sqlx::query(
            r#"
            SELECT query, COUNT(*) AS count
            FROM query_logs
            GROUP BY query
            ORDER BY count DESC, query ASC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows
            .into_iter()
            .map(|row| PopularQuery {
                query: row.get("query"),
                count: row.get::<i64, _>("count") as u64,
            })
            .collect())
    }

    async fn total_queries(&self) -> Result<u64, UsageError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM query_logs")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(row.get::<i64, _>("count") as u64)
    }

    async fn user_stats(&self, user_id: i64) -> Result<UserStats, UsageError> {
        let user = sqlx::query("SELECT username, joined_at, last_active FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        let count_row = sqlx::query("SELECT COUNT(*) AS count FROM query_logs WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        let query_count = count_row.get::<i64, _>("count") as u64;

        Ok(match user {
            Some(row) => UserStats {
                user_id,
                username: row.get("username"),
                joined_at: parse_time(row.get("joined_at")),
                last_active: parse_time(row.get("last_active")),
                query_count,
            },
            None => UserStats {
                query_count,
                ..UserStats::unknown(user_id)
            },
        })
    }
}
