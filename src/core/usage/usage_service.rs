// Usage tracking - records users and the questions they ask.
//
// Failures here never block a reply; the chat layer logs and moves on.

use super::usage_models::{PopularQuery, UserStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Insert the user or refresh their username and last-active time.
    async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), UsageError>;

    async fn log_query(
        &self,
        user_id: i64,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<(), UsageError>;

    /// Most asked queries, highest count first. Ties break alphabetically.
    async fn popular_queries(&self, limit: usize) -> Result<Vec<PopularQuery>, UsageError>;

    async fn total_queries(&self) -> Result<u64, UsageError>;

    async fn user_stats(&self, user_id: i64) -> Result<UserStats, UsageError>;
}

#[async_trait]
impl UsageStore for Box<dyn UsageStore> {
    async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), UsageError> {
        (**self).upsert_user(user_id, username, now).await
    }

    async fn log_query(
        &self,
        user_id: i64,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<(), UsageError> {
        (**self).log_query(user_id, query, at).await
    }

    async fn popular_queries(&self, limit: usize) -> Result<Vec<PopularQuery>, UsageError> {
        (**self).popular_queries(limit).await
    }

    async fn total_queries(&self) -> Result<u64, UsageError> {
        (**self).total_queries().await
    }

    async fn user_stats(&self, user_id: i64) -> Result<UserStats, UsageError> {
        (**self).user_stats(user_id).await
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct UsageService<S: UsageStore> {
    store: S,
}

impl<S: UsageStore> UsageService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn record_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), UsageError> {
        let username = username.map(str::trim).filter(|u| !u.is_empty());
        self.store.upsert_user(user_id, username, now).await
    }

    /// Log a question. Blank queries are ignored; text is stored lowercase so
    /// "Etosha?" and "etosha?" count as the same question.
    pub async fn log_query(
        &self,
        user_id: i64,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<(), UsageError> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(());
        }
        self.store.log_query(user_id, &normalized, now).await
    }

    pub async fn popular_queries(&self, limit: usize) -> Result<Vec<PopularQuery>, UsageError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.store.popular_queries(limit).await
    }

    pub async fn total_queries(&self) -> Result<u64, UsageError> {
        self.store.total_queries().await
    }

    pub async fn user_stats(&self, user_id: i64) -> Result<UserStats, UsageError> {
        self.store.user_stats(user_id).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
