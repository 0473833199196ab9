// In-memory usage store, for tests and database-less runs.

use crate::core::usage::{PopularQuery, UsageError, UsageStore, UserStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct StoredUser {
    username: Option<String>,
    joined_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct InMemoryUsageStore {
    users: DashMap<i64, StoredUser>,
    /// user id -> queries, in order asked
    queries: DashMap<i64, Vec<String>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), UsageError> {
        self.users
            .entry(user_id)
            .and_modify(|u| {
                u.username = username.map(str::to_string);
                u.last_active = now;
            })
            .or_insert_with(|| StoredUser {
                username: username.map(str::to_string),
                joined_at: now,
                last_active: now,
            });
        Ok(())
    }

    async fn log_query(
        &self,
        user_id: i64,
        query: &str,
        _at: DateTime<Utc>,
    ) -> Result<(), UsageError> {
        self.queries
            .entry(user_id)
            .or_default()
            .push(query.to_string());
        Ok(())
    }

    async fn popular_queries(&self, limit: usize) -> Result<Vec<PopularQuery>, UsageError> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for entry in self.queries.iter() {
            for query in entry.value() {
                *counts.entry(query.clone()).or_insert(0) += 1;
            }
        }

        let mut popular: Vec<PopularQuery> = counts
            .into_iter()
            .map(|(query, count)| PopularQuery { query, count })
            .collect();
        popular.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
        popular.truncate(limit);
        Ok(popular)
    }

    async fn total_queries(&self) -> Result<u64, UsageError> {
        Ok(self.queries.iter().map(|e| e.value().len() as u64).sum())
    }

    async fn user_stats(&self, user_id: i64) -> Result<UserStats, UsageError> {
        let query_count = self
            .queries
            .get(&user_id)
            .map(|q| q.len() as u64)
            .unwrap_or(0);

        Ok(match self.users.get(&user_id) {
            Some(user) => UserStats {
                user_id,
                username: user.username.clone(),
                joined_at: Some(user.joined_at),
                last_active: Some(user.last_active),
                query_count,
            },
            None => UserStats {
                query_count,
                ..UserStats::unknown(user_id)
            },
        })
    }
}
