// Usage domain models - who talks to the bot and what they ask.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-user summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_id: i64,
    /// `None` if the user was never recorded
    pub username: Option<String>,
    pub joined_at: Option<DateTime<Utc>>,
    pub last_active: Option<DateTime<Utc>>,
    pub query_count: u64,
}

impl UserStats {
    pub fn unknown(user_id: i64) -> Self {
        Self {
            user_id,
            username: None,
            joined_at: None,
            last_active: None,
            query_count: 0,
        }
    }
}

/// A query text and how often it was asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularQuery {
    pub query: String,
    pub count: u64,
}
