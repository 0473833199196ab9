// In-memory flood-guard state.
//
// Message timestamps only matter for the length of one window, so there is
// nothing worth persisting; a restart just forgets who was flooding.

use crate::core::moderation::{SpamConfig, SpamError, SpamStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Composite key: the same user is tracked separately in every chat.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
struct UserChatKey {
    user_id: i64,
    chat_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemorySpamStore {
    messages: DashMap<UserChatKey, Vec<DateTime<Utc>>>,
    warnings: DashMap<UserChatKey, u32>,
    configs: DashMap<i64, SpamConfig>,
}

impl InMemorySpamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpamStore for InMemorySpamStore {
    async fn record_message(
        &self,
        user_id: i64,
        chat_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), SpamError> {
        self.messages
            .entry(UserChatKey { user_id, chat_id })
            .or_default()
            .push(at);
        Ok(())
    }

    async fn count_since(
        &self,
        user_id: i64,
        chat_id: i64,
        since: DateTime<Utc>,
    ) -> Result<usize, SpamError> {
        let key = UserChatKey { user_id, chat_id };
        Ok(self
            .messages
            .get(&key)
            .map(|times| times.iter().filter(|t| **t >= since).count())
            .unwrap_or(0))
    }

    async fn add_warning(&self, user_id: i64, chat_id: i64) -> Result<u32, SpamError> {
        let mut count = self
            .warnings
            .entry(UserChatKey { user_id, chat_id })
            .or_insert(0);
        *count = count.saturating_add(1);
        Ok(*count)
    }

    async fn get_warnings(&self, user_id: i64, chat_id: i64) -> Result<u32, SpamError> {
        Ok(self
            .warnings
            .get(&UserChatKey { user_id, chat_id })
            .map(|w| *w)
            .unwrap_or(0))
    }

    async fn clear_warnings(&self, user_id: i64, chat_id: i64) -> Result<(), SpamError> {
        self.warnings.remove(&UserChatKey { user_id, chat_id });
        Ok(())
    }

    async fn get_config(&self, chat_id: i64) -> Result<SpamConfig, SpamError> {
        Ok(self
            .configs
            .get(&chat_id)
            .map(|c| c.clone())
            .unwrap_or_default())
    }

    async fn save_config(&self, chat_id: i64, config: SpamConfig) -> Result<(), SpamError> {
        self.configs.insert(chat_id, config);
        Ok(())
    }

    async fn all_configs(&self) -> Result<Vec<SpamConfig>, SpamError> {
        Ok(self.configs.iter().map(|c| c.value().clone()).collect())
    }

    async fn prune(&self, older_than: DateTime<Utc>) -> Result<u64, SpamError> {
        let mut removed = 0u64;
        for mut entry in self.messages.iter_mut() {
            let before = entry.len();
            entry.retain(|t| *t >= older_than);
            removed += (before - entry.len()) as u64;
        }
        self.messages.retain(|_, times| !times.is_empty());
        Ok(removed)
    }
}
