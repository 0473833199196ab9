// Flood guard - core business logic for spam detection.
//
// A user who sends more than the allowed number of messages inside the
// sliding window is flagged. Every flag bumps their warning count so replies
// can get firmer.
//
// NO chat-platform dependencies here - just pure domain logic.

use super::moderation_models::{SpamCheck, SpamConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum SpamError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting flood-guard state.
///
/// Keys are always (user, chat): the same user is tracked separately in
/// every chat.
#[async_trait]
pub trait SpamStore: Send + Sync {
    /// Record a message timestamp.
    async fn record_message(
        &self,
        user_id: i64,
        chat_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), SpamError>;

    /// Number of recorded messages at or after `since`.
    async fn count_since(
        &self,
        user_id: i64,
        chat_id: i64,
        since: DateTime<Utc>,
    ) -> Result<usize, SpamError>;

    /// Add a warning. Returns the new total warning count.
    async fn add_warning(&self, user_id: i64, chat_id: i64) -> Result<u32, SpamError>;

    /// Current warning count.
    async fn get_warnings(&self, user_id: i64, chat_id: i64) -> Result<u32, SpamError>;

    /// Clear warnings for a user (e.g. manual reset).
    async fn clear_warnings(&self, user_id: i64, chat_id: i64) -> Result<(), SpamError>;

    /// Config for a chat; chats without one get the default.
    async fn get_config(&self, chat_id: i64) -> Result<SpamConfig, SpamError>;

    async fn save_config(&self, chat_id: i64, config: SpamConfig) -> Result<(), SpamError>;

    /// Every config saved for a specific chat.
    async fn all_configs(&self) -> Result<Vec<SpamConfig>, SpamError>;

    /// Drop message records older than `older_than`. Returns how many went.
    async fn prune(&self, older_than: DateTime<Utc>) -> Result<u64, SpamError>;
}

#[async_trait]
impl SpamStore for Box<dyn SpamStore> {
    async fn record_message(
        &self,
        user_id: i64,
        chat_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), SpamError> {
        (**self).record_message(user_id, chat_id, at).await
    }

    async fn count_since(
        &self,
        user_id: i64,
        chat_id: i64,
        since: DateTime<Utc>,
    ) -> Result<usize, SpamError> {
        (**self).count_since(user_id, chat_id, since).await
    }

    async fn add_warning(&self, user_id: i64, chat_id: i64) -> Result<u32, SpamError> {
        (**self).add_warning(user_id, chat_id).await
    }

    async fn get_warnings(&self, user_id: i64, chat_id: i64) -> Result<u32, SpamError> {
        (**self).get_warnings(user_id, chat_id).await
    }

    async fn clear_warnings(&self, user_id: i64, chat_id: i64) -> Result<(), SpamError> {
        (**self).clear_warnings(user_id, chat_id).await
    }

    async fn get_config(&self, chat_id: i64) -> Result<SpamConfig, SpamError> {
        (**self).get_config(chat_id).await
    }

    async fn save_config(&self, chat_id: i64, config: SpamConfig) -> Result<(), SpamError> {
        (**self).save_config(chat_id, config).await
    }

    async fn all_configs(&self) -> Result<Vec<SpamConfig>, SpamError> {
        (**self).all_configs().await
    }

    async fn prune(&self, older_than: DateTime<Utc>) -> Result<u64, SpamError> {
        (**self).prune(older_than).await
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct SpamGuard<S: SpamStore> {
    store: S,
}

impl<S: SpamStore> SpamGuard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a message and check whether it pushes the user over the limit.
    ///
    /// The current message counts towards the window, so with the default
    /// config the sixth message inside 30 seconds is the first one flagged.
    pub async fn check_message(
        &self,
        user_id: i64,
        chat_id: i64,
        now: DateTime<Utc>,
    ) -> Result<SpamCheck, SpamError> {
        let config = self.store.get_config(chat_id).await?;

        if !config.enabled {
            return Ok(SpamCheck::ok());
        }

        self.store.record_message(user_id, chat_id, now).await?;

        // Exclusive lower bound: a message exactly one window old has expired
        let since = now - config.window() + chrono::Duration::milliseconds(1);
        let recent = self.store.count_since(user_id, chat_id, since).await?;

        if recent <= config.max_messages_per_window as usize {
            return Ok(SpamCheck::ok());
        }

        let warnings = self.store.add_warning(user_id, chat_id).await?;
        tracing::warn!(user_id, chat_id, recent, warnings, "flood detected");

        Ok(SpamCheck::spam(warnings))
    }

    /// Forget message records older than the longest window any chat uses.
    pub async fn prune(&self, now: DateTime<Utc>) -> Result<u64, SpamError> {
        let window = self
            .store
            .all_configs()
            .await?
            .iter()
            .map(SpamConfig::window)
            .fold(SpamConfig::default().window(), |longest, w| longest.max(w));
        self.store.prune(now - window).await
    }

    pub async fn get_config(&self, chat_id: i64) -> Result<SpamConfig, SpamError> {
        self.store.get_config(chat_id).await
    }

    pub async fn set_config(&self, chat_id: i64, config: SpamConfig) -> Result<(), SpamError> {
        self.store.save_config(chat_id, config).await
    }

    /// Turn the guard on or off for a chat.
    pub async fn set_enabled(&self, chat_id: i64, enabled: bool) -> Result<(), SpamError> {
        let mut config = self.store.get_config(chat_id).await?;
        config.enabled = enabled;
        self.store.save_config(chat_id, config).await
    }

    pub async fn user_warnings(&self, user_id: i64, chat_id: i64) -> Result<u32, SpamError> {
        self.store.get_warnings(user_id, chat_id).await
    }

    pub async fn clear_user_warnings(&self, user_id: i64, chat_id: i64) -> Result<(), SpamError> {
        self.store.clear_warnings(user_id, chat_id).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
