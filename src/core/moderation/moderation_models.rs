// Moderation domain models - data structures for the flood guard.
//
// Pure domain types, no chat-platform dependencies. The chat layer turns a
// SpamCheck into a warning reply.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Highest warning level that gets its own wording.
pub const MAX_WARNING_LEVEL: u32 = 3;

/// Result of checking one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpamCheck {
    /// Whether the message went over the limit
    pub is_spam: bool,
    /// How many times this user has been caught in this chat (0 if not spam)
    pub warning_level: u32,
}

impl SpamCheck {
    /// Create a "not spam" result
    pub fn ok() -> Self {
        Self {
            is_spam: false,
            warning_level: 0,
        }
    }

    /// Create a spam result at the given warning count
    pub fn spam(warning_count: u32) -> Self {
        Self {
            is_spam: true,
            warning_level: warning_count,
        }
    }

    /// Warning level for wording, 1 through `MAX_WARNING_LEVEL`.
    pub fn severity(&self) -> u32 {
        self.warning_level.clamp(1, MAX_WARNING_LEVEL)
    }
}

/// Configuration for flood detection in one chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpamConfig {
    /// Whether the guard runs in this chat
    pub enabled: bool,
    /// Messages allowed in the window; one more is spam
    pub max_messages_per_window: u32,
    /// Window length in seconds
    pub window_secs: i64,
}

impl SpamConfig {
    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_secs)
    }
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_messages_per_window: 5, // 5 messages...
            window_secs: 30,            // ...in 30 seconds
        }
    }
}
