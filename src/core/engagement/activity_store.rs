// Per-chat activity timers.
//
// Lives for the process lifetime only. Losing it on restart just resets the
// engagement cadence.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// What we remember about one chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatActivityState {
    /// Last inbound message
    pub last_activity: Option<DateTime<Utc>>,
    /// Last time a periodic greeting went out
    pub last_greeting: Option<DateTime<Utc>>,
}

/// Concurrent map of chat id -> activity state.
///
/// **DashMap:** per-key locking, so messages from different chats can be
/// handled on different tasks without a global mutex.
#[derive(Debug, Default)]
pub struct ChatActivityStore {
    chats: DashMap<i64, ChatActivityState>,
}

impl ChatActivityStore {
    pub fn new() -> Self {
        Self {
            chats: DashMap::new(),
        }
    }

    /// State for `chat_id`; an unknown chat has never been active.
    pub fn get(&self, chat_id: i64) -> ChatActivityState {
        self.chats.get(&chat_id).map(|s| *s).unwrap_or_default()
    }

    /// Record an inbound message.
    pub fn touch(&self, chat_id: i64, now: DateTime<Utc>) {
        self.chats.entry(chat_id).or_default().last_activity = Some(now);
    }

    /// True when nothing was heard for longer than `threshold`, or ever.
    pub fn is_quiet(&self, chat_id: i64, now: DateTime<Utc>, threshold: Duration) -> bool {
        match self.get(chat_id).last_activity {
            Some(last) => now - last > threshold,
            None => true,
        }
    }

    /// Claims the periodic greeting slot: returns true (and records `now`) when
    /// the last greeting is older than `interval` or never happened.
    pub fn should_greet(&self, chat_id: i64, now: DateTime<Utc>, interval: Duration) -> bool {
        let mut state = self.chats.entry(chat_id).or_default();
        let due = match state.last_greeting {
            Some(last) => now - last > interval,
            None => true,
        };
        if due {
            state.last_greeting = Some(now);
        }
        due
    }

}
