// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "sqlite.rs"]
pub mod sqlite;

#[path = "knowledge/mod.rs"]
pub mod knowledge;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "usage/mod.rs"]
pub mod usage;

#[path = "ai/mod.rs"]
pub mod ai;
