// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "knowledge/mod.rs"]
pub mod knowledge;

#[path = "engagement/mod.rs"]
pub mod engagement;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "usage/mod.rs"]
pub mod usage;

#[path = "ai/mod.rs"]
pub mod ai;
