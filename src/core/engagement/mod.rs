// Core engagement module - decides when the bot joins a conversation.

pub mod activity_store;
pub mod engagement_models;
pub mod response_decider;

pub use activity_store::ChatActivityStore;
pub use engagement_models::{DeciderConfig, ResponseCategory};
pub use response_decider::{RandomSource, ResponseDecider, SeededRandom, ThreadRandom};
