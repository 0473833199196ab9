// Core AI module - generated replies for questions the knowledge base can't
// answer, and fresh conversation starters.

pub mod ai_models;
pub mod ai_service;

pub use ai_models::{AiConfig, AiMessage};
pub use ai_service::{AiError, AiProvider, AiService, CONTEXT_ENTRIES};
