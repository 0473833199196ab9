// Core knowledge module - corpus model, retrieval pipeline and the service
// that feeds it from a store.

pub mod fuzzy;
pub mod knowledge_models;
pub mod knowledge_service;
pub mod knowledge_store;
pub mod retriever;
pub mod seed_data;
pub mod text;

pub use knowledge_models::*;
pub use knowledge_service::KnowledgeService;
pub use knowledge_store::{KnowledgeError, KnowledgeSource, KnowledgeStore};
pub use retriever::{KnowledgeRetriever, RetrieverConfig};
pub use text::SynonymTable;
