use super::knowledge_models::{EntrySource, KnowledgeEntry, KnowledgeUpdate, NewKnowledgeEntry};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Knowledge source error: {0}")]
    SourceError(String),

    #[error("Knowledge entry {0} not found")]
    NotFound(i64),

    #[error("A knowledge entry needs a topic and content")]
    InvalidEntry,

    #[error("An entry for '{topic}' in '{category}' already exists")]
    Duplicate { topic: String, category: String },
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for storing and reading the knowledge corpus.
///
/// The retriever only ever reads (`list_all`, `by_category`); the write methods
/// exist for seeding, CSV sync and admin edits.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Every entry, oldest first.
    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError>;

    /// Entries in one category, ordered by topic.
    async fn by_category(&self, category: &str) -> Result<Vec<KnowledgeEntry>, KnowledgeError>;

    /// Insert an entry, overwriting any existing entry with the same
    /// `(topic, category)`. Returns the entry id.
    async fn upsert(
        &self,
        entry: NewKnowledgeEntry,
        source: EntrySource,
    ) -> Result<i64, KnowledgeError>;

    /// Apply a partial edit. Fails with `NotFound` for an unknown id and with
    /// `Duplicate` when the edit would collide with another entry's
    /// `(topic, category)`.
    async fn update(&self, id: i64, update: KnowledgeUpdate) -> Result<(), KnowledgeError>;

    /// Remove an entry. Fails with `NotFound` for an unknown id.
    async fn delete(&self, id: i64) -> Result<(), KnowledgeError>;

    /// Drop every entry from `source` and insert `entries` in their place.
    /// Returns how many entries were written.
    async fn replace_source(
        &self,
        source: EntrySource,
        entries: Vec<NewKnowledgeEntry>,
    ) -> Result<usize, KnowledgeError>;

    async fn count(&self) -> Result<usize, KnowledgeError>;
}

// Lets the service hold a trait object so the composition root can pick the
// store at runtime (SQLite in production, in-memory in tests).
#[async_trait]
impl KnowledgeStore for Box<dyn KnowledgeStore> {
    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        (**self).list_all().await
    }

    async fn by_category(&self, category: &str) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        (**self).by_category(category).await
    }

    async fn upsert(
        &self,
        entry: NewKnowledgeEntry,
        source: EntrySource,
    ) -> Result<i64, KnowledgeError> {
        (**self).upsert(entry, source).await
    }

    async fn update(&self, id: i64, update: KnowledgeUpdate) -> Result<(), KnowledgeError> {
        (**self).update(id, update).await
    }

    async fn delete(&self, id: i64) -> Result<(), KnowledgeError> {
        (**self).delete(id).await
    }

    async fn replace_source(
        &self,
        source: EntrySource,
        entries: Vec<NewKnowledgeEntry>,
    ) -> Result<usize, KnowledgeError> {
        (**self).replace_source(source, entries).await
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        (**self).count().await
    }
}

// ============================================================================
// SOURCE TRAIT
// ============================================================================

/// A remote feed the corpus is periodically refreshed from (the CSV sheet).
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<NewKnowledgeEntry>, KnowledgeError>;

    /// Where the data comes from, for log lines.
    fn describe(&self) -> String;
}
