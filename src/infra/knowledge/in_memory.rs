// In-memory implementation of KnowledgeStore.
//
// Lives only as long as the process. Used by the service tests and the chat
// handler tests.

use crate::core::knowledge::{
    EntrySource, KnowledgeEntry, KnowledgeError, KnowledgeStore, KnowledgeUpdate,
    NewKnowledgeEntry,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Corpus {
    /// Keyed by id, so iteration is insertion order
    entries: BTreeMap<i64, KnowledgeEntry>,
    next_id: i64,
}

impl Corpus {
    fn find(&self, topic: &str, category: &str) -> Option<i64> {
        self.entries
            .values()
            .find(|e| e.topic == topic && e.category == category)
            .map(|e| e.id)
    }

    fn upsert(&mut self, entry: NewKnowledgeEntry, source: EntrySource) -> i64 {
        if let Some(id) = self.find(&entry.topic, &entry.category) {
            if let Some(existing) = self.entries.get_mut(&id) {
                existing.content = entry.content;
                existing.keywords = entry.keywords;
                existing.source = source;
            }
            return id;
        }

        self.next_id += 1;
        let id = self.next_id;
        self.entries.insert(
            id,
            KnowledgeEntry {
                id,
                topic: entry.topic,
                content: entry.content,
                category: entry.category,
                keywords: entry.keywords,
                source,
            },
        );
        id
    }
}

/// A single lock over the whole corpus. Writes are rare (sync and admin
/// edits), reads take a snapshot.
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeStore {
    corpus: RwLock<Corpus>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let corpus = self.corpus.read().await;
        Ok(corpus.entries.values().cloned().collect())
    }

    async fn by_category(&self, category: &str) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let corpus = self.corpus.read().await;
        let mut entries: Vec<KnowledgeEntry> = corpus
            .entries
            .values()
            .filter(|e| e.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.topic.cmp(&b.topic));
        Ok(entries)
    }

    async fn upsert(
        &self,
        entry: NewKnowledgeEntry,
        source: EntrySource,
    ) -> Result<i64, KnowledgeError> {
        let mut corpus = self.corpus.write().await;
        Ok(corpus.upsert(entry, source))
    }

    async fn update(&self, id: i64, update: KnowledgeUpdate) -> Result<(), KnowledgeError> {
        let mut corpus = self.corpus.write().await;
        let mut edited = corpus
            .entries
            .get(&id)
            .cloned()
            .ok_or(KnowledgeError::NotFound(id))?;
        update.apply_to(&mut edited);

        if let Some(other) = corpus.find(&edited.topic, &edited.category) {
            if other != id {
                return Err(KnowledgeError::Duplicate {
                    topic: edited.topic,
                    category: edited.category,
                });
            }
        }

        corpus.entries.insert(id, edited);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), KnowledgeError> {
        let mut corpus = self.corpus.write().await;
        corpus
            .entries
            .remove(&id)
            .map(|_| ())
            .ok_or(KnowledgeError::NotFound(id))
    }

    async fn replace_source(
        &self,
        source: EntrySource,
        entries: Vec<NewKnowledgeEntry>,
    ) -> Result<usize, KnowledgeError> {
        let mut corpus = self.corpus.write().await;
        corpus.entries.retain(|_, e| e.source != source);

        let written = entries.len();
        for entry in entries {
            corpus.upsert(entry, source);
        }
        Ok(written)
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        Ok(self.corpus.read().await.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(topic: &str, category: &str) -> NewKnowledgeEntry {
        NewKnowledgeEntry::new(topic, &format!("About {}", topic), category, &["tag"])
    }

    #[tokio::test]
    async fn test_upsert_and_list_in_insertion_order() {
        let store = InMemoryKnowledgeStore::new();

        let first = store.upsert(entry("Windhoek", "Geography"), EntrySource::Manual).await.unwrap();
        let second = store.upsert(entry("Etosha", "Tourism"), EntrySource::Manual).await.unwrap();

        assert!(second > first);
        let all = store.list_all().await.unwrap();
        let topics: Vec<&str> = all.iter().map(|e| e.topic.as_str()).collect();
        assert_eq!(topics, vec!["Windhoek", "Etosha"]);
    }

    #[tokio::test]
    async fn test_upsert_same_key_overwrites() {
        let store = InMemoryKnowledgeStore::new();

        let id = store.upsert(entry("Currency", "Practical"), EntrySource::Csv).await.unwrap();
        let again = store
            .upsert(
                NewKnowledgeEntry::new("Currency", "Namibian Dollar", "Practical", &["nad"]),
                EntrySource::Manual,
            )
            .await
            .unwrap();

        assert_eq!(id, again);
        assert_eq!(store.count().await.unwrap(), 1);
        let all = store.list_all().await.unwrap();
        assert_eq!(all[0].content, "Namibian Dollar");
        assert_eq!(all[0].source, EntrySource::Manual);
    }

    #[tokio::test]
    async fn test_by_category_sorted_by_topic() {
        let store = InMemoryKnowledgeStore::new();
        store.upsert(entry("Sossusvlei", "Tourism"), EntrySource::Manual).await.unwrap();
        store.upsert(entry("Etosha", "Tourism"), EntrySource::Manual).await.unwrap();
        store.upsert(entry("Windhoek", "Geography"), EntrySource::Manual).await.unwrap();

        let tourism = store.by_category("tourism").await.unwrap();
        let topics: Vec<&str> = tourism.iter().map(|e| e.topic.as_str()).collect();
        assert_eq!(topics, vec!["Etosha", "Sossusvlei"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let store = InMemoryKnowledgeStore::new();

        let update = KnowledgeUpdate {
            content: Some("new".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update(99, update).await,
            Err(KnowledgeError::NotFound(99))
        ));
        assert!(matches!(store.delete(99).await, Err(KnowledgeError::NotFound(99))));
    }

    #[tokio::test]
    async fn test_update_rejects_taken_topic_and_category() {
        let store = InMemoryKnowledgeStore::new();
        store.upsert(entry("Currency", "Practical"), EntrySource::Manual).await.unwrap();
        let money = store.upsert(entry("Money", "Practical"), EntrySource::Manual).await.unwrap();

        let rename = KnowledgeUpdate {
            topic: Some("Currency".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update(money, rename).await,
            Err(KnowledgeError::Duplicate { .. })
        ));

        let all = store.list_all().await.unwrap();
        assert_eq!(all.iter().filter(|e| e.topic == "Currency").count(), 1);
        assert!(all.iter().any(|e| e.id == money && e.topic == "Money"));
    }

    #[tokio::test]
    async fn test_update_keeping_own_key_is_allowed() {
        let store = InMemoryKnowledgeStore::new();
        let id = store.upsert(entry("Currency", "Practical"), EntrySource::Manual).await.unwrap();

        let edit = KnowledgeUpdate {
            topic: Some("Currency".to_string()),
            content: Some("Namibian Dollar".to_string()),
            ..Default::default()
        };
        store.update(id, edit).await.unwrap();

        assert_eq!(store.list_all().await.unwrap()[0].content, "Namibian Dollar");
    }

    #[tokio::test]
    async fn test_replace_source_keeps_other_sources() {
        let store = InMemoryKnowledgeStore::new();
        store.upsert(entry("Old row", "Tourism"), EntrySource::Csv).await.unwrap();
        store.upsert(entry("Hand written", "Tourism"), EntrySource::Manual).await.unwrap();

        let written = store
            .replace_source(EntrySource::Csv, vec![entry("New row", "Tourism")])
            .await
            .unwrap();

        assert_eq!(written, 1);
        let topics: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.topic)
            .collect();
        assert_eq!(topics, vec!["Hand written".to_string(), "New row".to_string()]);
    }
}
