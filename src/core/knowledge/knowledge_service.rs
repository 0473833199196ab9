// Knowledge service - the async face of the retriever.
//
// The retriever is pure and synchronous; this service pulls the corpus out of
// whatever store is injected, cleans chat-style questions into queries, and
// keeps the corpus fresh from the CSV feed.
//
// NO chat-platform dependencies here.

use super::knowledge_models::{
    EntrySource, KnowledgeEntry, KnowledgeUpdate, NewKnowledgeEntry, RankedEntry,
};
use super::knowledge_store::{KnowledgeError, KnowledgeSource, KnowledgeStore};
use super::retriever::KnowledgeRetriever;
use super::seed_data::fallback_entries;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use tokio::sync::Mutex;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Phrases stripped from the front of a question before searching, longest
/// first so "what is the" wins over "what is".
const QUESTION_PREFIXES: &[&str] = &[
    "can you tell me about",
    "can you tell me",
    "tell me about",
    "what are",
    "what is",
    "where are",
    "where is",
    "when are",
    "when is",
    "why are",
    "why is",
    "how are",
    "how is",
    "who are",
    "who is",
    "explain",
    "describe",
];

/// Stock phrasings mapped straight to a topic, tried when search finds nothing.
const COMMON_QUESTIONS: &[(&str, &str)] = &[
    ("where is namibia", "Where is Namibia"),
    ("capital of namibia", "Capital of Namibia"),
    ("size of namibia", "Size of Namibia"),
    ("population of namibia", "Population Density"),
    ("currency of namibia", "Currency"),
    ("weather in namibia", "Weather"),
    ("best time to visit", "Best time to visit Namibia"),
    ("etosha national park", "Etosha National Park"),
    ("himba people", "Himba People"),
    ("herero people", "Herero People"),
    ("languages in namibia", "Languages in Namibia"),
    ("visa requirements", "Visa Requirements"),
    ("fish river canyon", "Fish River Canyon"),
    ("desert elephants", "Desert Adapted Elephants"),
    ("desert lions", "Namib Desert Lions"),
    ("independence day", "Independence Day"),
    ("oldest desert", "Oldest Desert"),
    ("dark sky reserve", "Dark Sky Reserve"),
];

/// Share of the retriever threshold used when gathering context entries.
const RELATED_THRESHOLD_FACTOR: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct AnswerConfig {
    pub question_prefixes: Vec<String>,
    /// (phrase in the question, topic to look up)
    pub common_questions: Vec<(String, String)>,
    /// How many candidates `find_answer` asks the retriever for
    pub answer_limit: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            question_prefixes: QUESTION_PREFIXES.iter().map(|p| p.to_string()).collect(),
            common_questions: COMMON_QUESTIONS
                .iter()
                .map(|(q, t)| (q.to_string(), t.to_string()))
                .collect(),
            answer_limit: 3,
        }
    }
}

/// What a call to `refresh_if_stale` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Last sync is recent enough and the store has data
    Fresh,
    /// Entries pulled from the source
    Synced(usize),
    /// Source unavailable and the store was empty, so the built-in corpus went in
    SeededFallback(usize),
    /// Source unavailable (or absent) but the store already had data
    KeptExisting,
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct KnowledgeService<S: KnowledgeStore> {
    store: S,
    retriever: KnowledgeRetriever,
    answers: AnswerConfig,
    source: Option<Box<dyn KnowledgeSource>>,
    sync_interval: Duration,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

impl<S: KnowledgeStore> KnowledgeService<S> {
    pub fn new(store: S, retriever: KnowledgeRetriever) -> Self {
        Self {
            store,
            retriever,
            answers: AnswerConfig::default(),
            source: None,
            sync_interval: Duration::minutes(10),
            last_sync: Mutex::new(None),
        }
    }

    /// Refresh the corpus from `source` at most once per `interval`.
    pub fn with_source(mut self, source: Box<dyn KnowledgeSource>, interval: Duration) -> Self {
        self.source = Some(source);
        self.sync_interval = interval;
        self
    }

    // ------------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------------

    /// Ranked matches for a raw query.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<RankedEntry>, KnowledgeError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let corpus = self.store.list_all().await?;
        let threshold = self.retriever.config().threshold;
        Ok(self
            .retriever
            .search_with(query, &corpus, limit, threshold)
            .into_iter()
            .map(RankedEntry::from)
            .collect())
    }

    /// Turns "What is the capital of Namibia?" into "the capital of namibia".
    pub fn clean_question(&self, question: &str) -> String {
        let mut cleaned = question.trim().to_lowercase();

        for prefix in &self.answers.question_prefixes {
            if let Some(rest) = cleaned.strip_prefix(prefix.as_str()) {
                // Only strip whole words ("whatever" keeps its "what")
                if rest.is_empty() || rest.starts_with(|c: char| !c.is_alphanumeric()) {
                    cleaned = rest.trim().to_string();
                }
            }
        }

        cleaned
            .trim_end_matches(|c: char| c == '?' || c == '!' || c == '.' || c.is_whitespace())
            .to_string()
    }

    /// Best single answer for a chat question, or `None` when nothing clears
    /// the threshold. Callers supply their own "not sure" reply.
    pub async fn find_answer(&self, question: &str) -> Result<Option<RankedEntry>, KnowledgeError> {
        let cleaned = self.clean_question(question);
        if cleaned.is_empty() {
            return Ok(None);
        }

        let corpus = self.store.list_all().await?;
        let threshold = self.retriever.config().threshold;

        let results =
            self.retriever
                .search_with(&cleaned, &corpus, self.answers.answer_limit, threshold);
        if let Some(best) = results.into_iter().next() {
            return Ok(Some(best.into()));
        }

        for (phrase, topic) in &self.answers.common_questions {
            if cleaned.contains(phrase.as_str()) {
                let hit = self
                    .retriever
                    .search_with(topic, &corpus, 1, threshold)
                    .into_iter()
                    .next();
                if let Some(hit) = hit {
                    tracing::debug!(phrase = %phrase, topic = %topic, "answered from common questions");
                    return Ok(Some(hit.into()));
                }
            }
        }

        Ok(None)
    }

    /// Entries loosely related to a question, for grounding a generated reply
    /// when `find_answer` came up empty. Uses half the usual threshold.
    pub async fn related(
        &self,
        question: &str,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let cleaned = self.clean_question(question);
        if cleaned.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let corpus = self.store.list_all().await?;
        let threshold = self.retriever.config().threshold * RELATED_THRESHOLD_FACTOR;
        Ok(self
            .retriever
            .search_with(&cleaned, &corpus, limit, threshold)
            .into_iter()
            .map(|hit| hit.entry.clone())
            .collect())
    }

    // ------------------------------------------------------------------------
    // Browsing
    // ------------------------------------------------------------------------

    pub async fn by_category(&self, category: &str) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        self.store.by_category(category).await
    }

    /// Distinct categories, alphabetical.
    pub async fn categories(&self) -> Result<Vec<String>, KnowledgeError> {
        let entries = self.store.list_all().await?;
        let set: BTreeSet<String> = entries.into_iter().map(|e| e.category).collect();
        Ok(set.into_iter().collect())
    }

    /// Distinct topics, alphabetical.
    pub async fn topics(&self) -> Result<Vec<String>, KnowledgeError> {
        let entries = self.store.list_all().await?;
        let set: BTreeSet<String> = entries.into_iter().map(|e| e.topic).collect();
        Ok(set.into_iter().collect())
    }

    pub async fn count(&self) -> Result<usize, KnowledgeError> {
        self.store.count().await
    }

    // ------------------------------------------------------------------------
    // Admin writes
    // ------------------------------------------------------------------------

    /// Add an entry by hand. Same `(topic, category)` overwrites.
    pub async fn add_knowledge(&self, entry: NewKnowledgeEntry) -> Result<i64, KnowledgeError> {
        if entry.topic.trim().is_empty() || entry.content.trim().is_empty() {
            return Err(KnowledgeError::InvalidEntry);
        }
        let id = self.store.upsert(entry, EntrySource::Manual).await?;
        tracing::info!(id, "knowledge entry added");
        Ok(id)
    }

    pub async fn update_knowledge(
        &self,
        id: i64,
        update: KnowledgeUpdate,
    ) -> Result<(), KnowledgeError> {
        if update.is_empty() {
            return Ok(());
        }
        self.store.update(id, update).await
    }

    pub async fn delete_knowledge(&self, id: i64) -> Result<(), KnowledgeError> {
        self.store.delete(id).await
    }

    // ------------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------------

    /// Pull from the configured source if the last sync is older than the
    /// interval. Falls back to the built-in corpus when the source fails and
    /// nothing is stored yet.
    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> Result<SyncOutcome, KnowledgeError> {
        let mut last_sync = self.last_sync.lock().await;

        let has_data = self.store.count().await? > 0;
        if has_data {
            if let Some(last) = *last_sync {
                if now - last < self.sync_interval {
                    return Ok(SyncOutcome::Fresh);
                }
            }
        }

        if let Some(source) = &self.source {
            tracing::info!(source = %source.describe(), "fetching knowledge base");
            match source.fetch().await {
                Ok(entries) if !entries.is_empty() => {
                    let written = self.store.replace_source(EntrySource::Csv, entries).await?;
                    // Real data supersedes the built-in corpus
                    self.store
                        .replace_source(EntrySource::Fallback, Vec::new())
                        .await?;
                    *last_sync = Some(now);
                    tracing::info!(entries = written, "knowledge base synced");
                    return Ok(SyncOutcome::Synced(written));
                }
                Ok(_) => {
                    // An empty sheet is treated as a bad fetch, never as "delete everything"
                    tracing::warn!("knowledge source returned no rows, keeping existing data");
                    *last_sync = Some(now);
                }
                Err(e) => {
                    tracing::error!("failed to fetch knowledge source: {}", e);
                }
            }
        }

        if has_data {
            return Ok(SyncOutcome::KeptExisting);
        }

        let fallback = fallback_entries();
        let mut written = 0;
        for entry in fallback {
            self.store.upsert(entry, EntrySource::Fallback).await?;
            written += 1;
        }
        tracing::info!(entries = written, "loaded fallback knowledge base");
        Ok(SyncOutcome::SeededFallback(written))
    }
}

// ============================================================================
// TESTS
// ============================================================================
