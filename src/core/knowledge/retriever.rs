// =============================================================================
// KNOWLEDGE RETRIEVER
// =============================================================================
//
// Layered search over a small in-memory corpus:
// 1. Indexed  - entries containing the query (or one of its keywords)
// 2. Fuzzy    - the whole corpus scored by partial similarity
// 3. Synonym  - the query rewritten through the synonym table, re-run 1-2
//
// Each layer is a `MatchStrategy`. The first layer that produces a result at or
// above the threshold wins; later layers are skipped.

use super::fuzzy::{partial_ratio, token_coverage};
use super::knowledge_models::{KnowledgeEntry, SearchResult};
use super::text::{contains_phrase, extract_keywords, is_stop_word, normalize, tokenize, SynonymTable};
use std::cmp::Ordering;
use std::collections::HashSet;

// =============================================================================
// CONFIGURATION
// =============================================================================

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// How many results `search` returns by default
    pub default_limit: usize,
    /// Minimum score a result needs to be returned (0-100)
    pub threshold: f64,
    /// Fixed score given to matches found through a synonym rewrite
    pub synonym_score: f64,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            default_limit: 3,
            threshold: 60.0,
            synonym_score: 75.0,
        }
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// Queries without a keyword need at least this many characters to be
/// searched as a whole.
const MIN_BARE_QUERY_LEN: usize = 4;

/// A query prepared once and shared by every strategy.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    /// Lowercase, whitespace-collapsed query
    pub normalized: String,
    /// Significant tokens (no stop words, longer than two characters)
    pub tokens: Vec<String>,
    /// Tokens joined back together; falls back to `normalized` when every word
    /// was a stop word
    pub focus: String,
}

impl PreparedQuery {
    pub fn new(query: &str) -> Self {
        let normalized = normalize(query);
        let tokens = extract_keywords(&normalized);
        let focus = if tokens.is_empty() {
            normalized.clone()
        } else {
            tokens.join(" ")
        };
        Self {
            normalized,
            tokens,
            focus,
        }
    }

    /// True when there is nothing worth searching for: blank input, or no
    /// keyword and only stop words or a fragment too short to mean anything.
    /// "the" would otherwise be a substring of almost every entry.
    pub fn is_empty(&self) -> bool {
        if self.normalized.is_empty() {
            return true;
        }
        if !self.tokens.is_empty() {
            return false;
        }
        self.normalized.chars().count() < MIN_BARE_QUERY_LEN
            || tokenize(&self.normalized).iter().all(|t| is_stop_word(t))
    }
}

// =============================================================================
// SCORING
// =============================================================================

/// Overlap between query tokens and the entry's tags, 0-100.
///
/// A multi-word tag ("southern africa") counts when it appears as a phrase in
/// the query.
pub fn keyword_score(query: &PreparedQuery, entry: &KnowledgeEntry) -> f64 {
    if query.tokens.is_empty() || entry.keywords.is_empty() {
        return 0.0;
    }

    let tokens: HashSet<&str> = query.tokens.iter().map(String::as_str).collect();
    let mut matched: HashSet<&str> = HashSet::new();
    for keyword in &entry.keywords {
        let keyword = keyword.as_str();
        if tokens.contains(keyword) || contains_phrase(&query.normalized, keyword) {
            matched.insert(keyword);
        }
    }

    let denominator = query.tokens.len().max(entry.keywords.len()) as f64;
    matched.len() as f64 / denominator * 100.0
}

/// Fuzzy similarity between the query and one text field, 0-100.
fn field_score(query: &PreparedQuery, field: &str) -> f64 {
    partial_ratio(&query.focus, field).max(token_coverage(&query.tokens, field))
}

/// Best of the topic, content and keyword scores for one entry, 0-100.
///
/// Anything that fails to produce a finite number scores zero, so one odd
/// entry cannot break the search for the rest.
pub fn score_entry(query: &PreparedQuery, entry: &KnowledgeEntry) -> f64 {
    let topic = field_score(query, &entry.topic);
    let content = field_score(query, &entry.content);
    let keywords = keyword_score(query, entry);

    let best = topic.max(content).max(keywords);
    if best.is_finite() {
        best.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn score_all<'a>(
    query: &PreparedQuery,
    entries: impl Iterator<Item = &'a KnowledgeEntry>,
    threshold: f64,
) -> Vec<SearchResult<'a>> {
    entries
        .map(|entry| SearchResult {
            entry,
            score: score_entry(query, entry),
        })
        .filter(|r| r.score >= threshold)
        .collect()
}

// =============================================================================
// STRATEGIES
// =============================================================================

/// One layer of the search pipeline.
pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Results at or above `threshold`, unsorted.
    fn try_match<'a>(
        &self,
        query: &PreparedQuery,
        corpus: &'a [KnowledgeEntry],
        threshold: f64,
    ) -> Vec<SearchResult<'a>>;
}

/// Cheap, precise path: only entries that literally contain the query or one
/// of its keywords are scored.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedMatch;

impl IndexedMatch {
    fn is_candidate(query: &PreparedQuery, entry: &KnowledgeEntry) -> bool {
        let topic = entry.topic.to_lowercase();
        let content = entry.content.to_lowercase();

        let field_contains = |needle: &str| {
            topic.contains(needle)
                || content.contains(needle)
                || entry.keywords.iter().any(|k| k.contains(needle))
        };

        field_contains(&query.normalized) || query.tokens.iter().any(|t| field_contains(t))
    }
}

impl MatchStrategy for IndexedMatch {
    fn name(&self) -> &'static str {
        "indexed"
    }

    fn try_match<'a>(
        &self,
        query: &PreparedQuery,
        corpus: &'a [KnowledgeEntry],
        threshold: f64,
    ) -> Vec<SearchResult<'a>> {
        let candidates = corpus.iter().filter(|e| Self::is_candidate(query, e));
        score_all(query, candidates, threshold)
    }
}

/// Scores the whole corpus, recovering typos and reordered phrasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyMatch;

impl MatchStrategy for FuzzyMatch {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn try_match<'a>(
        &self,
        query: &PreparedQuery,
        corpus: &'a [KnowledgeEntry],
        threshold: f64,
    ) -> Vec<SearchResult<'a>> {
        score_all(query, corpus.iter(), threshold)
    }
}

/// Rewrites the query through the synonym table and re-runs the direct layers
/// on each rewrite. Hits get a fixed, lower confidence.
#[derive(Debug, Clone)]
pub struct SynonymMatch {
    synonyms: SynonymTable,
    score: f64,
}

impl SynonymMatch {
    pub fn new(synonyms: SynonymTable, score: f64) -> Self {
        Self { synonyms, score }
    }
}

impl MatchStrategy for SynonymMatch {
    fn name(&self) -> &'static str {
        "synonym"
    }

    fn try_match<'a>(
        &self,
        query: &PreparedQuery,
        corpus: &'a [KnowledgeEntry],
        threshold: f64,
    ) -> Vec<SearchResult<'a>> {
        if self.score < threshold {
            return Vec::new();
        }

        let direct: [&dyn MatchStrategy; 2] = [&IndexedMatch, &FuzzyMatch];
        let mut results = Vec::new();

        for expansion in self.synonyms.expansions(&query.normalized) {
            let expanded = PreparedQuery::new(&expansion);
            if expanded.is_empty() {
                continue;
            }
            let hits = direct
                .iter()
                .map(|strategy| strategy.try_match(&expanded, corpus, threshold))
                .find(|hits| !hits.is_empty())
                .unwrap_or_default();

            tracing::trace!(expansion = %expansion, hits = hits.len(), "synonym rewrite");

            results.extend(hits.into_iter().map(|hit| SearchResult {
                entry: hit.entry,
                score: self.score,
            }));
        }

        results
    }
}

// =============================================================================
// RETRIEVER
// =============================================================================

pub struct KnowledgeRetriever {
    strategies: Vec<Box<dyn MatchStrategy>>,
    config: RetrieverConfig,
}

impl Default for KnowledgeRetriever {
    fn default() -> Self {
        Self::new(SynonymTable::default(), RetrieverConfig::default())
    }
}

impl KnowledgeRetriever {
    /// The standard indexed → fuzzy → synonym pipeline.
    pub fn new(synonyms: SynonymTable, config: RetrieverConfig) -> Self {
        let strategies: Vec<Box<dyn MatchStrategy>> = vec![
            Box::new(IndexedMatch),
            Box::new(FuzzyMatch),
            Box::new(SynonymMatch::new(synonyms, config.synonym_score)),
        ];
        Self::with_strategies(strategies, config)
    }

    pub fn with_strategies(strategies: Vec<Box<dyn MatchStrategy>>, config: RetrieverConfig) -> Self {
        Self { strategies, config }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Searches with the configured limit and threshold.
    pub fn search<'a>(&self, query: &str, corpus: &'a [KnowledgeEntry]) -> Vec<SearchResult<'a>> {
        self.search_with(query, corpus, self.config.default_limit, self.config.threshold)
    }

    /// Ranked matches for `query`, best first, at most `limit` of them.
    ///
    /// Never fails: an empty query, an empty corpus or no match all give `[]`.
    pub fn search_with<'a>(
        &self,
        query: &str,
        corpus: &'a [KnowledgeEntry],
        limit: usize,
        threshold: f64,
    ) -> Vec<SearchResult<'a>> {
        let prepared = PreparedQuery::new(query);
        if prepared.is_empty() || corpus.is_empty() || limit == 0 {
            return Vec::new();
        }

        for strategy in &self.strategies {
            let hits = strategy.try_match(&prepared, corpus, threshold);
            if !hits.is_empty() {
                tracing::debug!(
                    strategy = strategy.name(),
                    hits = hits.len(),
                    query = %prepared.normalized,
                    "knowledge match"
                );
                return rank(hits, limit, threshold);
            }
        }

        tracing::debug!(query = %prepared.normalized, "no knowledge match");
        Vec::new()
    }
}

/// Sort best first, drop duplicate content (keeping the best copy), cut to
/// `limit`. Sorting is stable, so equal scores keep corpus order.
fn rank(mut hits: Vec<SearchResult<'_>>, limit: usize, threshold: f64) -> Vec<SearchResult<'_>> {
    hits.retain(|h| h.score >= threshold);
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut seen = HashSet::new();
    hits.retain(|h| seen.insert(normalize(&h.entry.content)));
    hits.truncate(limit);
    hits
}

// =============================================================================
// TESTS
// =============================================================================
