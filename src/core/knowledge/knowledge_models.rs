// Knowledge domain models - pure data, no SQLite or chat types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a knowledge entry came from.
///
/// CSV rows are replaced wholesale on every sync, so the source decides which
/// rows a sync is allowed to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Csv,
    Fallback,
    Manual,
}

impl EntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySource::Csv => "csv",
            EntrySource::Fallback => "fallback",
            EntrySource::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "csv" => EntrySource::Csv,
            "fallback" => EntrySource::Fallback,
            _ => EntrySource::Manual,
        }
    }
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answerable fact in the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeEntry {
    pub id: i64,
    /// Short title, unique together with `category`
    pub topic: String,
    /// The answer text
    pub content: String,
    /// Grouping label such as "Tourism" or "Wildlife"
    pub category: String,
    /// Lowercase free-text tags
    pub keywords: Vec<String>,
    pub source: EntrySource,
}

/// Data needed to create (or overwrite) an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewKnowledgeEntry {
    pub topic: String,
    pub content: String,
    pub category: String,
    pub keywords: Vec<String>,
}

impl NewKnowledgeEntry {
    #[cfg(test)]
    pub fn new(topic: &str, content: &str, category: &str, keywords: &[&str]) -> Self {
        Self {
            topic: topic.trim().to_string(),
            content: content.trim().to_string(),
            category: category.trim().to_string(),
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Builds an entry from free-text fields, with `keywords` as a
    /// comma-separated list. A blank category becomes "General".
    pub fn from_fields(topic: &str, content: &str, category: &str, keywords: &str) -> Self {
        let category = match category.trim() {
            "" => "General",
            c => c,
        };
        Self {
            topic: topic.trim().to_string(),
            content: content.trim().to_string(),
            category: category.to_string(),
            keywords: Self::parse_keywords(keywords),
        }
    }

    /// Splits a comma-separated tag list the way the CSV feed and admin input
    /// write them ("windhoek, capital, city").
    pub fn parse_keywords(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// Partial edit of an existing entry. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeUpdate {
    pub topic: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub keywords: Option<Vec<String>>,
}

impl KnowledgeUpdate {
    pub fn is_empty(&self) -> bool {
        self.topic.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.keywords.is_none()
    }

    pub fn apply_to(&self, entry: &mut KnowledgeEntry) {
        if let Some(topic) = &self.topic {
            entry.topic = topic.clone();
        }
        if let Some(content) = &self.content {
            entry.content = content.clone();
        }
        if let Some(category) = &self.category {
            entry.category = category.clone();
        }
        if let Some(keywords) = &self.keywords {
            entry.keywords = keywords.clone();
        }
    }
}

/// A scored view into the corpus. Built per query and thrown away afterwards.
#[derive(Debug, Clone, Copy)]
pub struct SearchResult<'a> {
    pub entry: &'a KnowledgeEntry,
    /// Confidence in [0, 100]; only meaningful for ranking
    pub score: f64,
}

/// Owned form of [`SearchResult`], for handing results past the corpus lifetime.
#[derive(Debug, Clone)]
pub struct RankedEntry {
    pub entry: KnowledgeEntry,
    pub score: f64,
}

impl From<SearchResult<'_>> for RankedEntry {
    fn from(result: SearchResult<'_>) -> Self {
        Self {
            entry: result.entry.clone(),
            score: result.score,
        }
    }
}
