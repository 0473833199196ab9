// =============================================================================
// TEXT HELPERS
// =============================================================================
//
// Keyword extraction and the synonym table. Both the retriever and the
// response decider lean on these, so they carry no state of their own.

use std::collections::HashSet;

/// Words that never carry meaning in a query.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "of", "in", "on", "at", "to", "for",
    "and", "or", "but", "it", "its", "this", "that", "these", "those", "with", "about", "from",
    "what", "how", "where", "when", "why", "who", "which", "can", "you", "tell", "me", "explain",
    "describe", "please", "do", "does", "did", "there", "any", "some", "your", "my", "our",
    "i", "we", "they", "them", "has", "have", "had", "will", "would", "should", "could",
];

/// Minimum length (exclusive) for a token to count as a keyword.
const MIN_TOKEN_LEN: usize = 2;

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Splits text on anything that isn't a letter or digit and lowercases it.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Significant words of `text`: lowercase, no stop words, longer than two
/// characters, first occurrence order.
///
/// An all-stop-word input gives an empty list.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() > MIN_TOKEN_LEN && !is_stop_word(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Lowercase and collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns true when `needle` occurs in `haystack` as whole words.
///
/// Both sides are expected to be normalized already.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    find_phrase(haystack, needle).is_some()
}

/// Byte offset of the first whole-word occurrence of `needle` in `haystack`.
pub fn find_phrase(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let begin = start + pos;
        let end = begin + needle.len();
        let before_ok = haystack[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(begin);
        }
        start = begin + haystack[begin..].chars().next().map_or(1, char::len_utf8);
        if start >= haystack.len() {
            break;
        }
    }
    None
}

/// `text` with the whole-word `from` at `at` swapped for `to`.
fn replace_at(text: &str, at: usize, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len() + to.len());
    out.push_str(&text[..at]);
    out.push_str(to);
    out.push_str(&text[at + from.len()..]);
    out
}

// =============================================================================
// SYNONYM TABLE
// =============================================================================

/// Default synonyms for the Namibia corpus. Canonical term first.
const DEFAULT_SYNONYMS: &[(&str, &[&str])] = &[
    ("capital", &["main city", "capital city", "seat of government"]),
    ("currency", &["money", "cash", "exchange rate"]),
    ("language", &["languages", "spoken", "speak", "tongue"]),
    ("weather", &["climate", "temperature", "rain", "season"]),
    ("visit", &["travel", "trip", "tour", "vacation", "holiday"]),
    ("size", &["area", "how big", "square kilometers"]),
    ("people", &["tribe", "tribes", "ethnic group", "culture"]),
    ("desert", &["dunes", "sand", "namib"]),
    ("wildlife", &["animals", "safari", "game drive"]),
    ("elephant", &["elephants", "desert elephant"]),
    ("location", &["where is", "located", "situated"]),
    ("visa", &["entry requirements", "passport"]),
];

/// Maps canonical domain terms to phrases that mean the same thing.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    groups: Vec<(String, Vec<String>)>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_SYNONYMS)
    }
}

impl SynonymTable {
    pub fn new(groups: Vec<(String, Vec<String>)>) -> Self {
        let groups = groups
            .into_iter()
            .map(|(canonical, synonyms)| {
                (
                    normalize(&canonical),
                    synonyms.iter().map(|s| normalize(s)).collect(),
                )
            })
            .collect();
        Self { groups }
    }

    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(canonical, synonyms)| {
                    (
                        canonical.to_string(),
                        synonyms.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    /// Rewrites of `query` obtained by swapping one known phrase for its
    /// counterpart, in both directions. The original query is never included.
    pub fn expansions(&self, query: &str) -> Vec<String> {
        let query = normalize(query);
        let mut out: Vec<String> = Vec::new();
        let mut push = |candidate: String| {
            if candidate != query && !out.contains(&candidate) {
                out.push(candidate);
            }
        };

        for (canonical, synonyms) in &self.groups {
            if let Some(at) = find_phrase(&query, canonical) {
                for synonym in synonyms {
                    push(replace_at(&query, at, canonical, synonym));
                }
            }
            for synonym in synonyms {
                if let Some(at) = find_phrase(&query, synonym) {
                    push(replace_at(&query, at, synonym, canonical));
                }
            }
        }

        out
    }
}
