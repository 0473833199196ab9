// Response decider - should the bot speak up, and how?
//
// Every rule that matches a message adds a weighted candidate. The heaviest
// candidate wins, but only fires if a random roll lands under its weight, so
// the bot answers when addressed and chimes in now and then otherwise.
//
// NO chat-platform dependencies here.

use super::activity_store::ChatActivityStore;
use super::engagement_models::{DeciderConfig, ResponseCandidate, ResponseCategory};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::sync::{Arc, Mutex};

// ============================================================================
// RANDOMNESS (PORT)
// ============================================================================

/// Source of the response roll. Injected so tests can force the outcome.
pub trait RandomSource: Send + Sync {
    /// A number in [0, 100).
    fn roll(&self) -> f64;
}

impl RandomSource for Box<dyn RandomSource> {
    fn roll(&self) -> f64 {
        (**self).roll()
    }
}

/// Rolls with the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn roll(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..100.0)
    }
}

/// Reproducible rolls from a fixed seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn roll(&self) -> f64 {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen_range(0.0..100.0)
    }
}

// ============================================================================
// VOCABULARY MATCHING
// ============================================================================

/// Whole-word, case-insensitive matcher over a list of words and phrases.
#[derive(Debug, Clone)]
struct Vocabulary {
    pattern: Option<Regex>,
}

impl Vocabulary {
    /// Matches any term surrounded by non-word characters or the text edges.
    fn anywhere(terms: &[String]) -> Result<Self, regex::Error> {
        Self::build(terms, r"(?:^|\W)", r"(?:\W|$)")
    }

    /// Matches only when the text starts with one of the terms.
    fn leading(terms: &[String]) -> Result<Self, regex::Error> {
        Self::build(terms, r"^", r"(?:\W|$)")
    }

    fn build(terms: &[String], before: &str, after: &str) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = terms
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .map(|t| regex::escape(&t))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = format!("(?i){}(?:{}){}", before, alternatives.join("|"), after);
        Ok(Self {
            pattern: Some(Regex::new(&pattern)?),
        })
    }

    fn is_match(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ResponseDecider<R: RandomSource = ThreadRandom> {
    config: DeciderConfig,
    activity: Arc<ChatActivityStore>,
    rng: R,
    mentions: Vocabulary,
    interrogatives: Vocabulary,
    specific_topics: Vocabulary,
    domain: Vocabulary,
    travel: Vocabulary,
    greetings: Vocabulary,
}

impl<R: RandomSource> ResponseDecider<R> {
    /// Compiles the rule tables. Only fails if a term produces an invalid
    /// pattern, which escaped input never does in practice.
    pub fn new(
        config: DeciderConfig,
        activity: Arc<ChatActivityStore>,
        rng: R,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            mentions: Vocabulary::anywhere(&config.bot_handles)?,
            interrogatives: Vocabulary::leading(&config.interrogatives)?,
            specific_topics: Vocabulary::anywhere(&config.specific_topics)?,
            domain: Vocabulary::anywhere(&config.domain_terms)?,
            travel: Vocabulary::anywhere(&config.travel_terms)?,
            greetings: Vocabulary::anywhere(&config.greetings)?,
            config,
            activity,
            rng,
        })
    }

    pub fn config(&self) -> &DeciderConfig {
        &self.config
    }

    pub fn activity(&self) -> &Arc<ChatActivityStore> {
        &self.activity
    }

    /// Candidates for `message`, in rule order. Reads chat activity but never
    /// changes it.
    ///
    /// Rule order doubles as the tie-break: mention, question, specific topic,
    /// country, travel, greeting, quiet chat.
    pub fn candidates(
        &self,
        message: &str,
        chat_id: i64,
        now: DateTime<Utc>,
    ) -> Vec<ResponseCandidate> {
        let text = message.trim().to_lowercase();
        if text.is_empty() {
            return Vec::new();
        }

        let weights = &self.config.weights;
        let mut candidates = Vec::new();
        let mut add = |matched: bool, category: ResponseCategory, weight: u8| {
            if matched {
                candidates.push(ResponseCandidate::new(category, weight));
            }
        };

        use ResponseCategory::*;
        add(self.mentions.is_match(&text), KnowledgeSearch, weights.mention);
        add(
            text.contains('?') || self.interrogatives.is_match(&text),
            KnowledgeSearch,
            weights.question,
        );
        add(
            self.specific_topics.is_match(&text),
            KnowledgeSearch,
            weights.specific_topic,
        );
        add(self.domain.is_match(&text), KnowledgeSearch, weights.domain);
        add(self.travel.is_match(&text), KnowledgeSearch, weights.travel);
        add(self.greetings.is_match(&text), Greeting, weights.greeting);
        add(
            self.activity
                .is_quiet(chat_id, now, self.config.quiet_threshold),
            ConversationStarter,
            weights.quiet_chat,
        );

        candidates
    }

    /// Decide whether to answer `message` in `chat_id`, and how.
    ///
    /// Records the message as chat activity. Returns `None` for empty input,
    /// when no rule matched, or when the roll misses.
    pub fn decide(
        &self,
        message: &str,
        chat_id: i64,
        now: DateTime<Utc>,
    ) -> Option<ResponseCategory> {
        let mut candidates = self.candidates(message, chat_id, now);
        self.activity.touch(chat_id, now);

        // Stable: equal weights keep rule order
        candidates.sort_by(|a, b| b.weight.cmp(&a.weight));
        let top = candidates.first()?;

        let roll = self.rng.roll();
        let fires = roll < f64::from(top.weight);

        tracing::debug!(
            chat_id,
            candidates = candidates.len(),
            top = %top.category,
            weight = top.weight,
            roll,
            fires,
            "response decision"
        );

        fires.then_some(top.category)
    }

    /// Decision for a one-to-one conversation, where the bot is always being
    /// addressed: no roll, a bare greeting gets a greeting and everything else
    /// is looked up. Records the message as chat activity.
    pub fn decide_direct(
        &self,
        message: &str,
        chat_id: i64,
        now: DateTime<Utc>,
    ) -> ResponseCategory {
        let candidates = self.candidates(message, chat_id, now);
        self.activity.touch(chat_id, now);

        let greeting_only = !candidates.is_empty()
            && candidates
                .iter()
                .all(|c| c.category != ResponseCategory::KnowledgeSearch)
            && candidates.iter().any(|c| c.category == ResponseCategory::Greeting);

        if greeting_only {
            ResponseCategory::Greeting
        } else {
            ResponseCategory::KnowledgeSearch
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
