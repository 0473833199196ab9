// Engagement domain models - response categories and the rule tables the
// decider runs on. Pure data, injected at construction.

use chrono::Duration;
use std::fmt;

/// What kind of reply the bot should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCategory {
    /// Look the message up in the knowledge base
    KnowledgeSearch,
    /// Say hello back
    Greeting,
    /// Nudge a quiet chat
    ConversationStarter,
}

impl fmt::Display for ResponseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCategory::KnowledgeSearch => write!(f, "Knowledge Search"),
            ResponseCategory::Greeting => write!(f, "Greeting"),
            ResponseCategory::ConversationStarter => write!(f, "Conversation Starter"),
        }
    }
}

/// One rule's vote: fire `category` with probability `weight` out of 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCandidate {
    pub category: ResponseCategory,
    pub weight: u8,
}

impl ResponseCandidate {
    pub fn new(category: ResponseCategory, weight: u8) -> Self {
        Self {
            category,
            weight: weight.min(100),
        }
    }
}

/// Weight each signal contributes (0-100).
#[derive(Debug, Clone)]
pub struct SignalWeights {
    pub mention: u8,
    pub question: u8,
    pub specific_topic: u8,
    pub domain: u8,
    pub travel: u8,
    pub greeting: u8,
    pub quiet_chat: u8,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            mention: 100,       // Always answer when addressed
            question: 85,
            specific_topic: 80,
            domain: 70,
            travel: 65,
            greeting: 75,
            quiet_chat: 35,
        }
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Rule tables and tuning for the response decider.
#[derive(Debug, Clone)]
pub struct DeciderConfig {
    /// Names and handles that count as addressing the bot
    pub bot_handles: Vec<String>,
    /// Words that make a message a question when it starts with them
    pub interrogatives: Vec<String>,
    pub greetings: Vec<String>,
    /// The country itself
    pub domain_terms: Vec<String>,
    /// Named landmarks, peoples and animals
    pub specific_topics: Vec<String>,
    pub travel_terms: Vec<String>,
    pub weights: SignalWeights,
    /// How long a chat must be silent before a conversation starter is proposed
    pub quiet_threshold: Duration,
}

impl Default for DeciderConfig {
    fn default() -> Self {
        Self {
            bot_handles: owned(&["eva", "eva geises", "@eva", "@evageisesbot"]),
            interrogatives: owned(&[
                "what", "how", "where", "when", "why", "who", "which", "can you", "tell me",
                "explain",
            ]),
            greetings: owned(&[
                "hi",
                "hello",
                "hey",
                "hiya",
                "howdy",
                "greetings",
                "good morning",
                "good afternoon",
                "good evening",
                "morning",
                "hallo",
                "moro",
            ]),
            domain_terms: owned(&["namibia", "namibian", "namibians"]),
            specific_topics: owned(&[
                "etosha",
                "sossusvlei",
                "deadvlei",
                "swakopmund",
                "windhoek",
                "walvis bay",
                "luderitz",
                "lüderitz",
                "fish river",
                "namib desert",
                "kalahari",
                "skeleton coast",
                "damaraland",
                "caprivi",
                "himba",
                "herero",
                "san people",
                "cheetah",
                "cheetahs",
                "elephant",
                "elephants",
                "lion",
                "lions",
                "rhino",
                "rhinos",
                "oryx",
                "safari",
            ]),
            travel_terms: owned(&[
                "travel",
                "travelling",
                "traveling",
                "visit",
                "visiting",
                "trip",
                "vacation",
                "holiday",
                "tour",
                "tourist",
                "tourism",
                "itinerary",
                "road trip",
                "self-drive",
            ]),
            weights: SignalWeights::default(),
            quiet_threshold: Duration::minutes(15),
        }
    }
}
