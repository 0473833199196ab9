// Reply text. Everything the bot says lives here so the handler only
// decides *which* reply to send.

use super::commands::{ADD_USAGE, DELETE_USAGE, EDIT_USAGE, SPAM_USAGE};
use crate::core::knowledge::{KnowledgeEntry, RankedEntry};
use crate::core::moderation::{SpamCheck, SpamConfig};
use crate::core::usage::{PopularQuery, UserStats};
use rand::seq::SliceRandom;
use rand::Rng;

/// Questions offered when nothing matched.
const SUGGESTIONS: [&str; 5] = [
    "Where is Namibia located?",
    "What is the capital of Namibia?",
    "When is the best time to visit?",
    "Tell me about Etosha National Park",
    "Who are the Himba people?",
];

const GREETINGS: [&str; 4] = [
    "👋 Hello {name}! I'm Eva, your Namibia guide. Ask me anything about Namibia! 🇳🇦",
    "Hi {name}! Great to see you. Curious about Etosha, the dunes or the people of Namibia? Just ask! 🦁",
    "Hey {name}! 🌅 I know a lot about Namibia, from wildlife safaris to culture. What would you like to know?",
    "Hello {name}! ✨ Eva here. Ask me about places, wildlife or travel tips for Namibia.",
];

const MORNING_EARLY: [&str; 3] = [
    "🌅 Rise and shine, Namibia lovers! What's everyone up to today?",
    "☀️ Early morning vibes! Anyone planning a Namibia adventure?",
    "🌄 Good morning, everyone! What about Namibia interests you most?",
];

const MORNING: [&str; 3] = [
    "☕ Good morning, Namibia enthusiasts! What brings you here today?",
    "🌞 Morning everyone! Ready to learn something amazing about Namibia?",
    "👋 Good morning! Ask me anything about Namibia! 🇳🇦",
];

const AFTERNOON: [&str; 3] = [
    "🌤️ Good afternoon, everyone! What Namibia topic shall we explore?",
    "☀️ Afternoon vibes! Anyone curious about Namibia's wildlife?",
    "👋 Good afternoon! I'm here to answer Namibia questions! 🇳🇦",
];

const EVENING: [&str; 3] = [
    "🌆 Good evening, Namibia fans! How's everyone doing?",
    "🌅 Evening everyone! Perfect time to learn about Namibia!",
    "👋 Good evening! Ready for some Namibia facts? 🇳🇦",
];

const NIGHT: [&str; 3] = [
    "🌙 Hello, night owls! What Namibia topic interests you?",
    "✨ Hello everyone! I'm here if you need Namibia info! 🇳🇦",
    "🌟 Evening, travelers! Ask me about Namibia anytime!",
];

const ENGAGEMENT_PROMPTS: [&str; 6] = [
    "💭 Quick poll: what's the first thing you'd do in Namibia?\n\nA) Safari at Etosha 🦁\nB) Climb the Sossusvlei dunes 🏜️\nC) Explore Swakopmund 🏖️\nD) Meet the Himba people 👥",
    "🎯 Discussion time: which Namibia destination surprises you most? Share your thoughts!",
    "🌟 Did you know? Namibia has the world's oldest desert! What else would you like to know?",
    "🦁 Wildlife question: ever seen desert-adapted elephants? They're incredible! Ask me about them.",
    "🏜️ Fun fact: the Sossusvlei dunes reach up to 380 meters high! What else interests you about Namibia?",
    "👥 Cultural curiosity: the Himba people use red ochre as cosmetics! Want more cultural insights?",
];

fn pick<'a, R: Rng + ?Sized>(options: &[&'a str], rng: &mut R) -> &'a str {
    options.choose(rng).copied().unwrap_or(options[0])
}

/// A knowledge answer: topic, content, category and tags.
pub fn format_answer(entry: &KnowledgeEntry) -> String {
    let mut response = format!("🇳🇦 *{}*\n\n{}\n\n", entry.topic, entry.content);
    response.push_str(&format!("📁 *Category:* {}\n", entry.category));

    if !entry.keywords.is_empty() {
        response.push_str(&format!("🏷️ *Tags:* {}\n", entry.keywords.join(", ")));
    }

    response.push_str("\n💡 *Want to know more?* Ask me another question!");
    response
}

/// Reply for a question nothing in the knowledge base matched.
pub fn not_found(question: &str) -> String {
    let mut response = format!("🤔 *I'm not sure about:* \"{}\"\n\n*Try asking:*\n", question.trim());
    for suggestion in SUGGESTIONS {
        response.push_str(&format!("• {}\n", suggestion));
    }
    response
}

/// Reply to someone saying hello.
pub fn greeting<R: Rng + ?Sized>(name: &str, rng: &mut R) -> String {
    pick(&GREETINGS, rng).replace("{name}", name)
}

/// A chat-wide greeting suited to the hour (0-23, local to the bot).
pub fn time_of_day_greeting<R: Rng + ?Sized>(hour: u32, rng: &mut R) -> String {
    let options: &[&str] = match hour {
        5..=7 => &MORNING_EARLY,
        8..=11 => &MORNING,
        12..=16 => &AFTERNOON,
        17..=20 => &EVENING,
        _ => &NIGHT,
    };
    pick(options, rng).to_string()
}

/// Something to get a quiet chat talking again.
pub fn engagement_prompt<R: Rng + ?Sized>(rng: &mut R) -> String {
    pick(&ENGAGEMENT_PROMPTS, rng).to_string()
}

/// Escalating flood warning. Levels above 3 reuse the final warning.
pub fn spam_warning(check: &SpamCheck, name: &str) -> String {
    match check.severity() {
        1 => format!(
            "⚠️ Hey {}, please slow down a bit! Let's keep the chat comfortable for everyone. 😊",
            name
        ),
        2 => format!(
            "🛑 {}, that's quite a lot of messages! Please give others a chance to chat. 🙏",
            name
        ),
        _ => format!(
            "❌ {}, please stop spamming. This is your final warning. ⛔",
            name
        ),
    }
}

// ----------------------------------------------------------------------------
// Command replies
// ----------------------------------------------------------------------------

pub fn welcome(name: &str) -> String {
    format!(
        "🇳🇦 *Welcome, {}!*\n\nI'm Eva, your guide to Namibia. Ask me about places, wildlife, \
culture or travel tips, or try /menu to browse.\n\nType /help for everything I can do.",
        name
    )
}

pub fn help() -> String {
    let lines = [
        "🤖 *Eva commands*",
        "",
        "/menu - browse categories",
        "/category <name> - topics in a category",
        "/topics - every topic I know",
        "/search <question> - best matches with scores",
        "/about - about me",
        "/stats - popular questions and your activity",
        "",
        "*Admins:*",
        ADD_USAGE,
        EDIT_USAGE,
        DELETE_USAGE,
        SPAM_USAGE,
        "",
        "Or just ask a question! 💬",
    ];
    lines.join("\n")
}

pub fn about(entry_count: usize, categories: &[String]) -> String {
    format!(
        "🇳🇦 *About Eva*\n\nI answer questions about Namibia from a knowledge base of {} entries \
across {} categories.\n\nAsk me anything, or use /menu to browse.",
        entry_count,
        categories.len()
    )
}

pub fn menu(categories: &[String]) -> String {
    if categories.is_empty() {
        return "📭 The knowledge base is empty right now. Please try again later.".to_string();
    }
    let mut response = "📚 *Categories*\n\n".to_string();
    for category in categories {
        response.push_str(&format!("• {}\n", category));
    }
    response.push_str("\nUse /category <name> to see the topics in one.");
    response
}

pub fn category_listing(category: &str, entries: &[KnowledgeEntry]) -> String {
    if entries.is_empty() {
        return format!("🤔 No topics in \"{}\". Try /menu for the list.", category.trim());
    }
    let mut response = format!("📁 *{}*\n\n", entries[0].category);
    for entry in entries {
        response.push_str(&format!("• {}\n", entry.topic));
    }
    response
}

pub fn topic_list(topics: &[String]) -> String {
    if topics.is_empty() {
        return "📭 No topics yet.".to_string();
    }
    let mut response = format!("📖 *{} topics*\n\n", topics.len());
    for topic in topics {
        response.push_str(&format!("• {}\n", topic));
    }
    response
}

pub fn search_results(query: &str, results: &[RankedEntry]) -> String {
    if results.is_empty() {
        return not_found(query);
    }
    let mut response = format!("🔎 *Results for:* \"{}\"\n\n", query.trim());
    for hit in results {
        response.push_str(&format!(
            "• *{}* ({}) [#{}, score {:.0}]\n",
            hit.entry.topic, hit.entry.category, hit.entry.id, hit.score
        ));
    }
    response
}

pub fn stats(total_queries: u64, popular: &[PopularQuery], user: &UserStats) -> String {
    let mut response = format!("📊 *Stats*\n\nQuestions answered: {}\n", total_queries);
    if !popular.is_empty() {
        response.push_str("\n*Popular questions:*\n");
        for (rank, query) in popular.iter().enumerate() {
            response.push_str(&format!("{}. {} ({})\n", rank + 1, query.query, query.count));
        }
    }
    response.push_str(&format!("\n*You* have asked {} questions", user.query_count));
    if let Some(joined) = user.joined_at {
        response.push_str(&format!(" since {}", joined.format("%Y-%m-%d")));
    }
    response.push('.');
    response
}

pub fn admin_only() -> String {
    "⛔ Sorry, only admins can do that.".to_string()
}

pub fn usage(line: &str) -> String {
    format!("ℹ️ Usage: {}", line)
}

pub fn entry_added(id: i64, topic: &str) -> String {
    format!("✅ Saved \"{}\" as #{}.", topic, id)
}

pub fn entry_updated(id: i64) -> String {
    format!("✅ Updated #{}.", id)
}

pub fn entry_deleted(id: i64) -> String {
    format!("🗑️ Deleted #{}.", id)
}

pub fn entry_missing(id: i64) -> String {
    format!("🤔 There is no entry #{}.", id)
}

pub fn entry_duplicate(topic: &str, category: &str) -> String {
    format!("⚠️ \"{}\" already exists in {}.", topic, category)
}

pub fn spam_status(config: &SpamConfig, warnings: u32) -> String {
    let state = if config.enabled { "on" } else { "off" };
    format!(
        "🛡️ *Flood guard:* {}\nLimit: {} messages per {} s\nYour warnings: {}",
        state, config.max_messages_per_window, config.window_secs, warnings
    )
}

pub fn spam_toggled(enabled: bool) -> String {
    if enabled {
        "🛡️ Flood guard is on.".to_string()
    } else {
        "🔕 Flood guard is off.".to_string()
    }
}

pub fn spam_limit_set(config: &SpamConfig) -> String {
    format!(
        "🛡️ Limit set to {} messages per {} s.",
        config.max_messages_per_window, config.window_secs
    )
}

pub fn warnings_cleared(user_id: i64) -> String {
    format!("✅ Cleared warnings for user {}.", user_id)
}
