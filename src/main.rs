// Entry point of Eva, the Namibia knowledge bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (SQLite, in-memory, CSV over HTTP)
// - `chat/` = Message handling, reply text and the console transport
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Keep the knowledge base fresh in the background
// 4. Run the transport

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "chat/chat_layer.rs"]
mod chat;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::chat::console::{self, ConsoleConfig};
use crate::chat::{ChatHandler, Data, HandlerConfig};
use crate::core::ai::{AiProvider, AiService};
use crate::core::engagement::{
    ChatActivityStore, DeciderConfig, RandomSource, ResponseDecider, SeededRandom, ThreadRandom,
};
use crate::core::knowledge::{
    KnowledgeRetriever, KnowledgeService, KnowledgeStore, RetrieverConfig, SynonymTable,
};
use crate::core::moderation::{SpamGuard, SpamStore};
use crate::core::usage::{UsageService, UsageStore};
use crate::infra::ai::ChatCompletionsClient;
use crate::infra::knowledge::{HttpCsvSource, SqliteKnowledgeStore};
use crate::infra::moderation::InMemorySpamStore;
use crate::infra::usage::SqliteUsageStore;
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;

/// Reads `key`, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Comma-separated user ids, e.g. "12345, 67890". Invalid items are skipped.
fn parse_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter_map(|id| match id.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!("Ignoring invalid admin id {:?}", id);
                None
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/eva.db".to_string());
    let csv_url = std::env::var("KNOWLEDGE_CSV_URL")
        .ok()
        .filter(|u| !u.trim().is_empty());
    let bot_name = std::env::var("EVA_BOT_NAME").ok();
    let quiet_minutes: i64 = env_or("EVA_QUIET_MINUTES", 15);
    let threshold: f64 = env_or("EVA_SEARCH_THRESHOLD", 60.0);
    let console_private: bool = env_or("EVA_CONSOLE_PRIVATE", false);
    let seed: Option<u64> = std::env::var("EVA_SEED")
        .ok()
        .and_then(|raw| raw.trim().parse().ok());
    let admin_ids = std::env::var("EVA_ADMIN_IDS")
        .map(|raw| parse_ids(&raw))
        .unwrap_or_else(|_| vec![console::CONSOLE_USER_ID]);
    let ai_api_key = std::env::var("EVA_AI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let pool = infra::sqlite::connect(&database_path).await?;
    tracing::info!(database = %database_path, "database ready");

    // Knowledge
    let knowledge_store: Box<dyn KnowledgeStore> =
        Box::new(SqliteKnowledgeStore::new(pool.clone()).await?);
    let retriever = KnowledgeRetriever::new(
        SynonymTable::default(),
        RetrieverConfig {
            threshold,
            ..Default::default()
        },
    );
    let mut knowledge = KnowledgeService::new(knowledge_store, retriever);
    if let Some(url) = csv_url {
        let source = HttpCsvSource::new(url)?;
        knowledge = knowledge.with_source(Box::new(source), chrono::Duration::minutes(10));
    }
    let knowledge = Arc::new(knowledge);

    match knowledge.refresh_if_stale(Utc::now()).await {
        Ok(outcome) => tracing::info!(?outcome, "knowledge base loaded"),
        Err(e) => tracing::error!("Failed to load knowledge base: {}", e),
    }

    // Engagement
    let mut decider_config = DeciderConfig {
        quiet_threshold: chrono::Duration::minutes(quiet_minutes),
        ..Default::default()
    };
    if let Some(name) = bot_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        decider_config.bot_handles.push(name.to_lowercase());
    }
    let rng: Box<dyn RandomSource> = match seed {
        Some(seed) => {
            tracing::info!(seed, "using seeded reply rolls");
            Box::new(SeededRandom::new(seed))
        }
        None => Box::new(ThreadRandom),
    };
    let decider = ResponseDecider::new(decider_config, Arc::new(ChatActivityStore::new()), rng)?;

    // Moderation and usage
    let spam_store: Box<dyn SpamStore> = Box::new(InMemorySpamStore::new());
    let spam = Arc::new(SpamGuard::new(spam_store));
    let usage_store: Box<dyn UsageStore> = Box::new(SqliteUsageStore::new(pool).await?);

    // Generated replies
    let ai = match ai_api_key {
        Some(key) => {
            let client = ChatCompletionsClient::new(key, std::env::var("EVA_AI_API_URL").ok())?;
            let model = std::env::var("EVA_AI_MODEL").unwrap_or_else(|_| "grok-beta".to_string());
            tracing::info!(model = %model, "generated replies enabled");
            let provider: Box<dyn AiProvider> = Box::new(client);
            Some(Arc::new(AiService::new(provider, &model)))
        }
        None => {
            tracing::info!("EVA_AI_API_KEY not set, generated replies disabled");
            None
        }
    };

    let data = Data {
        knowledge: Arc::clone(&knowledge),
        decider: Arc::new(decider),
        spam: Arc::clone(&spam),
        usage: Arc::new(UsageService::new(usage_store)),
        ai,
    };
    let handler_config = HandlerConfig {
        admin_ids,
        ..Default::default()
    };
    let handler = ChatHandler::new(data, handler_config)?;

    // ========================================================================
    // BACKGROUND MAINTENANCE
    // ========================================================================

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let now = Utc::now();

            if let Err(e) = knowledge.refresh_if_stale(now).await {
                tracing::warn!("Knowledge refresh failed: {}", e);
            }
            match spam.prune(now).await {
                Ok(removed) if removed > 0 => tracing::debug!(removed, "pruned flood records"),
                Ok(_) => {}
                Err(e) => tracing::warn!("Flood record prune failed: {}", e),
            }
        }
    });

    // ========================================================================
    // TRANSPORT
    // ========================================================================

    let console_config = ConsoleConfig {
        private: console_private,
        username: std::env::var("USER").unwrap_or_else(|_| "friend".to_string()),
        bot_name: "Eva".to_string(),
    };

    console::run(&handler, &console_config)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("console closed, shutting down");
    Ok(())
}
