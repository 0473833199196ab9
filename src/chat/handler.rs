// Message handler - turns one inbound chat message into at most one reply.
//
// Transport-agnostic: a transport builds an `IncomingMessage`, hands over a
// `MessageSender`, and the handler does the rest.

use super::commands::{self, Command, ParseError, SpamCommand, ADD_USAGE};
use super::replies;
use crate::core::ai::{AiProvider, AiService, CONTEXT_ENTRIES};
use crate::core::engagement::{RandomSource, ResponseCategory, ResponseDecider};
use crate::core::knowledge::{KnowledgeError, KnowledgeService, KnowledgeStore};
use crate::core::moderation::{SpamCheck, SpamGuard, SpamStore, MAX_WARNING_LEVEL};
use crate::core::usage::{UsageService, UsageStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use regex::Regex;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// How many popular queries `/stats` lists.
const STATS_POPULAR: usize = 5;

/// How many matches `/search` lists.
const SEARCH_RESULTS: usize = 3;

/// A text message as the transport saw it.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub message_id: Option<i64>,
    pub user_id: i64,
    pub username: Option<String>,
    pub text: String,
    /// One-to-one conversation with the bot
    pub is_private: bool,
    pub timestamp: DateTime<Utc>,
}

impl IncomingMessage {
    /// Name to address the sender by.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("friend")
    }
}

/// Outbound side of a transport.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<(), Error>;
}

/// Services shared by every message.
pub struct Data {
    pub knowledge: Arc<KnowledgeService<Box<dyn KnowledgeStore>>>,
    pub decider: Arc<ResponseDecider<Box<dyn RandomSource>>>,
    pub spam: Arc<SpamGuard<Box<dyn SpamStore>>>,
    pub usage: Arc<UsageService<Box<dyn UsageStore>>>,
    /// Generated replies; `None` when no API key is configured
    pub ai: Option<Arc<AiService<Box<dyn AiProvider>>>>,
}

#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Minimum gap between time-of-day greetings in one chat
    pub greeting_interval: Duration,
    /// Offset used to pick morning/afternoon/evening wording
    pub utc_offset_secs: i64,
    /// Users allowed to edit the knowledge base and the flood guard
    pub admin_ids: Vec<i64>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            greeting_interval: Duration::hours(2),
            utc_offset_secs: 2 * 3600, // Central Africa Time
            admin_ids: Vec::new(),
        }
    }
}

pub struct ChatHandler {
    data: Data,
    config: HandlerConfig,
    /// Strips "eva," and friends from the front of questions
    handles: Option<Regex>,
}

impl ChatHandler {
    pub fn new(data: Data, config: HandlerConfig) -> Result<Self, regex::Error> {
        let mut handles: Vec<String> = data
            .decider
            .config()
            .bot_handles
            .iter()
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        // Longest first so "eva geises" wins over "eva"
        handles.sort_by_key(|h| std::cmp::Reverse(h.len()));

        let handles = if handles.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = handles.iter().map(|h| regex::escape(h)).collect();
            Some(Regex::new(&format!(
                r"(?i)(?:^|\s)(?:{})\b[,:!]?",
                alternatives.join("|")
            ))?)
        };

        Ok(Self {
            data,
            config,
            handles,
        })
    }

    /// Removes bot handles so they don't pollute the search query.
    fn strip_handles(&self, text: &str) -> String {
        let stripped = match &self.handles {
            Some(re) => re.replace_all(text, " ").into_owned(),
            None => text.to_string(),
        };
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn is_admin(&self, user_id: i64) -> bool {
        self.config.admin_ids.contains(&user_id)
    }

    /// Handle one message. Returns the reply that was sent, if any.
    pub async fn handle_message(
        &self,
        msg: &IncomingMessage,
        sender: &dyn MessageSender,
    ) -> Result<Option<String>, Error> {
        let text = msg.text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let command = match commands::parse(text) {
            // Meant for another bot
            Some(Err(ParseError::Unknown(name))) => {
                tracing::debug!(command = %name, "ignoring unknown command");
                return Ok(None);
            }
            other => other,
        };

        if let Err(e) = self
            .data
            .usage
            .record_user(msg.user_id, msg.username.as_deref(), msg.timestamp)
            .await
        {
            tracing::warn!(user_id = msg.user_id, "failed to record user: {}", e);
        }

        let check = match self
            .data
            .spam
            .check_message(msg.user_id, msg.chat_id, msg.timestamp)
            .await
        {
            Ok(check) => check,
            Err(e) => {
                tracing::warn!(chat_id = msg.chat_id, "spam check failed: {}", e);
                SpamCheck::ok()
            }
        };

        if check.is_spam {
            // Past the final warning the bot goes quiet instead of flooding back
            if check.warning_level > MAX_WARNING_LEVEL {
                return Ok(None);
            }
            let reply = replies::spam_warning(&check, msg.display_name());
            sender.send(msg.chat_id, msg.message_id, &reply).await?;
            return Ok(Some(reply));
        }

        if let Some(parsed) = command {
            let reply = match parsed {
                Ok(command) => self.run_command(msg, command).await?,
                Err(ParseError::Usage(line)) => replies::usage(line),
                Err(ParseError::Unknown(_)) => return Ok(None),
            };
            sender.send(msg.chat_id, msg.message_id, &reply).await?;
            return Ok(Some(reply));
        }

        let category = if msg.is_private {
            Some(
                self.data
                    .decider
                    .decide_direct(text, msg.chat_id, msg.timestamp),
            )
        } else {
            self.data.decider.decide(text, msg.chat_id, msg.timestamp)
        };

        let Some(category) = category else {
            return Ok(None);
        };

        let reply = match category {
            ResponseCategory::KnowledgeSearch => self.answer(msg, text).await?,
            ResponseCategory::Greeting => self.greeting(msg),
            ResponseCategory::ConversationStarter => self.conversation_starter(msg).await,
        };

        sender.send(msg.chat_id, msg.message_id, &reply).await?;
        tracing::info!(chat_id = msg.chat_id, category = %category, "replied");

        Ok(Some(reply))
    }

    async fn run_command(&self, msg: &IncomingMessage, command: Command) -> Result<String, Error> {
        if command.requires_admin() && !self.is_admin(msg.user_id) {
            tracing::warn!(user_id = msg.user_id, ?command, "admin command refused");
            return Ok(replies::admin_only());
        }

        let knowledge = &self.data.knowledge;
        let reply = match command {
            Command::Start => replies::welcome(msg.display_name()),
            Command::Help => replies::help(),
            Command::About => {
                let count = knowledge.count().await?;
                replies::about(count, &knowledge.categories().await?)
            }
            Command::Menu => replies::menu(&knowledge.categories().await?),
            Command::Category(name) => {
                replies::category_listing(&name, &knowledge.by_category(&name).await?)
            }
            Command::Topics => replies::topic_list(&knowledge.topics().await?),
            Command::Search(query) => {
                let query = self.strip_handles(&query);
                replies::search_results(&query, &knowledge.search(&query, SEARCH_RESULTS).await?)
            }
            Command::Stats => {
                let usage = &self.data.usage;
                replies::stats(
                    usage.total_queries().await?,
                    &usage.popular_queries(STATS_POPULAR).await?,
                    &usage.user_stats(msg.user_id).await?,
                )
            }
            Command::Add(entry) => {
                let topic = entry.topic.clone();
                match knowledge.add_knowledge(entry).await {
                    Ok(id) => replies::entry_added(id, &topic),
                    Err(KnowledgeError::InvalidEntry) => replies::usage(ADD_USAGE),
                    Err(e) => return Err(e.into()),
                }
            }
            Command::Edit { id, update } => match knowledge.update_knowledge(id, update).await {
                Ok(()) => replies::entry_updated(id),
                Err(KnowledgeError::NotFound(id)) => replies::entry_missing(id),
                Err(KnowledgeError::Duplicate { topic, category }) => {
                    replies::entry_duplicate(&topic, &category)
                }
                Err(e) => return Err(e.into()),
            },
            Command::Delete(id) => match knowledge.delete_knowledge(id).await {
                Ok(()) => replies::entry_deleted(id),
                Err(KnowledgeError::NotFound(id)) => replies::entry_missing(id),
                Err(e) => return Err(e.into()),
            },
            Command::Spam(spam) => self.run_spam_command(msg, spam).await?,
        };

        tracing::info!(chat_id = msg.chat_id, user_id = msg.user_id, "command handled");
        Ok(reply)
    }

    async fn run_spam_command(
        &self,
        msg: &IncomingMessage,
        command: SpamCommand,
    ) -> Result<String, Error> {
        let spam = &self.data.spam;
        let reply = match command {
            SpamCommand::Status => {
                let config = spam.get_config(msg.chat_id).await?;
                let warnings = spam.user_warnings(msg.user_id, msg.chat_id).await?;
                replies::spam_status(&config, warnings)
            }
            SpamCommand::Enable(enabled) => {
                spam.set_enabled(msg.chat_id, enabled).await?;
                replies::spam_toggled(enabled)
            }
            SpamCommand::Limit {
                max_messages,
                window_secs,
            } => {
                let mut config = spam.get_config(msg.chat_id).await?;
                config.max_messages_per_window = max_messages;
                config.window_secs = window_secs;
                spam.set_config(msg.chat_id, config.clone()).await?;
                replies::spam_limit_set(&config)
            }
            SpamCommand::Reset(user_id) => {
                spam.clear_user_warnings(user_id, msg.chat_id).await?;
                replies::warnings_cleared(user_id)
            }
        };
        Ok(reply)
    }

    async fn answer(&self, msg: &IncomingMessage, text: &str) -> Result<String, Error> {
        let question = self.strip_handles(text);

        if let Err(e) = self
            .data
            .usage
            .log_query(msg.user_id, &question, msg.timestamp)
            .await
        {
            tracing::warn!(user_id = msg.user_id, "failed to log query: {}", e);
        }

        if let Some(hit) = self.data.knowledge.find_answer(&question).await? {
            tracing::debug!(topic = %hit.entry.topic, score = hit.score, "answer found");
            return Ok(replies::format_answer(&hit.entry));
        }

        match self.generated_answer(&question).await {
            Some(reply) => Ok(reply),
            None => Ok(replies::not_found(&question)),
        }
    }

    /// Asks the model, grounded on loosely related entries. `None` when no
    /// model is configured or the call fails.
    async fn generated_answer(&self, question: &str) -> Option<String> {
        let ai = self.data.ai.as_ref()?;

        let context = match self
            .data
            .knowledge
            .related(question, CONTEXT_ENTRIES)
            .await
        {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!("failed to load context for generated answer: {}", e);
                Vec::new()
            }
        };

        match ai.chat(question, &context).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("generated answer failed: {}", e);
                None
            }
        }
    }

    fn greeting(&self, msg: &IncomingMessage) -> String {
        replies::greeting(msg.display_name(), &mut rand::thread_rng())
    }

    /// Time-of-day greeting at most once per interval, otherwise a generated
    /// starter or a canned prompt.
    async fn conversation_starter(&self, msg: &IncomingMessage) -> String {
        let activity = self.data.decider.activity();

        if activity.should_greet(msg.chat_id, msg.timestamp, self.config.greeting_interval) {
            let local = msg.timestamp + Duration::seconds(self.config.utc_offset_secs);
            return replies::time_of_day_greeting(local.hour(), &mut rand::thread_rng());
        }

        if let Some(ai) = &self.data.ai {
            match ai.conversation_starter().await {
                Ok(Some(starter)) => return starter,
                Ok(None) => {}
                Err(e) => tracing::warn!("generated conversation starter failed: {}", e),
            }
        }

        replies::engagement_prompt(&mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::{AiConfig, AiError, AiMessage};
    use crate::core::engagement::{ChatActivityStore, DeciderConfig};
    use crate::core::knowledge::KnowledgeRetriever;
    use crate::infra::knowledge::InMemoryKnowledgeStore;
    use crate::infra::moderation::InMemorySpamStore;
    use crate::infra::usage::InMemoryUsageStore;
    use std::sync::Mutex;

    struct FixedRoll(f64);

    impl RandomSource for FixedRoll {
        fn roll(&self) -> f64 {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(i64, Option<i64>, String)>>,
    }

    impl RecordingSender {
        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<(), Error> {
            self.sent
                .lock()
                .unwrap()
                .push((chat_id, reply_to, text.to_string()));
            Ok(())
        }
    }

    const ADMIN_ID: i64 = 1;

    /// Answers every request with the same result.
    struct StubAi(Result<String, String>);

    #[async_trait]
    impl AiProvider for StubAi {
        async fn chat_complete(
            &self,
            _messages: &[AiMessage],
            _config: &AiConfig,
        ) -> Result<String, AiError> {
            self.0.clone().map_err(Into::into)
        }
    }

    async fn handler(roll: f64) -> ChatHandler {
        handler_with_ai(roll, None).await
    }

    async fn handler_with_ai(roll: f64, ai: Option<StubAi>) -> ChatHandler {
        let store: Box<dyn KnowledgeStore> = Box::new(InMemoryKnowledgeStore::new());
        let knowledge = KnowledgeService::new(store, KnowledgeRetriever::default());
        knowledge.refresh_if_stale(Utc::now()).await.unwrap();

        let rng: Box<dyn RandomSource> = Box::new(FixedRoll(roll));
        let decider = ResponseDecider::new(
            DeciderConfig::default(),
            Arc::new(ChatActivityStore::new()),
            rng,
        )
        .unwrap();

        let spam_store: Box<dyn SpamStore> = Box::new(InMemorySpamStore::new());
        let usage_store: Box<dyn UsageStore> = Box::new(InMemoryUsageStore::new());

        let data = Data {
            knowledge: Arc::new(knowledge),
            decider: Arc::new(decider),
            spam: Arc::new(SpamGuard::new(spam_store)),
            usage: Arc::new(UsageService::new(usage_store)),
            ai: ai.map(|stub| {
                let provider: Box<dyn AiProvider> = Box::new(stub);
                Arc::new(AiService::new(provider, "test-model"))
            }),
        };
        let config = HandlerConfig {
            admin_ids: vec![ADMIN_ID],
            ..Default::default()
        };
        ChatHandler::new(data, config).unwrap()
    }

    fn message(chat_id: i64, text: &str, is_private: bool) -> IncomingMessage {
        IncomingMessage {
            chat_id,
            message_id: Some(10),
            user_id: 77,
            username: Some("Ndapewa".to_string()),
            text: text.to_string(),
            is_private,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_private_question_answered() {
        let handler = handler(99.9).await;
        let sender = RecordingSender::default();

        let reply = handler
            .handle_message(&message(1, "What is the capital of Namibia?", true), &sender)
            .await
            .unwrap()
            .expect("private questions always get a reply");

        assert!(reply.contains("Capital of Namibia"));
        assert!(reply.contains("Windhoek"));
        assert_eq!(sender.count(), 1);
        assert_eq!(sender.sent.lock().unwrap()[0].1, Some(10));
        assert_eq!(handler.data.usage.total_queries().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_start_replies_and_blank_or_foreign_commands_ignored() {
        let handler = handler(0.0).await;
        let sender = RecordingSender::default();

        let welcome = handler
            .handle_message(&message(1, "/start", false), &sender)
            .await
            .unwrap()
            .expect("/start always replies");
        assert!(welcome.contains("Welcome, Ndapewa"));

        assert!(handler
            .handle_message(&message(1, "   ", false), &sender)
            .await
            .unwrap()
            .is_none());
        assert!(handler
            .handle_message(&message(1, "/ban@other_bot", false), &sender)
            .await
            .unwrap()
            .is_none());
        assert_eq!(sender.count(), 1);
    }

    #[tokio::test]
    async fn test_browse_commands() {
        let handler = handler(0.0).await;
        let sender = RecordingSender::default();

        let menu = handler
            .handle_message(&message(1, "/menu", false), &sender)
            .await
            .unwrap()
            .unwrap();
        assert!(menu.contains("Categories"));

        let topics = handler
            .handle_message(&message(1, "/topics", false), &sender)
            .await
            .unwrap()
            .unwrap();
        assert!(topics.contains("Capital of Namibia"));

        let usage = handler
            .handle_message(&message(1, "/category", false), &sender)
            .await
            .unwrap()
            .unwrap();
        assert!(usage.contains("Usage: /category <name>"));
    }

    #[tokio::test]
    async fn test_stats_counts_questions() {
        let handler = handler(99.9).await;
        let sender = RecordingSender::default();
        handler
            .handle_message(&message(1, "What is the capital of Namibia?", true), &sender)
            .await
            .unwrap();

        let stats = handler
            .handle_message(&message(1, "/stats", true), &sender)
            .await
            .unwrap()
            .unwrap();

        assert!(stats.contains("Questions answered: 1"));
        assert!(stats.contains("what is the capital of namibia? (1)"));
        assert!(stats.contains("asked 1 questions"));
    }

    #[tokio::test]
    async fn test_admin_commands_need_an_admin() {
        let handler = handler(0.0).await;
        let sender = RecordingSender::default();
        let add = "/add Kolmanskop | Tourism | A diamond ghost town near Luderitz. | ghost town";

        let refused = handler
            .handle_message(&message(1, add, true), &sender)
            .await
            .unwrap()
            .unwrap();
        assert!(refused.contains("only admins"));
        let before = handler.data.knowledge.count().await.unwrap();

        let mut msg = message(1, add, true);
        msg.user_id = ADMIN_ID;
        let saved = handler.handle_message(&msg, &sender).await.unwrap().unwrap();

        assert!(saved.contains("Saved \"Kolmanskop\""));
        assert_eq!(handler.data.knowledge.count().await.unwrap(), before + 1);
        let topics = handler.data.knowledge.topics().await.unwrap();
        assert!(topics.contains(&"Kolmanskop".to_string()));
    }

    #[tokio::test]
    async fn test_edit_and_delete_report_missing_entries() {
        let handler = handler(0.0).await;
        let sender = RecordingSender::default();

        let mut msg = message(1, "/delete 9999", true);
        msg.user_id = ADMIN_ID;
        let reply = handler.handle_message(&msg, &sender).await.unwrap().unwrap();
        assert!(reply.contains("no entry #9999"));

        msg.text = "/edit 9999 topic Nothing".to_string();
        let reply = handler.handle_message(&msg, &sender).await.unwrap().unwrap();
        assert!(reply.contains("no entry #9999"));
    }

    #[tokio::test]
    async fn test_spam_command_turns_guard_off() {
        let handler = handler(99.9).await;
        let sender = RecordingSender::default();
        let now = Utc::now();

        let mut msg = message(4, "/spam off", false);
        msg.user_id = ADMIN_ID;
        msg.timestamp = now;
        let reply = handler.handle_message(&msg, &sender).await.unwrap().unwrap();
        assert!(reply.contains("off"));
        assert!(!handler.data.spam.get_config(4).await.unwrap().enabled);

        // Ten messages in the same instant, no warning
        for _ in 0..10 {
            let mut flood = message(4, "spam spam", false);
            flood.timestamp = now;
            let reply = handler.handle_message(&flood, &sender).await.unwrap();
            assert!(reply.as_deref().map_or(true, |r| !r.contains("slow down")));
        }
        assert_eq!(handler.data.spam.user_warnings(77, 4).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_group_chatter_skipped_when_roll_misses() {
        let handler = handler(99.9).await;
        let sender = RecordingSender::default();
        let msg = message(5, "lovely day today", false);
        handler.data.decider.activity().touch(5, msg.timestamp);

        let reply = handler.handle_message(&msg, &sender).await.unwrap();

        assert!(reply.is_none());
        assert_eq!(sender.count(), 0);
    }

    #[tokio::test]
    async fn test_mention_answered_without_handle_in_query() {
        let handler = handler(99.9).await;
        let sender = RecordingSender::default();

        let reply = handler
            .handle_message(&message(5, "Eva, what is the currency?", false), &sender)
            .await
            .unwrap()
            .expect("mentions always fire");

        assert!(reply.contains("Currency"));
        let popular = handler.data.usage.popular_queries(1).await.unwrap();
        assert_eq!(popular[0].query, "what is the currency?");
    }

    #[tokio::test]
    async fn test_unknown_question_gets_suggestions() {
        let handler = handler(0.0).await;
        let sender = RecordingSender::default();

        let reply = handler
            .handle_message(&message(1, "xyzabc123", true), &sender)
            .await
            .unwrap()
            .unwrap();

        assert!(reply.contains("I'm not sure about"));
    }

    #[tokio::test]
    async fn test_model_answers_when_knowledge_misses() {
        let handler = handler_with_ai(0.0, Some(StubAi(Ok("Generated 🇳🇦".to_string())))).await;
        let sender = RecordingSender::default();

        let reply = handler
            .handle_message(&message(1, "xyzabc123", true), &sender)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply, "Generated 🇳🇦");
    }

    #[tokio::test]
    async fn test_knowledge_hit_skips_the_model() {
        let handler = handler_with_ai(0.0, Some(StubAi(Ok("Generated".to_string())))).await;
        let sender = RecordingSender::default();

        let reply = handler
            .handle_message(&message(1, "What is the capital of Namibia?", true), &sender)
            .await
            .unwrap()
            .unwrap();

        assert!(reply.contains("Windhoek"));
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_suggestions() {
        let failing = StubAi(Err("quota exceeded".to_string()));
        let handler = handler_with_ai(0.0, Some(failing)).await;
        let sender = RecordingSender::default();

        let reply = handler
            .handle_message(&message(1, "xyzabc123", true), &sender)
            .await
            .unwrap()
            .unwrap();

        assert!(reply.contains("I'm not sure about"));
    }

    #[tokio::test]
    async fn test_quiet_chat_gets_generated_starter_after_greeting() {
        let starter = StubAi(Ok("🦁 Who has seen a desert lion?".to_string()));
        let handler = handler_with_ai(0.0, Some(starter)).await;
        let sender = RecordingSender::default();
        let msg = message(8, "ok", false);
        // Greeting already used up for this chat
        assert!(handler.data.decider.activity().should_greet(
            8,
            msg.timestamp,
            Duration::hours(2)
        ));

        let reply = handler.handle_message(&msg, &sender).await.unwrap();

        assert_eq!(reply.as_deref(), Some("🦁 Who has seen a desert lion?"));
    }

    #[tokio::test]
    async fn test_private_greeting() {
        let handler = handler(99.9).await;
        let sender = RecordingSender::default();

        let reply = handler
            .handle_message(&message(3, "hello", true), &sender)
            .await
            .unwrap()
            .unwrap();

        assert!(reply.contains("Ndapewa"));
    }

    #[tokio::test]
    async fn test_quiet_chat_gets_time_of_day_greeting() {
        let handler = handler(0.0).await;
        let sender = RecordingSender::default();

        // New chat counts as quiet, nothing else matches
        let first = handler
            .handle_message(&message(8, "ok", false), &sender)
            .await
            .unwrap();
        assert!(first.is_some());
        assert!(handler.data.decider.activity().get(8).last_greeting.is_some());
    }

    #[tokio::test]
    async fn test_flood_warns_then_goes_quiet() {
        let handler = handler(99.9).await;
        let sender = RecordingSender::default();
        let now = Utc::now();

        let mut replies = Vec::new();
        for _ in 0..10 {
            let mut msg = message(9, "spam spam", false);
            msg.timestamp = now;
            replies.push(handler.handle_message(&msg, &sender).await.unwrap());
        }

        // Five allowed, three warnings, then silence
        assert!(replies[..5].iter().all(|r| r.is_none()));
        assert!(replies[5].as_deref().unwrap_or_default().contains("slow down"));
        assert!(replies[6].as_deref().unwrap_or_default().contains("quite a lot"));
        assert!(replies[7].as_deref().unwrap_or_default().contains("final warning"));
        assert!(replies[8].is_none() && replies[9].is_none());
        assert_eq!(sender.count(), 3);
    }

    #[test]
    fn test_display_name_fallback() {
        let mut msg = message(1, "hi", true);
        msg.username = Some("  ".to_string());
        assert_eq!(msg.display_name(), "friend");
        msg.username = None;
        assert_eq!(msg.display_name(), "friend");
    }
}
