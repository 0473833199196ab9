use super::ai_models::{AiConfig, AiMessage};
use crate::core::knowledge::KnowledgeEntry;
use async_trait::async_trait;

pub type AiError = Box<dyn std::error::Error + Send + Sync>;

/// How many knowledge entries are quoted in the system prompt.
pub const CONTEXT_ENTRIES: usize = 2;

/// Entry content is cut to this many characters in the prompt.
const CONTEXT_CHARS: usize = 200;

const PERSONA: &str = "You are Eva, an assistant specializing in Namibia.

Your personality:
- Friendly, warm and enthusiastic about Namibia
- Use emojis naturally (🇳🇦, 🦁, 🏜️)
- Keep responses concise (2-3 paragraphs max)
- Always end with a helpful suggestion or question
- Mention /menu when relevant

Your knowledge areas:
- Namibian tourism, wildlife and culture
- Geography, history and practical travel info
- Safari planning and destinations";

const STARTER_PROMPT: &str = "Generate a short, engaging conversation starter about Namibia for a group chat. \
It should be a question or an interesting fact. Keep it to 1-2 sentences. Include a relevant emoji and mention /menu.";

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request and returns the model's reply text.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, AiError>;
}

// Lets the service hold whichever provider the composition root picked.
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, AiError> {
        (**self).chat_complete(messages, config).await
    }
}

pub struct AiService<P: AiProvider> {
    provider: P,
    chat_config: AiConfig,
    starter_config: AiConfig,
}

impl<P: AiProvider> AiService<P> {
    pub fn new(provider: P, model: &str) -> Self {
        Self {
            provider,
            chat_config: AiConfig::chat(model),
            starter_config: AiConfig::starter(model),
        }
    }

    /// Persona plus a short excerpt of the most related entries.
    pub fn system_prompt(&self, context: &[KnowledgeEntry]) -> String {
        let mut prompt = PERSONA.to_string();

        if !context.is_empty() {
            prompt.push_str("\n\nKnowledge base information:\n");
            for entry in context.iter().take(CONTEXT_ENTRIES) {
                prompt.push_str(&format!("- {}: {}\n", entry.topic, excerpt(&entry.content)));
            }
            prompt.push_str(
                "\nUse this information to enhance your response, but respond naturally in your own words.",
            );
        }

        prompt
    }

    /// A generated answer to `question`. `None` for a blank question or an
    /// empty completion.
    pub async fn chat(
        &self,
        question: &str,
        context: &[KnowledgeEntry],
    ) -> Result<Option<String>, AiError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }

        let messages = [
            AiMessage::system(self.system_prompt(context)),
            AiMessage::user(question),
        ];
        let reply = self
            .provider
            .chat_complete(&messages, &self.chat_config)
            .await?;

        Ok(non_blank(reply))
    }

    /// A generated prompt to get a quiet group talking.
    pub async fn conversation_starter(&self) -> Result<Option<String>, AiError> {
        let messages = [
            AiMessage::system("You are Eva, a friendly Namibia assistant."),
            AiMessage::user(STARTER_PROMPT),
        ];
        let reply = self
            .provider
            .chat_complete(&messages, &self.starter_config)
            .await?;

        Ok(non_blank(reply))
    }
}

fn excerpt(content: &str) -> String {
    if content.chars().count() <= CONTEXT_CHARS {
        return content.to_string();
    }
    let cut: String = content.chars().take(CONTEXT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

fn non_blank(reply: String) -> Option<String> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
