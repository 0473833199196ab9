use serde::{Deserialize, Serialize};

/// One turn of a chat-completion conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request settings for one kind of completion.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl AiConfig {
    /// Settings for answering a user's question.
    pub fn chat(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.7,
            max_tokens: 500,
        }
    }

    /// Settings for a short, livelier group prompt.
    pub fn starter(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.9,
            max_tokens: 100,
        }
    }
}
