// Client for OpenAI-style `/chat/completions` endpoints (x.ai Grok by
// default, anything compatible through `EVA_AI_API_URL`).

use crate::core::ai::{AiConfig, AiError, AiMessage, AiProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.x.ai/v1/chat/completions";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ChatCompletionsClient {
    client: Client,
    api_key: String,
    url: String,
}

impl ChatCompletionsClient {
    pub fn new(api_key: String, url: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key,
            url: url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }
}

/// Pulls the first choice's message text out of a completion response.
fn extract_content(response: &serde_json::Value) -> Option<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl AiProvider for ChatCompletionsClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, AiError> {
        let payload = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
        });

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(format!("Chat completion API error: {} - {}", status, text).into());
        }

        let response_json: serde_json::Value = response.json().await?;

        let content = extract_content(&response_json).ok_or("Failed to parse response content")?;
        Ok(content)
    }
}
