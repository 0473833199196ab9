// Console transport - every stdin line is a message in one local chat and
// replies are printed to stdout. Lets the whole pipeline run without a chat
// platform.

use super::handler::{ChatHandler, Error, IncomingMessage, MessageSender};
use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

const CONSOLE_CHAT_ID: i64 = 1;
pub const CONSOLE_USER_ID: i64 = 1;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Treat the console as a one-to-one chat (every line gets an answer)
    pub private: bool,
    pub username: String,
    pub bot_name: String,
}

/// Writes replies to stdout, prefixed with the bot's name.
pub struct StdoutSender {
    bot_name: String,
    out: Mutex<tokio::io::Stdout>,
}

impl StdoutSender {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

#[async_trait]
impl MessageSender for StdoutSender {
    async fn send(&self, _chat_id: i64, _reply_to: Option<i64>, text: &str) -> Result<(), Error> {
        let mut out = self.out.lock().await;
        out.write_all(format!("\n{}: {}\n\n", self.bot_name, text).as_bytes())
            .await?;
        out.flush().await?;
        Ok(())
    }
}

/// Read stdin until EOF, handing each line to the handler.
///
/// Handler errors are logged and the loop keeps going.
pub async fn run(handler: &ChatHandler, config: &ConsoleConfig) -> Result<(), Error> {
    let sender = StdoutSender::new(config.bot_name.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut message_id = 0i64;

    tracing::info!(private = config.private, "console chat ready, Ctrl-D to quit");

    while let Some(line) = lines.next_line().await? {
        message_id += 1;
        let msg = IncomingMessage {
            chat_id: CONSOLE_CHAT_ID,
            message_id: Some(message_id),
            user_id: CONSOLE_USER_ID,
            username: Some(config.username.clone()),
            text: line,
            is_private: config.private,
            timestamp: Utc::now(),
        };

        if let Err(e) = handler.handle_message(&msg, &sender).await {
            tracing::error!(chat_id = msg.chat_id, "failed to handle message: {}", e);
        }
    }

    Ok(())
}
