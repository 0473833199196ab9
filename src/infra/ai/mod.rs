// AI infrastructure - HTTP clients for chat-completion APIs.

mod chat_completions_client;

pub use chat_completions_client::ChatCompletionsClient;
