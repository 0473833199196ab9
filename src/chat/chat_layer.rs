// Chat layer - message handling, reply text and transports.

#[path = "handler.rs"]
pub mod handler;

#[path = "commands.rs"]
pub mod commands;

#[path = "replies.rs"]
pub mod replies;

#[path = "console.rs"]
pub mod console;

pub use handler::{ChatHandler, Data, HandlerConfig};
