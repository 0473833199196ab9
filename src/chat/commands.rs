// Slash commands. Parsing is pure; `ChatHandler` runs the parsed command.
//
// Browsing commands are open to everyone. Commands that change the knowledge
// base or the flood guard need an admin.

use crate::core::knowledge::{KnowledgeUpdate, NewKnowledgeEntry};

pub const CATEGORY_USAGE: &str = "/category <name>";
pub const SEARCH_USAGE: &str = "/search <question>";
pub const ADD_USAGE: &str = "/add Topic | Category | Content | keyword, keyword";
pub const EDIT_USAGE: &str = "/edit <id> <topic|content|category|keywords> <new value>";
pub const DELETE_USAGE: &str = "/delete <id>";
pub const SPAM_USAGE: &str = "/spam [on|off|limit <messages> <seconds>|reset <user id>]";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    About,
    /// List categories
    Menu,
    /// Topics in one category
    Category(String),
    /// Every topic
    Topics,
    /// Top matches for a query, with scores
    Search(String),
    Stats,
    Add(NewKnowledgeEntry),
    Edit { id: i64, update: KnowledgeUpdate },
    Delete(i64),
    Spam(SpamCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamCommand {
    /// Show this chat's settings and the caller's warnings
    Status,
    Enable(bool),
    Limit { max_messages: u32, window_secs: i64 },
    /// Clear a user's warnings in this chat
    Reset(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not one of ours; probably meant for another bot
    Unknown(String),
    /// Right command, wrong arguments. Carries the usage line.
    Usage(&'static str),
}

impl Command {
    pub fn requires_admin(&self) -> bool {
        match self {
            Command::Add(_) | Command::Edit { .. } | Command::Delete(_) => true,
            Command::Spam(spam) => *spam != SpamCommand::Status,
            _ => false,
        }
    }
}

/// Parses "/name args". `None` when the text isn't a command at all.
///
/// "/help@eva_bot" (a command addressed to one bot in a group) parses the same
/// as "/help".
pub fn parse(text: &str) -> Option<Result<Command, ParseError>> {
    let rest = text.trim().strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head).to_lowercase();

    let parsed = match name.as_str() {
        "start" => Ok(Command::Start),
        "help" => Ok(Command::Help),
        "about" => Ok(Command::About),
        "menu" | "categories" => Ok(Command::Menu),
        "topics" => Ok(Command::Topics),
        "stats" => Ok(Command::Stats),
        "category" => non_empty(args, CATEGORY_USAGE).map(Command::Category),
        "search" => non_empty(args, SEARCH_USAGE).map(Command::Search),
        "add" => parse_add(args),
        "edit" => parse_edit(args),
        "delete" => parse_id(args)
            .map(Command::Delete)
            .ok_or(ParseError::Usage(DELETE_USAGE)),
        "spam" => parse_spam(args).map(Command::Spam),
        _ => Err(ParseError::Unknown(name)),
    };
    Some(parsed)
}

fn non_empty(args: &str, usage: &'static str) -> Result<String, ParseError> {
    if args.is_empty() {
        Err(ParseError::Usage(usage))
    } else {
        Ok(args.to_string())
    }
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn parse_add(args: &str) -> Result<Command, ParseError> {
    let parts: Vec<&str> = args.split('|').map(str::trim).collect();
    let [topic, category, content, rest @ ..] = parts.as_slice() else {
        return Err(ParseError::Usage(ADD_USAGE));
    };
    if topic.is_empty() || content.is_empty() || rest.len() > 1 {
        return Err(ParseError::Usage(ADD_USAGE));
    }

    let keywords = rest.first().copied().unwrap_or("");
    Ok(Command::Add(NewKnowledgeEntry::from_fields(
        topic, content, category, keywords,
    )))
}

fn parse_edit(args: &str) -> Result<Command, ParseError> {
    let usage = ParseError::Usage(EDIT_USAGE);
    let mut parts = args.splitn(3, char::is_whitespace);
    let id = parts.next().and_then(parse_id).ok_or(usage.clone())?;
    let field = parts.next().map(str::to_lowercase).ok_or(usage.clone())?;
    let value = parts.next().map(str::trim).unwrap_or("");
    if value.is_empty() {
        return Err(usage);
    }

    let mut update = KnowledgeUpdate::default();
    match field.as_str() {
        "topic" => update.topic = Some(value.to_string()),
        "content" => update.content = Some(value.to_string()),
        "category" => update.category = Some(value.to_string()),
        "keywords" | "tags" => update.keywords = Some(NewKnowledgeEntry::parse_keywords(value)),
        _ => return Err(usage),
    }
    Ok(Command::Edit { id, update })
}

fn parse_spam(args: &str) -> Result<SpamCommand, ParseError> {
    let usage = ParseError::Usage(SPAM_USAGE);
    let words: Vec<&str> = args.split_whitespace().collect();

    match words.as_slice() {
        [] | ["status"] => Ok(SpamCommand::Status),
        ["on"] => Ok(SpamCommand::Enable(true)),
        ["off"] => Ok(SpamCommand::Enable(false)),
        ["limit", messages, seconds] => {
            let max_messages: u32 = messages.parse().map_err(|_| usage.clone())?;
            let window_secs: i64 = seconds.parse().map_err(|_| usage.clone())?;
            if max_messages == 0 || window_secs <= 0 {
                return Err(usage);
            }
            Ok(SpamCommand::Limit {
                max_messages,
                window_secs,
            })
        }
        ["reset", user] => parse_id(user).map(SpamCommand::Reset).ok_or(usage),
        _ => Err(usage),
    }
}
