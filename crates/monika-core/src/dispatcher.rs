use std::fmt;

use anyhow::Result;

use crate::memory::{FactStore, Facts};

pub const NOTHING_KNOWN: &str = "I don't know anything yet.";
pub const HELP: &str = "You can teach me with 'learn', ask me with 'recall', update with 'update', or list all with 'facts'.";

/// Commands that take a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Learn,
    Recall,
    Update,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Learn => "learn",
            Keyword::Recall => "recall",
            Keyword::Update => "update",
        }
    }

    /// Hint shown when the payload can't be parsed.
    pub fn usage(self) -> &'static str {
        match self {
            Keyword::Learn => "To teach me, say: learn <key>: <value>",
            Keyword::Recall => "To recall, say: recall <key>",
            Keyword::Update => "To update, say: update <key>: <value>",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("'{0}' expects an argument after the keyword")]
    MissingArgument(Keyword),
    #[error("'{0}' expects '<key>: <value>'")]
    MissingColon(Keyword),
}

impl ParseError {
    pub fn keyword(self) -> Keyword {
        match self {
            ParseError::MissingArgument(k) | ParseError::MissingColon(k) => k,
        }
    }

    pub fn usage(self) -> &'static str {
        self.keyword().usage()
    }
}

/// One parsed input line. Keys and values borrow from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Learn { key: &'a str, value: &'a str },
    Recall { key: &'a str },
    Update { key: &'a str, value: &'a str },
    Facts,
    Help,
    Invalid(ParseError),
}

/// Parse a line of input.
///
/// The keyword is matched case-insensitively as a prefix, so "Learning x: y"
/// is still a `learn`. Everything after the first space is the payload;
/// `learn` and `update` split it at the first colon.
pub fn parse_command(text: &str) -> Command<'_> {
    let text = text.trim();
    let lower = text.to_lowercase();

    if lower.starts_with("learn") {
        match parse_pair(text, Keyword::Learn) {
            Ok((key, value)) => Command::Learn { key, value },
            Err(e) => Command::Invalid(e),
        }
    } else if lower.starts_with("recall") {
        match text.split_once(' ') {
            Some((_, key)) => Command::Recall { key: key.trim() },
            None => Command::Invalid(ParseError::MissingArgument(Keyword::Recall)),
        }
    } else if lower.starts_with("update") {
        match parse_pair(text, Keyword::Update) {
            Ok((key, value)) => Command::Update { key, value },
            Err(e) => Command::Invalid(e),
        }
    } else if lower == "facts" {
        Command::Facts
    } else {
        Command::Help
    }
}

fn parse_pair(text: &str, keyword: Keyword) -> Result<(&str, &str), ParseError> {
    let (_, rest) = text
        .split_once(' ')
        .ok_or(ParseError::MissingArgument(keyword))?;
    let (key, value) = rest
        .split_once(':')
        .ok_or(ParseError::MissingColon(keyword))?;
    Ok((key.trim(), value.trim()))
}

/// Render facts one per line as `key: value`.
pub fn render_facts(facts: &Facts) -> String {
    if facts.is_empty() {
        return NOTHING_KNOWN.to_string();
    }
    facts
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Routes text commands to a [`FactStore`] and phrases the replies.
pub struct Dispatcher {
    store: FactStore,
}

impl Dispatcher {
    pub fn new(store: FactStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }

    /// Handle one line of input and return the reply.
    ///
    /// Malformed commands produce a usage hint, never an error. Errors only
    /// come from the store failing to write a fact file.
    pub async fn handle(&mut self, text: &str) -> Result<String> {
        let command = parse_command(text);
        tracing::debug!("Dispatching {command:?}");

        let reply = match command {
            Command::Learn { key, value } => {
                self.store.learn(key, value)?;
                format!("I've learned that {key} is {value}.")
            }
            Command::Recall { key } => format!("{key}: {}", self.store.recall(key)),
            Command::Update { key, value } => {
                if self.store.update(key, value)? {
                    format!("I've updated {key} to {value}.")
                } else {
                    format!("I don't know {key} yet. Teach me first.")
                }
            }
            Command::Facts => render_facts(&self.store.all_facts()),
            Command::Help => HELP.to_string(),
            Command::Invalid(e) => {
                tracing::debug!("Parse error: {e}");
                e.usage().to_string()
            }
        };
        Ok(reply)
    }
}
