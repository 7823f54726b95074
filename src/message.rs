//! Structured inbound messages.
//!
//! [`Message::parse`] interprets one decoded line against the live
//! configuration: it resolves who the conversation is with (`sender`) and
//! whether the origin is a bot owner. Pattern actions later attach their
//! match metadata to a private clone via [`Captures`].

use std::collections::BTreeMap;
use std::fmt;

use slirc_proto::RawMessage;

use crate::config::Config;
use crate::error::ParseError;
use crate::network::writer::{action_line, msg_line, notice_line};

/// Match metadata attached by a pattern action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Captures {
    /// Source of the pattern that matched.
    pub pattern: String,
    /// Positional groups; index 0 is the whole match.
    pub groups: Vec<Option<String>>,
    /// Named groups that participated in the match.
    pub named: BTreeMap<String, String>,
}

impl Captures {
    /// Build from a regex match.
    pub fn from_regex(pattern: &regex::Regex, caps: &regex::Captures<'_>) -> Self {
        let groups = caps
            .iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();
        let named = pattern
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();
        Self {
            pattern: pattern.as_str().to_string(),
            groups,
            named,
        }
    }

    /// Positional group by index.
    pub fn index(&self, idx: usize) -> Option<&str> {
        self.groups.get(idx)?.as_deref()
    }

    /// Named group.
    pub fn name(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }
}

/// One parsed inbound line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    /// The decoded line.
    pub raw: String,
    /// Raw source prefix without the leading `:`.
    pub source: Option<String>,
    pub nick: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    /// Protocol verb.
    pub event: Option<String>,
    pub target: Option<String>,
    /// Middle arguments after the target.
    pub args: Vec<String>,
    /// Trailing text, empty when absent.
    pub text: String,
    /// Who to answer: the target, or the origin nick when the target is us.
    pub sender: Option<String>,
    /// The origin nick is in the owner list.
    pub owner: bool,
    /// Set on the clone handed to a matching action.
    pub captures: Option<Captures>,
}

impl Message {
    /// Parse a decoded line (no trailing CR/LF).
    pub fn parse(line: &str, config: &Config) -> Result<Self, ParseError> {
        let raw = RawMessage::parse(line)?;
        let prefix = raw.prefix();

        let (nick, user, host) = match prefix {
            Some(p) => (Some(p.nick), Some(p.user), Some(p.host)),
            None => (None, None, None),
        };

        let sender = match raw.target.as_deref() {
            Some(target) if target == config.nick => nick.clone(),
            _ => raw.target.clone(),
        };
        let owner = nick.as_deref().is_some_and(|n| config.is_owner(n));

        Ok(Self {
            raw: line.to_string(),
            source: raw.source,
            nick,
            user,
            host,
            event: raw.command,
            target: raw.target,
            args: raw.params,
            text: raw.trailing,
            sender,
            owner,
            captures: None,
        })
    }

    /// Line sending `text` back to the sender.
    pub fn reply(&self, text: &str) -> Option<String> {
        self.sender.as_deref().map(|to| msg_line(to, text))
    }

    /// Like [`reply`](Self::reply), addressed to the origin nick.
    pub fn respond(&self, text: &str) -> Option<String> {
        let nick = self.nick.as_deref().unwrap_or_default();
        self.reply(&format!("{nick}: {text}"))
    }

    /// NOTICE to the sender.
    pub fn notify(&self, text: &str) -> Option<String> {
        self.sender.as_deref().map(|to| notice_line(to, text))
    }

    /// CTCP ACTION to the sender.
    pub fn act(&self, text: &str) -> Option<String> {
        self.sender.as_deref().map(|to| action_line(to, text))
    }

    /// Captured group by index, from the action that matched.
    pub fn group(&self, idx: usize) -> Option<&str> {
        self.captures.as_ref()?.index(idx)
    }

    /// Captured group by name, from the action that matched.
    pub fn named(&self, name: &str) -> Option<&str> {
        self.captures.as_ref()?.name(name)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Message event={} sender={} target={} text={:?}>",
            self.event.as_deref().unwrap_or("-"),
            self.sender.as_deref().unwrap_or("-"),
            self.target.as_deref().unwrap_or("-"),
            self.text,
        )
    }
}

/// An item on the inbound queue.
#[derive(Clone, Debug)]
pub enum Event {
    Message(Message),
    /// A line the parser rejected; the decoded text is kept.
    Unparsed { line: String, error: ParseError },
}

impl Event {
    /// Parse a line, keeping the text when parsing fails.
    pub fn parse(line: String, config: &Config) -> Self {
        match Message::parse(&line, config) {
            Ok(msg) => Event::Message(msg),
            Err(error) => Event::Unparsed { line, error },
        }
    }

    /// The protocol verb, if the line parsed.
    pub fn verb(&self) -> Option<&str> {
        match self {
            Event::Message(msg) => msg.event.as_deref(),
            Event::Unparsed { .. } => None,
        }
    }
}
