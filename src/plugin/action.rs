//! Pattern actions: commands and rules bound to script handlers.
//!
//! A command is a token list addressed to the bot, either by nickname
//! (`Bot: foo bar`) or by the command prefix (`.foo bar`). A rule is a
//! free-form regex matched against the message text. Both compile against
//! the live configuration before they can handle anything.

use regex::Regex;
use tracing::debug;

use super::effect::{Flow, Outbox};
use crate::config::Config;
use crate::error::HandlerError;
use crate::message::{Captures, Message};

/// Denial sent when a non-owner triggers an owner-only action.
pub const OWNER_DENIED: &str = "You are not an owner of this bot.";

/// Placeholder replaced by the escaped nickname.
const NICK_PLACEHOLDER: &str = "$nick";

/// What an action matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Command { tokens: Vec<String> },
    Rule { pattern: String },
}

/// Which protocol verbs an action listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    Any,
    Verb(String),
}

impl EventFilter {
    pub fn matches(&self, event: Option<&str>) -> bool {
        match self {
            EventFilter::Any => true,
            EventFilter::Verb(verb) => event == Some(verb.as_str()),
        }
    }
}

impl From<&str> for EventFilter {
    fn from(s: &str) -> Self {
        if s == "*" {
            EventFilter::Any
        } else {
            EventFilter::Verb(s.to_string())
        }
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        EventFilter::Verb("PRIVMSG".to_string())
    }
}

/// A script function and the number of parameters it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub name: String,
    pub arity: usize,
}

impl Handler {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

/// A compiled, matchable unit of behaviour.
#[derive(Debug, Clone)]
pub struct Action {
    pub kind: ActionKind,
    pub event: EventFilter,
    pub require_owner: bool,
    /// Display name: the joined tokens for commands, the pattern for rules.
    pub name: String,
    /// One-line description for help listings.
    pub doc: String,
    pub handler: Handler,
    patterns: Option<Vec<Regex>>,
}

impl Action {
    pub fn command<I, S>(tokens: I, handler: Handler) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let name = tokens.join(" ");
        Self::new(ActionKind::Command { tokens }, name, handler)
    }

    pub fn rule(pattern: impl Into<String>, handler: Handler) -> Self {
        let pattern = pattern.into();
        let name = pattern.clone();
        Self::new(ActionKind::Rule { pattern }, name, handler)
    }

    fn new(kind: ActionKind, name: String, handler: Handler) -> Self {
        Self {
            kind,
            event: EventFilter::default(),
            require_owner: false,
            name,
            doc: String::new(),
            handler,
            patterns: None,
        }
    }

    pub fn with_event(mut self, event: EventFilter) -> Self {
        self.event = event;
        self
    }

    pub fn owner_only(mut self, require_owner: bool) -> Self {
        self.require_owner = require_owner;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// `"command"` or `"rule"`.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ActionKind::Command { .. } => "command",
            ActionKind::Rule { .. } => "rule",
        }
    }

    /// Compiled patterns, once [`compile`](Self::compile) has run.
    pub fn patterns(&self) -> Option<&[Regex]> {
        self.patterns.as_deref()
    }

    /// Build match patterns against the configured nickname and prefix.
    pub fn compile(&mut self, config: &Config) -> Result<(), regex::Error> {
        let nick = regex::escape(&config.nick);

        let sources = match &self.kind {
            ActionKind::Command { tokens } => {
                let body = tokens
                    .iter()
                    .map(|token| compile_token(token, &nick))
                    .collect::<Vec<_>>()
                    .join(r"\s+");
                let prefix = regex::escape(&config.command_prefix);
                vec![
                    format!(r"^{nick}[,:]?\s+{body}$"),
                    format!("^{prefix}{body}$"),
                ]
            }
            ActionKind::Rule { pattern } => vec![pattern.replace(NICK_PLACEHOLDER, &nick)],
        };

        let patterns = sources
            .iter()
            .map(|source| Regex::new(source))
            .collect::<Result<Vec<_>, _>>()?;
        self.patterns = Some(patterns);
        Ok(())
    }

    /// Run the handler for every pattern matching `msg.text`.
    ///
    /// Each match gets its own clone of the message carrying the capture
    /// groups. An owner-only match from a non-owner queues a denial and
    /// halts dispatch of the message everywhere.
    pub fn handle<F>(&self, msg: &Message, outbox: &Outbox, mut invoke: F) -> Result<Flow, HandlerError>
    where
        F: FnMut(&Handler, Message) -> Result<Flow, HandlerError>,
    {
        let patterns = self
            .patterns
            .as_ref()
            .ok_or_else(|| HandlerError::NotCompiled(self.name.clone()))?;

        if !self.event.matches(msg.event.as_deref()) {
            return Ok(Flow::Continue);
        }

        for pattern in patterns {
            let Some(caps) = pattern.captures(&msg.text) else {
                continue;
            };

            if self.require_owner && !msg.owner {
                outbox.send_opt(msg.respond(OWNER_DENIED));
                return Ok(Flow::Halt);
            }

            debug!(action = %self.name, text = %msg.text, pattern = %pattern.as_str(), "Action triggered");
            let mut matched = msg.clone();
            matched.captures = Some(Captures::from_regex(pattern, &caps));

            let flow = invoke(&self.handler, matched)?;
            if !flow.is_continue() {
                return Ok(flow);
            }
        }

        Ok(Flow::Continue)
    }
}

/// Compile one command token.
///
/// `<name>` captures a non-whitespace run, `<name:expr>` captures `expr`;
/// anything else matches literally.
fn compile_token(token: &str, nick: &str) -> String {
    match parse_placeholder(token) {
        Some((name, None)) => format!(r"(?P<{name}>\S+)"),
        Some((name, Some(expr))) => {
            format!("(?P<{name}>{})", expr.replace(NICK_PLACEHOLDER, nick))
        }
        None => regex::escape(token),
    }
}

fn parse_placeholder(token: &str) -> Option<(&str, Option<&str>)> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    let (name, expr) = match inner.split_once(':') {
        Some((name, expr)) if !expr.is_empty() && !expr.contains('>') => (name, Some(expr)),
        Some(_) => return None,
        None => (inner, None),
    };

    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
    let tail_ok = chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
    (head_ok && tail_ok).then_some((name, expr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            nick: "Bot".to_string(),
            command_prefix: ".".to_string(),
            owners: vec!["alice".to_string()],
            ..Config::default()
        }
    }

    fn privmsg(from: &str, to: &str, text: &str) -> Message {
        Message::parse(&format!(":{from}!u@h PRIVMSG {to} :{text}"), &config()).unwrap()
    }

    fn compiled(mut action: Action) -> Action {
        action.compile(&config()).unwrap();
        action
    }

    #[test]
    fn test_placeholder_grammar() {
        assert_eq!(parse_placeholder("<x>"), Some(("x", None)));
        assert_eq!(parse_placeholder("<_a1:\\d+>"), Some(("_a1", Some("\\d+"))));
        assert_eq!(parse_placeholder("<1x>"), None);
        assert_eq!(parse_placeholder("<x:>"), None);
        assert_eq!(parse_placeholder("<x:a>b>"), None);
        assert_eq!(parse_placeholder("plain"), None);
    }

    #[test]
    fn test_command_matches_both_address_forms() {
        let action = compiled(Action::command(["foo", "<x>"], Handler::new("h", 1)));
        let patterns = action.patterns().unwrap();
        assert_eq!(patterns.len(), 2);

        for text in ["Bot: foo bar", "Bot, foo bar", "Bot foo bar", ".foo bar"] {
            let caps = patterns
                .iter()
                .find_map(|p| p.captures(text))
                .unwrap_or_else(|| panic!("no match for {text:?}"));
            assert_eq!(&caps["x"], "bar");
        }
        for text in ["foo bar", ".foo", "Bot: foo", ".foo bar baz", "!foo bar"] {
            assert!(patterns.iter().all(|p| !p.is_match(text)), "{text:?} matched");
        }
    }

    #[test]
    fn test_literal_tokens_are_escaped() {
        let action = compiled(Action::command(["c++", "<n:\\d+>"], Handler::new("h", 1)));
        let patterns = action.patterns().unwrap();
        assert!(patterns[1].is_match(".c++ 42"));
        assert!(!patterns[1].is_match(".cc 42"));
        assert!(!patterns[1].is_match(".c++ forty"));
    }

    #[test]
    fn test_rule_substitutes_escaped_nick() {
        let mut action = Action::rule(r"^hello,? $nick\b", Handler::new("h", 1));
        let config = Config {
            nick: "b.t".to_string(),
            ..config()
        };
        action.compile(&config).unwrap();
        let pattern = &action.patterns().unwrap()[0];
        assert!(pattern.is_match("hello b.t"));
        assert!(!pattern.is_match("hello bot"));
    }

    #[test]
    fn test_handle_requires_compile() {
        let action = Action::command(["ping"], Handler::new("h", 1));
        let msg = privmsg("alice", "Bot", ".ping");
        let result = action.handle(&msg, &Outbox::new(), |_, _| Ok(Flow::Continue));
        assert!(matches!(result, Err(HandlerError::NotCompiled(name)) if name == "ping"));
    }

    #[test]
    fn test_handle_passes_captures_on_a_clone() {
        let action = compiled(Action::command(["say", "<what>"], Handler::new("h", 1)));
        let msg = privmsg("bob", "#c", ".say hi");
        let mut seen = Vec::new();
        let flow = action
            .handle(&msg, &Outbox::new(), |handler, matched| {
                assert_eq!(handler.name, "h");
                seen.push(matched.named("what").map(str::to_string));
                Ok(Flow::Continue)
            })
            .unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(seen, vec![Some("hi".to_string())]);
        assert!(msg.captures.is_none());
    }

    #[test]
    fn test_event_filter() {
        let action = compiled(
            Action::rule("^bye$", Handler::new("h", 1)).with_event(EventFilter::from("NOTICE")),
        );
        let mut calls = 0;
        let msg = privmsg("bob", "#c", "bye");
        action
            .handle(&msg, &Outbox::new(), |_, _| {
                calls += 1;
                Ok(Flow::Continue)
            })
            .unwrap();
        assert_eq!(calls, 0);

        let any = compiled(Action::rule("^bye$", Handler::new("h", 1)).with_event(EventFilter::Any));
        any.handle(&msg, &Outbox::new(), |_, _| {
            calls += 1;
            Ok(Flow::Continue)
        })
        .unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_owner_only_denies_and_halts() {
        let action = compiled(Action::command(["reload"], Handler::new("h", 1)).owner_only(true));
        let outbox = Outbox::new();

        let msg = privmsg("mallory", "#c", ".reload");
        let flow = action
            .handle(&msg, &outbox, |_, _| panic!("handler must not run"))
            .unwrap();
        assert_eq!(flow, Flow::Halt);
        assert_eq!(
            outbox.take_lines(),
            vec!["PRIVMSG #c :mallory: You are not an owner of this bot.\r\n"]
        );

        let msg = privmsg("alice", "#c", ".reload");
        let mut ran = false;
        action
            .handle(&msg, &outbox, |_, _| {
                ran = true;
                Ok(Flow::Continue)
            })
            .unwrap();
        assert!(ran);
    }

    #[test]
    fn test_overlapping_patterns_all_fire() {
        // A prefix spelled like the nick address makes both forms match.
        let mut action = Action::command(["x"], Handler::new("h", 1));
        let config = Config {
            nick: "Bot".to_string(),
            command_prefix: "Bot ".to_string(),
            ..Config::default()
        };
        action.compile(&config).unwrap();

        let msg = Message::parse(":bob!u@h PRIVMSG #c :Bot x", &config).unwrap();
        let mut calls = 0;
        action
            .handle(&msg, &Outbox::new(), |_, _| {
                calls += 1;
                Ok(Flow::Continue)
            })
            .unwrap();
        assert_eq!(calls, 2);
    }
}
