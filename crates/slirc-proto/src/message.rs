//! Tolerant IRC line splitting.
//!
//! A line is split into an optional `:source`, whitespace-separated argument
//! tokens, and trailing text after the first ` :`. The first argument is the
//! command verb and the second the target; both may be absent.

use std::str::FromStr;

use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;

/// One inbound line, split but not interpreted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawMessage {
    /// Raw source prefix without the leading `:`.
    pub source: Option<String>,
    /// First argument token (the protocol verb).
    pub command: Option<String>,
    /// Second argument token.
    pub target: Option<String>,
    /// Argument tokens after the target.
    pub params: Vec<String>,
    /// Text after the first ` :`, empty when there is none.
    pub trailing: String,
}

impl RawMessage {
    /// Split a decoded line (no trailing CR/LF).
    ///
    /// ```
    /// use slirc_proto::RawMessage;
    ///
    /// let raw = RawMessage::parse(":irc.example.org 353 bot = #chan :alice bob").unwrap();
    /// assert_eq!(raw.source.as_deref(), Some("irc.example.org"));
    /// assert_eq!(raw.command.as_deref(), Some("353"));
    /// assert_eq!(raw.target.as_deref(), Some("bot"));
    /// assert_eq!(raw.params, vec!["=", "#chan"]);
    /// assert_eq!(raw.trailing, "alice bob");
    /// ```
    pub fn parse(line: &str) -> Result<Self, MessageParseError> {
        let (source, rest) = match line.strip_prefix(':') {
            Some(stripped) => {
                let (source, rest) = stripped
                    .split_once(' ')
                    .ok_or(MessageParseError::UnterminatedPrefix)?;
                (Some(source.to_owned()), rest)
            }
            None => (None, line),
        };

        let (argstr, trailing) = rest.split_once(" :").unwrap_or((rest, ""));

        let mut args = argstr.split_whitespace().map(str::to_owned);
        let command = args.next();
        let target = args.next();
        let params = args.collect();

        Ok(Self {
            source,
            command,
            target,
            params,
            trailing: trailing.to_owned(),
        })
    }

    /// The source split into nick, user and host.
    pub fn prefix(&self) -> Option<Prefix> {
        self.source.as_deref().map(Prefix::parse)
    }
}

impl FromStr for RawMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RawMessage::parse(s).map_err(|cause| ProtocolError::InvalidMessage {
            string: s.to_owned(),
            cause,
        })
    }
}
