//! IRC message prefix types.
//!
//! A prefix identifies the origin of a message: either a server name or a
//! user's `nick!user@host` mask. Parsing is tolerant and never fails;
//! missing `!user` or `@host` parts come back as empty strings, and a server
//! name lands in the nick slot.

use std::fmt;

/// Origin of a message, split as `nick!user@host`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Prefix {
    /// Everything before the first `!`.
    pub nick: String,
    /// Between the first `!` and the following `@`.
    pub user: String,
    /// Everything after that `@`.
    pub host: String,
}

impl Prefix {
    /// Create a prefix from its components.
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            user: user.into(),
            host: host.into(),
        }
    }

    /// Split a raw prefix string.
    ///
    /// ```
    /// use slirc_proto::Prefix;
    ///
    /// assert_eq!(Prefix::parse("alice!al@example.org"), Prefix::new("alice", "al", "example.org"));
    /// assert_eq!(Prefix::parse("irc.example.org"), Prefix::new("irc.example.org", "", ""));
    /// // Without a `!`, the whole string is the nick.
    /// assert_eq!(Prefix::parse("alice@example.org"), Prefix::new("alice@example.org", "", ""));
    /// ```
    pub fn parse(s: &str) -> Self {
        let Some((nick, rest)) = s.split_once('!') else {
            return Self::new(s, "", "");
        };
        match rest.split_once('@') {
            Some((user, host)) => Self::new(nick, user, host),
            None => Self::new(nick, rest, ""),
        }
    }
}

impl From<&str> for Prefix {
    fn from(s: &str) -> Self {
        Prefix::parse(s)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nick)?;
        if !self.user.is_empty() {
            write!(f, "!{}", self.user)?;
        }
        if !self.host.is_empty() {
            write!(f, "@{}", self.host)?;
        }
        Ok(())
    }
}
