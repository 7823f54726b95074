//! CTCP (Client-to-Client Protocol) framing.
//!
//! CTCP payloads travel inside PRIVMSG and NOTICE text, wrapped in `\x01`.
//!
//! # Reference
//! - CTCP specification: <https://modern.ircdocs.horse/ctcp.html>

/// The CTCP delimiter character (`\x01`).
pub const CTCP_DELIM: char = '\x01';

/// Wrap `text` as a CTCP ACTION (the `/me` command).
///
/// ```
/// use slirc_proto::ctcp::action;
///
/// assert_eq!(action("dances"), "\x01ACTION dances\x01");
/// ```
pub fn action(text: &str) -> String {
    format!("{CTCP_DELIM}ACTION {text}{CTCP_DELIM}")
}

/// Split a CTCP payload into its verb and optional parameters.
///
/// Returns `None` when `text` is not delimited by `\x01`. A missing closing
/// delimiter is tolerated, as some clients omit it.
///
/// ```
/// use slirc_proto::ctcp::parse;
///
/// assert_eq!(parse("\x01ACTION waves\x01"), Some(("ACTION", Some("waves"))));
/// assert_eq!(parse("\x01VERSION\x01"), Some(("VERSION", None)));
/// assert_eq!(parse("plain text"), None);
/// ```
pub fn parse(text: &str) -> Option<(&str, Option<&str>)> {
    let inner = text.strip_prefix(CTCP_DELIM)?;
    let inner = inner.strip_suffix(CTCP_DELIM).unwrap_or(inner);
    if inner.is_empty() {
        return None;
    }
    match inner.split_once(' ') {
        Some((verb, params)) => Some((verb, Some(params))),
        None => Some((inner, None)),
    }
}
