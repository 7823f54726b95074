//! Outbound line formatting.
//!
//! Every component is scrubbed of CR, LF and NUL before joining, so text
//! coming from chat users can never inject a second protocol line.

use std::borrow::Cow;

/// Maximum formatted line length in characters, before the terminator.
///
/// Leaves two bytes of the 512-byte protocol limit for `\r\n`.
pub const MAX_LINE_LEN: usize = 510;

/// Line terminator appended to every outbound line.
pub const LINE_TERMINATOR: &str = "\r\n";

#[inline]
fn is_line_breaking(ch: char) -> bool {
    matches!(ch, '\r' | '\n' | '\0')
}

/// Replace each CR, LF and NUL with a single space.
///
/// ```
/// use slirc_proto::format::sanitize;
///
/// assert_eq!(sanitize("a\r\nb\0c"), "a  b c");
/// assert_eq!(sanitize("clean"), "clean");
/// ```
pub fn sanitize(data: &str) -> Cow<'_, str> {
    if data.contains(is_line_breaking) {
        Cow::Owned(data.replace(is_line_breaking, " "))
    } else {
        Cow::Borrowed(data)
    }
}

/// Build a complete outbound line.
///
/// Arguments are joined with single spaces; `text`, when given, follows as a
/// ` :`-prefixed trailing parameter. The result is cut to
/// [`MAX_LINE_LEN`] characters and terminated with `\r\n`.
///
/// ```
/// use slirc_proto::format::line;
///
/// assert_eq!(line(&["JOIN", "#rust"], None), "JOIN #rust\r\n");
/// assert_eq!(line(&["PRIVMSG", "#rust"], Some("hi all")), "PRIVMSG #rust :hi all\r\n");
/// ```
pub fn line<A: AsRef<str>>(args: &[A], text: Option<&str>) -> String {
    let mut out = args
        .iter()
        .map(|arg| sanitize(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ");

    if let Some(text) = text {
        out.push_str(" :");
        out.push_str(&sanitize(text));
    }

    if let Some((idx, _)) = out.char_indices().nth(MAX_LINE_LEN) {
        out.truncate(idx);
    }
    out.push_str(LINE_TERMINATOR);
    out
}
