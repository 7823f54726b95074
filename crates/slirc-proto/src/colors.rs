//! Named IRC formatting codes and template expansion.
//!
//! # IRC Format Codes
//! - 0x02 (^B): Bold
//! - 0x03 (^C): Color (followed by a two-digit color number)
//! - 0x0F (^O): Reset all formatting
//! - 0x16 (^V): Reverse/Inverse
//! - 0x1D (^]): Italic
//! - 0x1F (^_): Underline

/// Read-only table of style names and their control sequences.
///
/// Colors have a long name and, where one exists, a short alias
/// (`dark_blue` / `dblue`).
pub const STYLES: &[(&str, &str)] = &[
    ("bold", "\x02"),
    ("reset", "\x0F"),
    ("italic", "\x1D"),
    ("reverse", "\x16"),
    ("underline", "\x1F"),
    ("white", "\x0300"),
    ("black", "\x0301"),
    ("dark_blue", "\x0302"),
    ("dblue", "\x0302"),
    ("dark_green", "\x0303"),
    ("dgreen", "\x0303"),
    ("dark_red", "\x0304"),
    ("dred", "\x0304"),
    ("brownish", "\x0305"),
    ("brown", "\x0305"),
    ("dark_purple", "\x0306"),
    ("dpurple", "\x0306"),
    ("orange", "\x0307"),
    ("yellow", "\x0308"),
    ("light_green", "\x0309"),
    ("lgreen", "\x0309"),
    ("dark_teal", "\x0310"),
    ("dteal", "\x0310"),
    ("light_teal", "\x0311"),
    ("lteal", "\x0311"),
    ("light_blue", "\x0312"),
    ("lblue", "\x0312"),
    ("light_purple", "\x0313"),
    ("lpurple", "\x0313"),
    ("dark_gray", "\x0314"),
    ("dgray", "\x0314"),
    ("light_gray", "\x0315"),
    ("lgray", "\x0315"),
];

/// Look up a style code by name.
pub fn style(name: &str) -> Option<&'static str> {
    STYLES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, code)| *code)
}

/// Expand `{name}` placeholders with style codes.
///
/// ```
/// use slirc_proto::colors::format;
///
/// assert_eq!(format("{bold}hi{reset}"), "\x02hi\x0F");
/// assert_eq!(format("{{literal}} {nope}"), "{literal} {nope}");
/// ```
pub fn format(template: &str) -> String {
    format_with(template, |_| None)
}

/// Expand `{name}` placeholders, consulting `lookup` before the style table.
///
/// Unknown names are left in place, braces included. `{{` and `}}` produce
/// literal braces.
pub fn format_with<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        match tail[1..].find(['{', '}']) {
            Some(close) if tail[1..].as_bytes()[close] == b'}' => {
                let key = &tail[1..1 + close];
                match lookup(key).or_else(|| style(key).map(str::to_owned)) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&tail[..close + 2]),
                }
                rest = &tail[close + 2..];
            }
            _ => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
