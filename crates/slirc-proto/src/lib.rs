//! # slirc-proto
//!
//! Client-side IRC line handling for slircbot.
//!
//! ## Features
//!
//! - Newline framing with a bounded partial-line buffer ([`line::LineCodec`])
//! - UTF-8 decoding with a Latin-1 fallback, so inbound decoding never fails
//! - Tolerant `:prefix verb target ... :trailing` splitting ([`RawMessage`])
//! - Injection-safe outbound line formatting ([`format::line`])
//! - Named formatting and color codes ([`colors`]) and CTCP ACTION framing ([`ctcp`])
//!
//! ## Quick Start
//!
//! ```rust
//! use slirc_proto::{format, RawMessage};
//!
//! let raw: RawMessage = ":alice!a@host PRIVMSG #rust :hello there".parse().unwrap();
//! assert_eq!(raw.command.as_deref(), Some("PRIVMSG"));
//! assert_eq!(raw.target.as_deref(), Some("#rust"));
//! assert_eq!(raw.trailing, "hello there");
//!
//! let out = format::line(&["PRIVMSG", "alice"], Some("hi\r\nQUIT"));
//! assert_eq!(out, "PRIVMSG alice :hi  QUIT\r\n");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod colors;
pub mod ctcp;
pub mod error;
pub mod format;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod prefix;

pub use self::error::{MessageParseError, ProtocolError};
#[cfg(feature = "tokio")]
pub use self::line::{decode_line, LineCodec};
pub use self::message::RawMessage;
pub use self::prefix::Prefix;
