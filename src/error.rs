//! Unified error handling for slircbot.
//!
//! Each layer has its own error enum. None of them is fatal to the process
//! except where `main` decides so; the dispatch loop logs and carries on.

use std::path::PathBuf;

use slirc_proto::MessageParseError;
use thiserror::Error;

// ============================================================================
// Parse Errors (inbound lines)
// ============================================================================

/// A line that could not be turned into a [`Message`](crate::message::Message).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed line: {0}")]
    Malformed(#[from] MessageParseError),
}

// ============================================================================
// Plugin Errors (load / unload)
// ============================================================================

/// Errors raised while loading or unloading a plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read plugin {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile plugin {plugin}: {source}")]
    Compile {
        plugin: String,
        #[source]
        source: rhai::ParseError,
    },

    #[error("plugin {plugin} failed: {source}")]
    Script {
        plugin: String,
        #[source]
        source: Box<rhai::EvalAltResult>,
    },

    #[error("plugin {plugin}: action '{action}' has a bad pattern: {source}")]
    Pattern {
        plugin: String,
        action: String,
        #[source]
        source: regex::Error,
    },

    #[error("plugin {plugin}: handler '{handler}' is not defined")]
    MissingHandler { plugin: String, handler: String },

    #[error("plugin {plugin}: handler '{handler}' takes {arity} arguments, expected 1 or 2")]
    BadArity {
        plugin: String,
        handler: String,
        arity: usize,
    },
}

// ============================================================================
// Handler Errors (dispatch)
// ============================================================================

/// Errors raised while an action handles a message.
///
/// These are isolated per action: the owning plugin logs them and moves on
/// to its next action.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("action '{0}' was not compiled")]
    NotCompiled(String),

    #[error("handler '{handler}' failed: {source}")]
    Script {
        handler: String,
        #[source]
        source: Box<rhai::EvalAltResult>,
    },
}

// ============================================================================
// Connection Errors (transport)
// ============================================================================

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] slirc_proto::ProtocolError),

    /// The outbound worker is gone; nothing more can be sent.
    #[error("connection closed")]
    Closed,

    #[error("not connected")]
    NotConnected,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for ConnectionError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::Closed
    }
}
