//! Error types for the IRC protocol library.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse an IRC line.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The line that failed to parse.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when parsing IRC lines.
///
/// The parser is deliberately lenient: missing verbs, targets and trailing
/// text are all legal. Only structurally broken lines are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MessageParseError {
    /// A `:prefix` was not followed by a space and a command.
    #[error("prefix is not followed by a command")]
    UnterminatedPrefix,
}
