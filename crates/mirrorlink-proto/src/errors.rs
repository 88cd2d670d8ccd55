//! Protocol error types.

use thiserror::Error;

/// Result alias for wire operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The JSON layer rejected the input.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A line exceeded the maximum accepted size.
    #[error("envelope too large: {size} bytes (max {max})")]
    EnvelopeTooLarge {
        /// Size of the rejected line.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// Envelope carried an empty event name.
    #[error("envelope has an empty event name")]
    EmptyEventName,

    /// Room identifiers must contain at least one non-whitespace character.
    #[error("room identifier is empty")]
    EmptyRoomId,

    /// Command name not recognised.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}
