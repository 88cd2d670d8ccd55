//! Client error types.

use mirrorlink_proto::ProtocolError;
use thiserror::Error;

/// Errors raised by a [`crate::Transport`].
///
/// The runtime never propagates these. Socket failures become `DidError`
/// signals; malformed input is logged and dropped.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer sent something that is not an envelope.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Peer sent a line longer than the framing allows.
    #[error("inbound line exceeds {max} bytes")]
    LineTooLong {
        /// Largest accepted line
        max: usize,
    },

    /// Operation needs an open transport.
    #[error("transport is not connected")]
    NotConnected,

    /// Connect did not complete in time.
    #[error("connect timed out")]
    ConnectTimeout,
}

impl TransportError {
    /// Whether the peer sent bad input, as opposed to the socket failing.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::LineTooLong { .. })
    }
}

/// Errors returned by [`crate::SessionHandle`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The session task has stopped.
    #[error("session runtime is not running")]
    Closed,
}
