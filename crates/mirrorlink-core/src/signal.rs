//! Signals observable by the UI layer.

use std::fmt;

/// Lifecycle notifications published by the pairing session.
///
/// These are the only integration points UI collaborators may depend on.
/// They are delivered in the order the session produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    /// A connect was requested (raised on every request).
    WillConnect,
    /// The transport is established.
    DidConnect,
    /// The session went back to idle.
    DidDisconnect,
    /// A `join` was sent and the join timer armed.
    WillJoinRoom,
    /// The server acknowledged the join; the session is paired.
    DidJoinRoom,
    /// Something went wrong. The UI decides how to present it.
    DidError {
        /// Human readable message.
        message: String,
    },
}

impl SessionSignal {
    /// Stable signal name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WillConnect => "willConnect",
            Self::DidConnect => "didConnect",
            Self::DidDisconnect => "didDisconnect",
            Self::WillJoinRoom => "willJoinRoom",
            Self::DidJoinRoom => "didJoinRoom",
            Self::DidError { .. } => "didError",
        }
    }
}

impl fmt::Display for SessionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DidError { message } => write!(f, "{}({message})", self.name()),
            other => f.write_str(other.name()),
        }
    }
}
