//! Inbound events the mobile client listens for.

use serde_json::Value;

use crate::Envelope;

/// Events the pairing session reacts to.
///
/// Only the join acknowledgment exists today. New mirror-side events are
/// added here; anything not listed is ignored by [`InboundEvent::from_envelope`].
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// The server acknowledged our `join`.
    ClientJoin {
        /// Body sent with the acknowledgment (usually room metadata).
        data: Value,
    },
}

impl InboundEvent {
    /// Wire name of the join acknowledgment.
    pub const CLIENT_JOIN: &'static str = "client-join";

    /// Match an envelope against the known listener set.
    ///
    /// Returns `None` for unrecognised event names.
    pub fn from_envelope(envelope: &Envelope) -> Option<Self> {
        match envelope.event.as_str() {
            Self::CLIENT_JOIN => Some(Self::ClientJoin { data: envelope.data.clone() }),
            _ => None,
        }
    }

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClientJoin { .. } => Self::CLIENT_JOIN,
        }
    }
}
