//! Event dispatcher.
//!
//! Outbound, wraps a typed [`Command`] in the wire envelope:
//!
//! ```text
//! { "event": "<command>", "data": { "room", "userId", "type": "mobile", ...fields } }
//! ```
//!
//! Inbound, demultiplexes raw envelopes into [`InboundEvent`]s. Unknown event
//! names are dropped without error so newer mirrors can add events freely.

use mirrorlink_proto::{CLIENT_TYPE, Command, Envelope, InboundEvent, RoomId};
use serde_json::{Map, Value};
use tracing::trace;

/// Serializes commands and recognises inbound events.
#[derive(Debug, Clone, Default)]
pub struct EventDispatcher {
    user_id: String,
}

impl EventDispatcher {
    /// Create a dispatcher stamping `user_id` on every command.
    ///
    /// Anonymous sessions pass `None`, which is sent as an empty string.
    pub fn new(user_id: Option<String>) -> Self {
        Self { user_id: user_id.unwrap_or_default() }
    }

    /// User id stamped on outbound commands.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Build the envelope for `command` addressed to `room`.
    pub fn encode(&self, command: &Command, room: &RoomId) -> Envelope {
        let mut data = Map::new();
        data.insert("room".into(), Value::String(room.as_str().to_string()));
        data.insert("userId".into(), Value::String(self.user_id.clone()));
        data.insert("type".into(), Value::String(CLIENT_TYPE.to_string()));
        data.extend(command.fields());

        Envelope::new(command.name().as_str(), Value::Object(data))
    }

    /// Match an inbound envelope against the known listeners.
    pub fn decode(&self, envelope: &Envelope) -> Option<InboundEvent> {
        let event = InboundEvent::from_envelope(envelope);
        if event.is_none() {
            trace!(event = %envelope.event, "dropping unrecognised event");
        }
        event
    }
}
