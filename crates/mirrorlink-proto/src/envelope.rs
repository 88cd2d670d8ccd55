//! The wire envelope shared by both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ProtocolError, Result};

/// One named event with a JSON body.
///
/// Outbound, `data` is an object carrying the room, user and client type plus
/// command-specific fields. Inbound, `data` is whatever the mirror sent and is
/// opaque to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event (or command) name, e.g. `join` or `client-join`.
    pub event: String,
    /// Event body. Missing bodies decode as `null`.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Largest line accepted by [`Envelope::decode_line`].
    pub const MAX_LINE_SIZE: usize = 64 * 1024;

    /// Build an envelope.
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self { event: event.into(), data }
    }

    /// Encode as a single newline-terminated JSON line.
    pub fn encode_line(&self) -> Result<Vec<u8>> {
        let mut buf = serde_json::to_vec(self)?;
        buf.push(b'\n');
        Ok(buf)
    }

    /// Decode one line, with or without its trailing newline.
    ///
    /// Rejects oversized lines before parsing and envelopes whose event name
    /// is empty.
    pub fn decode_line(line: &[u8]) -> Result<Self> {
        if line.len() > Self::MAX_LINE_SIZE {
            return Err(ProtocolError::EnvelopeTooLarge {
                size: line.len(),
                max: Self::MAX_LINE_SIZE,
            });
        }

        let trimmed = line.strip_suffix(b"\n").unwrap_or(line);
        let trimmed = trimmed.strip_suffix(b"\r").unwrap_or(trimmed);

        let envelope: Self = serde_json::from_slice(trimmed)?;
        if envelope.event.is_empty() {
            return Err(ProtocolError::EmptyEventName);
        }
        Ok(envelope)
    }
}
