//! Wire format for the mirror pairing protocol.
//!
//! Every message on the wire is an [`Envelope`]: an event name plus a JSON
//! body. Outbound envelopes are built from a typed [`Command`]; inbound
//! envelopes are matched against the small set of [`InboundEvent`]s the
//! mobile client listens for. Anything else is forward-compatible noise and
//! is dropped by the caller.
//!
//! Framing is newline-delimited JSON: one envelope object per line. Maps keep
//! insertion order so the encoded bytes are stable across runs.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod envelope;
pub mod errors;
pub mod event;
pub mod room;

pub use command::{CLIENT_TYPE, Command, CommandName};
pub use envelope::Envelope;
pub use errors::{ProtocolError, Result};
pub use event::InboundEvent;
pub use room::RoomId;
