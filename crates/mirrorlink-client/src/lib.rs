//! Async runtime for the mirror pairing session.
//!
//! A thin shell over [`mirrorlink_core::RoomSession`] that owns the transport
//! and the join timer on a single tokio task. Callers talk to it through a
//! cloneable [`SessionHandle`]; observers subscribe to the signal stream.
//!
//! # Components
//!
//! - [`SessionHandle`]: Fire-and-forget API plus signal subscription
//! - [`SessionRuntime`]: The single-writer task executing session actions
//! - [`Transport`]: Trait abstracting the persistent connection
//! - [`LineTransport`]: Newline-delimited JSON over any byte stream
//! - [`RedbStore`]: Durable room store

#![forbid(unsafe_code)]

mod error;
mod handle;
mod line;
mod runtime;
mod store;
mod transport;

pub use error::{ClientError, TransportError};
pub use handle::{SessionHandle, SessionSnapshot};
pub use line::{Connector, LineTransport, TcpConnector};
pub use runtime::{SIGNAL_CHANNEL_CAPACITY, SessionRuntime, spawn};
pub use store::RedbStore;
pub use transport::Transport;
