//! Mirror pairing core logic
//!
//! Pure state machines for pairing a mobile client with a smart mirror,
//! completely decoupled from I/O.
//!
//! # Architecture
//!
//! Every component here is a deterministic state machine. Time is passed in
//! by the caller, nothing touches a socket or a clock, and every transition
//! returns declarative actions ([`session::SessionAction`]) describing the
//! effects to perform: open or close the transport, send an envelope, arm or
//! cancel the join timer, notify observers. A runtime (or a test) executes
//! those actions in order and feeds the results back in as events.
//!
//! Keeping the session pure means the same code runs behind the tokio
//! runtime, in unit tests that step time by hand, and in the simulation
//! harness.
//!
//! # Components
//!
//! - [`endpoint`]: Endpoint resolution from build flag and configuration
//! - [`connection`]: Connection lifecycle (idle, connecting, connected)
//! - [`watchdog`]: Generation-stamped one-shot join timer
//! - [`dispatcher`]: Typed commands to envelopes and back
//! - [`session`]: The pairing state machine tying it all together
//! - [`store`]: Persistence of the scanned room identifier
//! - [`signal`]: Observable signals for UI collaborators

pub mod connection;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod session;
pub mod signal;
pub mod store;
pub mod watchdog;

pub use connection::{Connection, ConnectionAction, ConnectionSignal, ConnectionState};
pub use dispatcher::EventDispatcher;
pub use endpoint::{Endpoint, EndpointConfig};
pub use error::StoreError;
pub use session::{
    JOIN_TIMEOUT, ROOM_UNREACHABLE, RoomSession, SessionAction, SessionConfig, SessionEvent,
    SessionState,
};
pub use signal::SessionSignal;
pub use store::{MemoryStore, ROOM_KEY, RoomStore};
pub use watchdog::{JoinWatchdog, WatchdogToken};
