//! Deterministic simulation harness for mirror pairing tests.
//!
//! - [`ScriptedTransport`]: in-memory transport whose far end ([`MirrorRemote`])
//!   is driven by the test
//! - [`SimConnector`]/[`SimTransport`]: the production line transport over
//!   turmoil's simulated TCP
//! - [`sim_mirror`]: a simulated mirror server to run as a turmoil host
//! - [`ModelSession`]: reference model of the pairing state machine for
//!   model-based property tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod scripted;
pub mod sim_mirror;
pub mod sim_transport;

pub use model::{MODEL_ROOMS, ModelSession, Observation, Operation, render};
pub use scripted::{MirrorRemote, ScriptedTransport, TransportEvent};
pub use sim_mirror::{MIRROR_PORT, MirrorBehavior, MirrorLog};
pub use sim_transport::{SimConnector, SimTransport};
