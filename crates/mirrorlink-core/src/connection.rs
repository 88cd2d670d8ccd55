//! Connection lifecycle state machine.
//!
//! Owns the single persistent connection to the mirror server and turns raw
//! transport callbacks into lifecycle signals.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ connect ┌────────────┐ connected ┌───────────┐
//! │ Idle │────────>│ Connecting │──────────>│ Connected │
//! └──────┘         └────────────┘           └───────────┘
//!                        │ failed/closed          │ closed/disconnect
//!                        ↓                        ↓
//!                   ┌──────────────┐              │
//!                   │ Disconnected │<─────────────┘
//!                   └──────────────┘
//! ```
//!
//! # Policy
//!
//! - `connect` raises `WillConnect` on every call but opens a transport only
//!   from `Idle` or `Disconnected`.
//! - Transport errors are reported, never acted upon.
//! - There is no automatic reconnect. A dropped connection stays dropped until
//!   the next explicit `connect`.

use tracing::{debug, info};

use crate::endpoint::Endpoint;

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a transport to this endpoint
    Open(Endpoint),
    /// Tear the transport down
    Close,
    /// Raise a lifecycle signal
    Signal(ConnectionSignal),
}

/// Transport-level lifecycle signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSignal {
    /// Connect requested
    WillConnect,
    /// Transport established
    DidConnect,
    /// Transport reported an error
    DidError(String),
    /// Transport gone
    DidDisconnect,
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected
    Idle,
    /// Transport is being opened
    Connecting,
    /// Transport established
    Connected,
    /// Transport closed (explicitly, by the peer, or after a failed open)
    Disconnected,
}

/// Connection state machine.
#[derive(Debug, Clone)]
pub struct Connection {
    state: ConnectionState,
    endpoint: Endpoint,
    opened: u64,
}

impl Connection {
    /// Create an idle connection targeting `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self { state: ConnectionState::Idle, endpoint, opened: 0 }
    }

    /// Get current state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True only when the transport is fully established.
    pub fn is_active(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Number of transports opened over the lifetime of this connection.
    pub fn transports_opened(&self) -> u64 {
        self.opened
    }

    /// Request a connection.
    ///
    /// Always raises `WillConnect`. Emits `Open` only when no transport is
    /// open or being opened.
    pub fn connect(&mut self) -> Vec<ConnectionAction> {
        let mut actions = vec![ConnectionAction::Signal(ConnectionSignal::WillConnect)];

        match self.state {
            ConnectionState::Idle | ConnectionState::Disconnected => {
                info!(endpoint = %self.endpoint, "opening transport");
                self.state = ConnectionState::Connecting;
                self.opened += 1;
                actions.push(ConnectionAction::Open(self.endpoint.clone()));
            },
            ConnectionState::Connecting | ConnectionState::Connected => {
                debug!(state = ?self.state, "connect while already active, not reopening");
            },
        }

        actions
    }

    /// Transport reported that it is established.
    pub fn on_connected(&mut self) -> Vec<ConnectionAction> {
        if self.state != ConnectionState::Connecting {
            debug!(state = ?self.state, "ignoring late connected callback");
            return vec![];
        }

        info!(endpoint = %self.endpoint, "transport connected");
        self.state = ConnectionState::Connected;
        vec![ConnectionAction::Signal(ConnectionSignal::DidConnect)]
    }

    /// Transport could not be opened.
    pub fn on_connect_failed(&mut self, message: String) -> Vec<ConnectionAction> {
        if self.state != ConnectionState::Connecting {
            debug!(state = ?self.state, "ignoring late connect failure");
            return vec![];
        }

        info!(endpoint = %self.endpoint, %message, "transport failed to open");
        self.state = ConnectionState::Disconnected;
        vec![ConnectionAction::Signal(ConnectionSignal::DidError(message))]
    }

    /// Transport is attempting to reconnect on its own.
    ///
    /// Logged only; reconnection is disabled so this never changes state.
    pub fn on_reconnect_attempt(&self, attempt: u32) -> Vec<ConnectionAction> {
        info!(attempt, "transport reconnect attempt");
        vec![]
    }

    /// Transport reported an error. No transition.
    pub fn on_error(&self, message: String) -> Vec<ConnectionAction> {
        debug!(state = ?self.state, %message, "transport error");
        vec![ConnectionAction::Signal(ConnectionSignal::DidError(message))]
    }

    /// Transport closed underneath us.
    pub fn on_closed(&mut self) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                info!(endpoint = %self.endpoint, "transport closed by peer");
                self.state = ConnectionState::Disconnected;
                vec![ConnectionAction::Signal(ConnectionSignal::DidDisconnect)]
            },
            ConnectionState::Idle | ConnectionState::Disconnected => vec![],
        }
    }

    /// Tear the transport down, whatever the current state.
    pub fn disconnect(&mut self) -> Vec<ConnectionAction> {
        debug!(state = ?self.state, "disconnect");
        self.state = ConnectionState::Disconnected;
        vec![ConnectionAction::Close, ConnectionAction::Signal(ConnectionSignal::DidDisconnect)]
    }
}
