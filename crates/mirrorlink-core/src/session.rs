//! Room session: the pairing state machine.
//!
//! Drives a connection from idle to paired with a mirror and keeps it there
//! until the user leaves or the link drops.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ connect ┌────────────┐ connected ┌───────────┐ join ┌─────────────┐ client-join ┌────────┐
//! │ Idle │────────>│ Connecting │──────────>│ Connected │─────>│ JoiningRoom │────────────>│ Paired │
//! └──────┘         └────────────┘           └───────────┘      └─────────────┘             └────────┘
//!    ↑                   │ open failed                                │ watchdog                 │ exit
//!    │                   ↓                                            ↓                          │
//!    │              ┌────────┐                              didError + disconnect                │
//!    │              │ Failed │                                        │                          │
//!    │              └────────┘                                        │                          │
//!    └────────────────────────────────────────────────────────────────┴──────────────────────────┘
//! ```
//!
//! `disconnect` returns to `Idle` from anywhere and clears the stored room.
//! A transport drop also returns to `Idle` but keeps the room.
//!
//! # Guards
//!
//! - `join_room` needs `Connected` and a stored room.
//! - Selection commands need `Paired`. Only `join` and `client-leave` are
//!   exempt.
//!
//! Guard violations are silent no-ops. UI races (a tap landing just as the
//! room is torn down) must not surface as errors.
//!
//! # Join timeout
//!
//! Sending `join` arms the [`JoinWatchdog`]. The acknowledgment cancels it
//! before `DidJoinRoom` is raised, so exactly one of `DidJoinRoom` or the
//! timeout's `DidError` + disconnect happens per attempt.

use std::time::{Duration, Instant};

use mirrorlink_proto::{Command, Envelope, InboundEvent, RoomId};
use tracing::{debug, info, warn};

use crate::{
    connection::{Connection, ConnectionAction, ConnectionSignal},
    dispatcher::EventDispatcher,
    endpoint::{Endpoint, EndpointConfig},
    signal::SessionSignal,
    store::RoomStore,
    watchdog::{JoinWatchdog, WatchdogToken},
};

/// How long a `join` may stay unacknowledged.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Error raised when the join times out.
pub const ROOM_UNREACHABLE: &str = "Room cannot be reached.";

/// Pairing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport
    Idle,
    /// Transport being opened
    Connecting,
    /// Transport up, not in a room
    Connected,
    /// `join` sent, waiting for `client-join`
    JoiningRoom,
    /// In a room; selection commands flow
    Paired,
    /// Last transport open failed
    Failed,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where to connect
    pub endpoint: EndpointConfig,
    /// User id stamped on outbound commands
    pub user_id: Option<String>,
    /// Join acknowledgment deadline
    pub join_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { endpoint: EndpointConfig::default(), user_id: None, join_timeout: JOIN_TIMEOUT }
    }
}

/// Inputs to the session.
///
/// API calls and transport callbacks share one enum so a driver can funnel
/// everything through a single queue.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Open the connection.
    Connect,
    /// Tear everything down and forget the room.
    Disconnect,
    /// Join the stored room.
    JoinRoom,
    /// Leave the room, then disconnect.
    ExitSession,
    /// A room QR code was scanned.
    RoomScanned(RoomId),
    /// Toggle whether scans may start pairing.
    SetEnabled(bool),
    /// Send a command to the mirror.
    Send(Command),
    /// Transport established.
    TransportConnected,
    /// Transport could not be opened.
    TransportConnectFailed {
        /// Failure description
        message: String,
    },
    /// Transport is retrying on its own.
    TransportReconnectAttempt {
        /// Attempt number
        attempt: u32,
    },
    /// Transport reported an error.
    TransportError {
        /// Error description
        message: String,
    },
    /// Transport closed by the peer.
    TransportClosed,
    /// An envelope arrived.
    Inbound(Envelope),
    /// The join timer armed with this token expired.
    WatchdogFired(WatchdogToken),
}

/// Effects for the driver to execute, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Open a transport and report back with `TransportConnected` or
    /// `TransportConnectFailed`.
    OpenTransport(Endpoint),
    /// Close the transport.
    CloseTransport,
    /// Write an envelope to the transport.
    Send(Envelope),
    /// Arm the join timer; report back with `WatchdogFired(token)`.
    ArmWatchdog {
        /// Token to report on expiry
        token: WatchdogToken,
        /// Expiry instant
        deadline: Instant,
    },
    /// Disarm the join timer.
    CancelWatchdog,
    /// Publish a signal to observers.
    Notify(SessionSignal),
}

/// The pairing state machine.
///
/// One per process by convention: only one mirror can be paired at a time.
/// Not thread-safe by design; drive it from a single task.
#[derive(Debug)]
pub struct RoomSession<S> {
    state: SessionState,
    connection: Connection,
    watchdog: JoinWatchdog,
    dispatcher: EventDispatcher,
    store: S,
    join_timeout: Duration,
    enabled: bool,
    join_on_connect: bool,
    joined_room: Option<RoomId>,
}

impl<S: RoomStore> RoomSession<S> {
    /// Create an idle session.
    pub fn new(config: SessionConfig, store: S) -> Self {
        Self {
            state: SessionState::Idle,
            connection: Connection::new(config.endpoint.resolve()),
            watchdog: JoinWatchdog::new(),
            dispatcher: EventDispatcher::new(config.user_id),
            store,
            join_timeout: config.join_timeout,
            enabled: true,
            join_on_connect: false,
            joined_room: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True when the transport is fully established.
    pub fn is_active(&self) -> bool {
        self.connection.is_active()
    }

    /// True when selection commands may be sent.
    pub fn is_paired(&self) -> bool {
        self.state == SessionState::Paired
    }

    /// Whether scans may start pairing.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Room of the current (or in-progress) join.
    pub fn joined_room(&self) -> Option<&RoomId> {
        self.joined_room.as_ref()
    }

    /// Room currently persisted. Store failures read as `None`.
    pub fn stored_room(&self) -> Option<RoomId> {
        match self.store.load() {
            Ok(room) => room,
            Err(error) => {
                warn!(%error, "failed to read stored room");
                None
            },
        }
    }

    /// Connection state machine.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Expiry of the pending join timer, if any.
    pub fn watchdog_deadline(&self) -> Option<(WatchdogToken, Instant)> {
        self.watchdog.token().zip(self.watchdog.deadline())
    }

    /// Process one event.
    pub fn handle(&mut self, event: SessionEvent, now: Instant) -> Vec<SessionAction> {
        match event {
            SessionEvent::Connect => self.connect(),
            SessionEvent::Disconnect => self.disconnect(),
            SessionEvent::JoinRoom => self.join_room(now),
            SessionEvent::ExitSession => self.exit_session(),
            SessionEvent::RoomScanned(room) => self.room_scanned(room, now),
            SessionEvent::SetEnabled(enabled) => {
                self.set_enabled(enabled);
                vec![]
            },
            SessionEvent::Send(command) => self.send(command, now),
            SessionEvent::TransportConnected => self.on_transport_connected(now),
            SessionEvent::TransportConnectFailed { message } => {
                self.on_transport_connect_failed(message)
            },
            SessionEvent::TransportReconnectAttempt { attempt } => {
                Self::translate(self.connection.on_reconnect_attempt(attempt))
            },
            SessionEvent::TransportError { message } => {
                Self::translate(self.connection.on_error(message))
            },
            SessionEvent::TransportClosed => self.on_transport_closed(),
            SessionEvent::Inbound(envelope) => self.on_inbound(&envelope),
            SessionEvent::WatchdogFired(token) => self.on_watchdog_fired(token),
        }
    }

    /// Poll the join timer. For drivers that tick instead of scheduling.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionAction> {
        match self.watchdog.expired(now) {
            Some(token) => self.on_watchdog_fired(token),
            None => vec![],
        }
    }

    /// Request a connection. Raises `WillConnect` on every call.
    pub fn connect(&mut self) -> Vec<SessionAction> {
        let actions = self.connection.connect();
        if actions.iter().any(|action| matches!(action, ConnectionAction::Open(_))) {
            self.transition(SessionState::Connecting);
        }
        Self::translate(actions)
    }

    /// Tear down from any state and forget the stored room.
    pub fn disconnect(&mut self) -> Vec<SessionAction> {
        let mut actions = self.reset();
        if let Err(error) = self.store.clear() {
            warn!(%error, "failed to clear stored room");
        }
        actions.extend(Self::translate(self.connection.disconnect()));
        actions
    }

    /// Send `join` for the stored room and arm the join timer.
    pub fn join_room(&mut self, now: Instant) -> Vec<SessionAction> {
        if self.state != SessionState::Connected {
            debug!(state = ?self.state, "join requested while not connected, ignoring");
            return vec![];
        }
        let Some(room) = self.stored_room() else {
            debug!("join requested without a stored room, ignoring");
            return vec![];
        };

        info!(%room, "joining room");
        self.join_on_connect = false;
        self.transition(SessionState::JoiningRoom);

        let envelope = self.dispatcher.encode(&Command::Join, &room);
        let token = self.watchdog.start(now, self.join_timeout);
        self.joined_room = Some(room);

        vec![
            SessionAction::Notify(SessionSignal::WillJoinRoom),
            SessionAction::Send(envelope),
            SessionAction::ArmWatchdog { token, deadline: now + self.join_timeout },
        ]
    }

    /// Leave the room (when paired) and disconnect.
    pub fn exit_session(&mut self) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        match (self.state, &self.joined_room) {
            (SessionState::Paired, Some(room)) => {
                info!(%room, "leaving room");
                actions.push(SessionAction::Send(
                    self.dispatcher.encode(&Command::ClientLeave, room),
                ));
            },
            _ => debug!(state = ?self.state, "exit while not paired, skipping client-leave"),
        }
        actions.extend(self.disconnect());
        actions
    }

    /// Send a command, subject to the pairing guard.
    pub fn send(&mut self, command: Command, now: Instant) -> Vec<SessionAction> {
        match command {
            Command::Join => return self.join_room(now),
            Command::ClientLeave => return self.exit_session(),
            _ => {},
        }

        if self.state != SessionState::Paired {
            debug!(command = %command.name(), state = ?self.state, "not paired, dropping command");
            return vec![];
        }
        let Some(room) = &self.joined_room else {
            return vec![];
        };

        vec![SessionAction::Send(self.dispatcher.encode(&command, room))]
    }

    /// Handle a scanned room: persist it, connect, and join once connected.
    ///
    /// Ignored entirely while pairing is disabled.
    pub fn room_scanned(&mut self, room: RoomId, now: Instant) -> Vec<SessionAction> {
        if !self.enabled {
            debug!(%room, "pairing disabled, ignoring scan");
            return vec![];
        }

        info!(%room, "room scanned");
        if let Err(error) = self.store.save(&room) {
            warn!(%error, "failed to persist scanned room");
        }
        self.join_on_connect = true;

        let mut actions = self.connect();
        if self.state == SessionState::Connected {
            actions.extend(self.join_room(now));
        }
        actions
    }

    /// Allow or block scan-initiated pairing.
    pub fn set_enabled(&mut self, enabled: bool) {
        debug!(enabled, "pairing gate");
        self.enabled = enabled;
    }

    fn on_transport_connected(&mut self, now: Instant) -> Vec<SessionAction> {
        let signals = self.connection.on_connected();
        if signals.is_empty() {
            return vec![];
        }

        self.transition(SessionState::Connected);
        let mut actions = Self::translate(signals);
        if self.join_on_connect {
            actions.extend(self.join_room(now));
        }
        actions
    }

    fn on_transport_connect_failed(&mut self, message: String) -> Vec<SessionAction> {
        let signals = self.connection.on_connect_failed(message);
        if signals.is_empty() {
            return vec![];
        }

        self.join_on_connect = false;
        self.transition(SessionState::Failed);
        Self::translate(signals)
    }

    fn on_transport_closed(&mut self) -> Vec<SessionAction> {
        let signals = self.connection.on_closed();
        if signals.is_empty() {
            return vec![];
        }

        let mut actions = self.reset();
        actions.extend(Self::translate(signals));
        actions
    }

    fn on_inbound(&mut self, envelope: &Envelope) -> Vec<SessionAction> {
        match self.dispatcher.decode(envelope) {
            Some(InboundEvent::ClientJoin { .. }) => self.on_client_join(),
            None => vec![],
        }
    }

    fn on_client_join(&mut self) -> Vec<SessionAction> {
        if self.state != SessionState::JoiningRoom {
            debug!(state = ?self.state, "unsolicited client-join, ignoring");
            return vec![];
        }

        let mut actions = Vec::new();
        if self.watchdog.cancel() {
            actions.push(SessionAction::CancelWatchdog);
        }
        self.transition(SessionState::Paired);
        actions.push(SessionAction::Notify(SessionSignal::DidJoinRoom));
        actions
    }

    fn on_watchdog_fired(&mut self, token: WatchdogToken) -> Vec<SessionAction> {
        if !self.watchdog.fire(token) {
            debug!(generation = token.generation(), "stale watchdog fire");
            return vec![];
        }
        if self.state != SessionState::JoiningRoom {
            return vec![];
        }

        warn!(room = ?self.joined_room, timeout = ?self.join_timeout, "join not acknowledged");
        let mut actions = vec![SessionAction::Notify(SessionSignal::DidError {
            message: ROOM_UNREACHABLE.to_string(),
        })];
        actions.extend(self.disconnect());
        actions
    }

    /// Back to idle without touching the store or the transport.
    fn reset(&mut self) -> Vec<SessionAction> {
        self.join_on_connect = false;
        self.joined_room = None;
        self.transition(SessionState::Idle);
        if self.watchdog.cancel() { vec![SessionAction::CancelWatchdog] } else { vec![] }
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            debug!(from = ?self.state, ?to, "session transition");
            self.state = to;
        }
    }

    fn translate(actions: Vec<ConnectionAction>) -> Vec<SessionAction> {
        actions
            .into_iter()
            .map(|action| match action {
                ConnectionAction::Open(endpoint) => SessionAction::OpenTransport(endpoint),
                ConnectionAction::Close => SessionAction::CloseTransport,
                ConnectionAction::Signal(signal) => SessionAction::Notify(match signal {
                    ConnectionSignal::WillConnect => SessionSignal::WillConnect,
                    ConnectionSignal::DidConnect => SessionSignal::DidConnect,
                    ConnectionSignal::DidError(message) => SessionSignal::DidError { message },
                    ConnectionSignal::DidDisconnect => SessionSignal::DidDisconnect,
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    fn room() -> RoomId {
        RoomId::new("ROOM42").unwrap()
    }

    fn session() -> RoomSession<MemoryStore> {
        RoomSession::new(SessionConfig::default(), MemoryStore::with_room(room()))
    }

    fn connected(t0: Instant) -> RoomSession<MemoryStore> {
        let mut session = session();
        session.handle(SessionEvent::Connect, t0);
        session.handle(SessionEvent::TransportConnected, t0);
        assert_eq!(session.state(), SessionState::Connected);
        session
    }

    fn paired(t0: Instant) -> RoomSession<MemoryStore> {
        let mut session = connected(t0);
        session.handle(SessionEvent::JoinRoom, t0);
        session.handle(SessionEvent::Inbound(Envelope::new("client-join", json!({}))), t0);
        assert_eq!(session.state(), SessionState::Paired);
        session
    }

    fn signals(actions: &[SessionAction]) -> Vec<SessionSignal> {
        actions
            .iter()
            .filter_map(|action| match action {
                SessionAction::Notify(signal) => Some(signal.clone()),
                _ => None,
            })
            .collect()
    }

    fn sent(actions: &[SessionAction]) -> Vec<&Envelope> {
        actions
            .iter()
            .filter_map(|action| match action {
                SessionAction::Send(envelope) => Some(envelope),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn connect_from_idle_opens_transport() {
        let t0 = Instant::now();
        let mut session = session();

        let actions = session.handle(SessionEvent::Connect, t0);
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(actions[0], SessionAction::Notify(SessionSignal::WillConnect));
        assert!(matches!(actions[1], SessionAction::OpenTransport(_)));
        assert!(!session.is_active());

        let actions = session.handle(SessionEvent::TransportConnected, t0);
        assert_eq!(actions, vec![SessionAction::Notify(SessionSignal::DidConnect)]);
        assert!(session.is_active());
    }

    #[test]
    fn repeated_connect_opens_one_transport() {
        let t0 = Instant::now();
        let mut session = session();
        session.handle(SessionEvent::Connect, t0);

        let actions = session.handle(SessionEvent::Connect, t0);
        assert_eq!(actions, vec![SessionAction::Notify(SessionSignal::WillConnect)]);

        session.handle(SessionEvent::TransportConnected, t0);
        let actions = session.handle(SessionEvent::Connect, t0);
        assert_eq!(actions, vec![SessionAction::Notify(SessionSignal::WillConnect)]);
        assert_eq!(session.connection().transports_opened(), 1);
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn join_sends_handshake_and_arms_watchdog() {
        let t0 = Instant::now();
        let mut session = connected(t0);

        let actions = session.handle(SessionEvent::JoinRoom, t0);
        assert_eq!(session.state(), SessionState::JoiningRoom);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], SessionAction::Notify(SessionSignal::WillJoinRoom));
        assert_eq!(
            sent(&actions),
            vec![&Envelope::new(
                "join",
                json!({ "room": "ROOM42", "userId": "", "type": "mobile" })
            )]
        );
        assert!(matches!(
            actions[2],
            SessionAction::ArmWatchdog { deadline, .. } if deadline == t0 + JOIN_TIMEOUT
        ));
    }

    #[test]
    fn join_requires_connection() {
        let t0 = Instant::now();
        let mut session = session();
        assert!(session.handle(SessionEvent::JoinRoom, t0).is_empty());

        session.handle(SessionEvent::Connect, t0);
        assert!(session.handle(SessionEvent::JoinRoom, t0).is_empty());
        assert_eq!(session.state(), SessionState::Connecting);
    }

    #[test]
    fn join_requires_stored_room() {
        let t0 = Instant::now();
        let mut session = RoomSession::new(SessionConfig::default(), MemoryStore::new());
        session.handle(SessionEvent::Connect, t0);
        session.handle(SessionEvent::TransportConnected, t0);

        assert!(session.handle(SessionEvent::JoinRoom, t0).is_empty());
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn client_join_pairs_and_cancels_watchdog() {
        let t0 = Instant::now();
        let mut session = connected(t0);
        session.handle(SessionEvent::JoinRoom, t0);

        let t1 = t0 + Duration::from_secs(1);
        let actions =
            session.handle(SessionEvent::Inbound(Envelope::new("client-join", json!({}))), t1);
        assert_eq!(
            actions,
            vec![
                SessionAction::CancelWatchdog,
                SessionAction::Notify(SessionSignal::DidJoinRoom)
            ]
        );
        assert!(session.is_paired());
        assert!(session.watchdog_deadline().is_none());

        // Well past the original deadline nothing fires
        assert!(session.tick(t0 + Duration::from_secs(10)).is_empty());
        assert_eq!(session.state(), SessionState::Paired);
    }

    #[test]
    fn join_timeout_errors_then_disconnects() {
        let t0 = Instant::now();
        let mut session = connected(t0);
        session.handle(SessionEvent::JoinRoom, t0);

        assert!(session.tick(t0 + Duration::from_millis(4_999)).is_empty());

        let actions = session.tick(t0 + JOIN_TIMEOUT);
        assert_eq!(
            actions,
            vec![
                SessionAction::Notify(SessionSignal::DidError {
                    message: ROOM_UNREACHABLE.to_string()
                }),
                SessionAction::CloseTransport,
                SessionAction::Notify(SessionSignal::DidDisconnect),
            ]
        );
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.stored_room(), None);

        // A late acknowledgment changes nothing
        let actions = session
            .handle(SessionEvent::Inbound(Envelope::new("client-join", json!({}))), t0 + JOIN_TIMEOUT);
        assert!(actions.is_empty());
    }

    #[test]
    fn stale_watchdog_fire_after_disconnect_is_ignored() {
        let t0 = Instant::now();
        let mut session = connected(t0);
        session.handle(SessionEvent::JoinRoom, t0);
        let (token, _) = session.watchdog_deadline().unwrap();

        let actions = session.handle(SessionEvent::Disconnect, t0);
        assert_eq!(actions[0], SessionAction::CancelWatchdog);

        assert!(session.handle(SessionEvent::WatchdogFired(token), t0 + JOIN_TIMEOUT).is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn selection_commands_need_pairing() {
        let t0 = Instant::now();
        let mut session = connected(t0);

        let command = Command::TeaSelect { index: 2 };
        assert!(session.handle(SessionEvent::Send(command.clone()), t0).is_empty());

        session.handle(SessionEvent::JoinRoom, t0);
        assert!(session.handle(SessionEvent::Send(command), t0).is_empty());
    }

    #[test]
    fn selection_commands_flow_when_paired() {
        let t0 = Instant::now();
        let mut session = paired(t0);

        let actions = session.handle(SessionEvent::Send(Command::TeaSelect { index: 2 }), t0);
        assert_eq!(
            sent(&actions),
            vec![&Envelope::new(
                "tea-select",
                json!({ "room": "ROOM42", "userId": "", "type": "mobile", "index": 2 })
            )]
        );

        let actions = session
            .handle(SessionEvent::Send(Command::ViewTreatment { data: "{\"id\":9}".into() }), t0);
        assert_eq!(sent(&actions)[0].data["data"], json!("{\"id\":9}"));
    }

    #[test]
    fn exit_sends_leave_before_closing() {
        let t0 = Instant::now();
        let mut session = paired(t0);

        let actions = session.handle(SessionEvent::ExitSession, t0);
        assert_eq!(
            actions,
            vec![
                SessionAction::Send(Envelope::new(
                    "client-leave",
                    json!({ "room": "ROOM42", "userId": "", "type": "mobile" })
                )),
                SessionAction::CloseTransport,
                SessionAction::Notify(SessionSignal::DidDisconnect),
            ]
        );
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.stored_room(), None);
    }

    #[test]
    fn exit_while_not_paired_only_disconnects() {
        let t0 = Instant::now();
        let mut session = connected(t0);

        let actions = session.handle(SessionEvent::ExitSession, t0);
        assert!(sent(&actions).is_empty());
        assert_eq!(signals(&actions), vec![SessionSignal::DidDisconnect]);
    }

    #[test]
    fn disconnect_clears_identity() {
        let t0 = Instant::now();
        let mut session = paired(t0);

        session.handle(SessionEvent::Disconnect, t0);
        assert_eq!(session.stored_room(), None);
        assert!(session.joined_room().is_none());

        session.handle(SessionEvent::Connect, t0);
        session.handle(SessionEvent::TransportConnected, t0);
        assert!(session.handle(SessionEvent::JoinRoom, t0).is_empty());
    }

    #[test]
    fn disconnect_from_idle_still_notifies() {
        let t0 = Instant::now();
        let mut session = session();
        let actions = session.handle(SessionEvent::Disconnect, t0);
        assert_eq!(
            actions,
            vec![SessionAction::CloseTransport, SessionAction::Notify(SessionSignal::DidDisconnect)]
        );
    }

    #[test]
    fn transport_errors_do_not_transition() {
        let t0 = Instant::now();
        let mut session = connected(t0);
        session.handle(SessionEvent::JoinRoom, t0);

        let actions =
            session.handle(SessionEvent::TransportError { message: "write failed".into() }, t0);
        assert_eq!(signals(&actions), vec![SessionSignal::DidError {
            message: "write failed".into()
        }]);
        assert_eq!(session.state(), SessionState::JoiningRoom);
        assert!(session.watchdog_deadline().is_some());

        let actions = session.handle(SessionEvent::TransportReconnectAttempt { attempt: 1 }, t0);
        assert!(actions.is_empty());
    }

    #[test]
    fn peer_close_returns_to_idle_and_keeps_room() {
        let t0 = Instant::now();
        let mut session = connected(t0);
        session.handle(SessionEvent::JoinRoom, t0);

        let actions = session.handle(SessionEvent::TransportClosed, t0);
        assert_eq!(
            actions,
            vec![SessionAction::CancelWatchdog, SessionAction::Notify(SessionSignal::DidDisconnect)]
        );
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.stored_room(), Some(room()));
        assert!(session.tick(t0 + JOIN_TIMEOUT).is_empty());

        // No reconnect on our own
        assert!(session.handle(SessionEvent::TransportClosed, t0).is_empty());
    }

    #[test]
    fn failed_open_can_be_retried() {
        let t0 = Instant::now();
        let mut session = session();
        session.handle(SessionEvent::Connect, t0);

        let actions = session
            .handle(SessionEvent::TransportConnectFailed { message: "refused".into() }, t0);
        assert_eq!(signals(&actions), vec![SessionSignal::DidError { message: "refused".into() }]);
        assert_eq!(session.state(), SessionState::Failed);

        let actions = session.handle(SessionEvent::Connect, t0);
        assert!(actions.iter().any(|a| matches!(a, SessionAction::OpenTransport(_))));
        assert_eq!(session.state(), SessionState::Connecting);
    }

    #[test]
    fn scan_connects_then_joins() {
        let t0 = Instant::now();
        let mut session = RoomSession::new(SessionConfig::default(), MemoryStore::new());

        let actions = session.handle(SessionEvent::RoomScanned(room()), t0);
        assert!(actions.iter().any(|a| matches!(a, SessionAction::OpenTransport(_))));
        assert_eq!(session.stored_room(), Some(room()));

        let actions = session.handle(SessionEvent::TransportConnected, t0);
        assert_eq!(signals(&actions), vec![SessionSignal::DidConnect, SessionSignal::WillJoinRoom]);
        assert_eq!(session.state(), SessionState::JoiningRoom);
    }

    #[test]
    fn scan_while_connected_joins_immediately() {
        let t0 = Instant::now();
        let mut session = RoomSession::new(SessionConfig::default(), MemoryStore::new());
        session.handle(SessionEvent::Connect, t0);
        session.handle(SessionEvent::TransportConnected, t0);

        let actions = session.handle(SessionEvent::RoomScanned(room()), t0);
        assert_eq!(signals(&actions), vec![SessionSignal::WillConnect, SessionSignal::WillJoinRoom]);
        assert_eq!(sent(&actions)[0].event, "join");
    }

    #[test]
    fn disabled_gate_ignores_scans() {
        let t0 = Instant::now();
        let mut session = RoomSession::new(SessionConfig::default(), MemoryStore::new());
        session.handle(SessionEvent::SetEnabled(false), t0);
        assert!(!session.is_enabled());

        assert!(session.handle(SessionEvent::RoomScanned(room()), t0).is_empty());
        assert_eq!(session.stored_room(), None);
        assert_eq!(session.state(), SessionState::Idle);

        session.handle(SessionEvent::SetEnabled(true), t0);
        assert!(!session.handle(SessionEvent::RoomScanned(room()), t0).is_empty());
    }

    #[test]
    fn unknown_inbound_events_are_ignored() {
        let t0 = Instant::now();
        let mut session = connected(t0);
        session.handle(SessionEvent::JoinRoom, t0);

        let actions =
            session.handle(SessionEvent::Inbound(Envelope::new("mirror-sleep", json!(1))), t0);
        assert!(actions.is_empty());
        assert_eq!(session.state(), SessionState::JoiningRoom);
    }

    #[test]
    fn user_id_is_stamped_on_commands() {
        let t0 = Instant::now();
        let config = SessionConfig { user_id: Some("user-7".into()), ..Default::default() };
        let mut session = RoomSession::new(config, MemoryStore::with_room(room()));
        session.handle(SessionEvent::Connect, t0);
        session.handle(SessionEvent::TransportConnected, t0);

        let actions = session.handle(SessionEvent::JoinRoom, t0);
        assert_eq!(sent(&actions)[0].data["userId"], json!("user-7"));
    }
}
