//! Reference model of the pairing session.
//!
//! A deliberately flat re-statement of the pairing rules: plain fields, no
//! sub-machines, time in milliseconds. Model-based tests drive it side by
//! side with the real [`RoomSession`](mirrorlink_core::RoomSession) and
//! compare [`Observation`]s after every step.

use mirrorlink_core::{ROOM_UNREACHABLE, SessionAction, SessionEvent, SessionState};
use mirrorlink_proto::{Command, Envelope, RoomId};
use serde_json::json;

/// Join acknowledgment deadline, in model milliseconds.
pub const MODEL_JOIN_TIMEOUT_MS: u64 = 5_000;

/// Rooms the model scans. Indexed by [`Operation::Scan`].
pub const MODEL_ROOMS: [&str; 2] = ["ROOM42", "LOBBY"];

/// One step applied to both the model and the real session.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `connect()`
    Connect,
    /// `disconnect()`
    Disconnect,
    /// `join_room()`
    JoinRoom,
    /// `exit_session()`
    ExitSession,
    /// Scan of `MODEL_ROOMS[index % len]`
    Scan(usize),
    /// Toggle the pairing gate
    SetEnabled(bool),
    /// Send a command
    Send(Command),
    /// Transport opened
    TransportConnected,
    /// Transport failed to open
    TransportConnectFailed,
    /// Transport reported an error
    TransportError,
    /// Peer closed the transport
    TransportClosed,
    /// Mirror acknowledged a join
    ClientJoin,
    /// Mirror sent an event nobody handles
    UnknownInbound,
    /// Let time pass
    AdvanceTime {
        /// Milliseconds to advance
        millis: u64,
    },
}

impl Operation {
    /// The session event for this operation. `None` for time advances.
    pub fn event(&self) -> Option<SessionEvent> {
        let event = match self {
            Self::Connect => SessionEvent::Connect,
            Self::Disconnect => SessionEvent::Disconnect,
            Self::JoinRoom => SessionEvent::JoinRoom,
            Self::ExitSession => SessionEvent::ExitSession,
            Self::Scan(index) => SessionEvent::RoomScanned(RoomId::new(scan_room(*index)).ok()?),
            Self::SetEnabled(enabled) => SessionEvent::SetEnabled(*enabled),
            Self::Send(command) => SessionEvent::Send(command.clone()),
            Self::TransportConnected => SessionEvent::TransportConnected,
            Self::TransportConnectFailed => {
                SessionEvent::TransportConnectFailed { message: "connection refused".into() }
            },
            Self::TransportError => SessionEvent::TransportError { message: "socket error".into() },
            Self::TransportClosed => SessionEvent::TransportClosed,
            Self::ClientJoin => SessionEvent::Inbound(Envelope::new("client-join", json!({}))),
            Self::UnknownInbound => {
                SessionEvent::Inbound(Envelope::new("mirror-sleep", json!({})))
            },
            Self::AdvanceTime { .. } => return None,
        };
        Some(event)
    }
}

fn scan_room(index: usize) -> &'static str {
    MODEL_ROOMS[index % MODEL_ROOMS.len()]
}

/// What a step looked like from the outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// State after the step
    pub state: SessionState,
    /// Transport established after the step
    pub is_active: bool,
    /// Persisted room after the step
    pub stored_room: Option<String>,
    /// Effects of the step, rendered by [`render`], in order
    pub effects: Vec<String>,
}

/// Render an action the way the model records effects.
pub fn render(action: &SessionAction) -> String {
    match action {
        SessionAction::OpenTransport(_) => "open".to_string(),
        SessionAction::CloseTransport => "close".to_string(),
        SessionAction::Send(envelope) => format!("send {}", envelope.event),
        SessionAction::ArmWatchdog { .. } => "arm".to_string(),
        SessionAction::CancelWatchdog => "cancel".to_string(),
        SessionAction::Notify(signal) => format!("notify {signal}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Down,
    Opening,
    Up,
}

/// Reference model of the pairing session.
#[derive(Debug, Clone)]
pub struct ModelSession {
    state: SessionState,
    link: Link,
    stored_room: Option<String>,
    enabled: bool,
    join_on_connect: bool,
    join_deadline: Option<u64>,
    now: u64,
    effects: Vec<String>,
}

impl ModelSession {
    /// Idle session with `stored_room` already persisted.
    pub fn new(stored_room: Option<&str>) -> Self {
        Self {
            state: SessionState::Idle,
            link: Link::Down,
            stored_room: stored_room.map(str::to_string),
            enabled: true,
            join_on_connect: false,
            join_deadline: None,
            now: 0,
            effects: Vec::new(),
        }
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) -> Observation {
        self.effects.clear();
        match op {
            Operation::Connect => self.connect(),
            Operation::Disconnect => self.disconnect(),
            Operation::JoinRoom => self.join(),
            Operation::ExitSession => self.exit(),
            Operation::Scan(index) => self.scan(scan_room(*index)),
            Operation::SetEnabled(enabled) => self.enabled = *enabled,
            Operation::Send(Command::Join) => self.join(),
            Operation::Send(Command::ClientLeave) => self.exit(),
            Operation::Send(command) => {
                if self.state == SessionState::Paired {
                    self.effect(format!("send {}", command.name()));
                }
            },
            Operation::TransportConnected => {
                if self.link == Link::Opening {
                    self.link = Link::Up;
                    self.state = SessionState::Connected;
                    self.effect("notify didConnect");
                    if self.join_on_connect {
                        self.join();
                    }
                }
            },
            Operation::TransportConnectFailed => {
                if self.link == Link::Opening {
                    self.link = Link::Down;
                    self.join_on_connect = false;
                    self.state = SessionState::Failed;
                    self.effect("notify didError(connection refused)");
                }
            },
            Operation::TransportError => self.effect("notify didError(socket error)"),
            Operation::TransportClosed => {
                if self.link != Link::Down {
                    self.reset();
                    self.link = Link::Down;
                    self.effect("notify didDisconnect");
                }
            },
            Operation::ClientJoin => {
                if self.state == SessionState::JoiningRoom {
                    self.join_deadline = None;
                    self.effect("cancel");
                    self.state = SessionState::Paired;
                    self.effect("notify didJoinRoom");
                }
            },
            Operation::UnknownInbound => {},
            Operation::AdvanceTime { millis } => self.advance(*millis),
        }
        self.observe()
    }

    /// Current observation without applying anything.
    pub fn observe(&self) -> Observation {
        Observation {
            state: self.state,
            is_active: self.link == Link::Up,
            stored_room: self.stored_room.clone(),
            effects: self.effects.clone(),
        }
    }

    fn connect(&mut self) {
        self.effect("notify willConnect");
        if self.link == Link::Down {
            self.link = Link::Opening;
            self.state = SessionState::Connecting;
            self.effect("open");
        }
    }

    fn disconnect(&mut self) {
        self.reset();
        self.stored_room = None;
        self.link = Link::Down;
        self.effect("close");
        self.effect("notify didDisconnect");
    }

    fn join(&mut self) {
        if self.state != SessionState::Connected || self.stored_room.is_none() {
            return;
        }
        self.join_on_connect = false;
        self.state = SessionState::JoiningRoom;
        self.join_deadline = Some(self.now + MODEL_JOIN_TIMEOUT_MS);
        self.effect("notify willJoinRoom");
        self.effect("send join");
        self.effect("arm");
    }

    fn exit(&mut self) {
        if self.state == SessionState::Paired {
            self.effect("send client-leave");
        }
        self.disconnect();
    }

    fn scan(&mut self, room: &str) {
        if !self.enabled {
            return;
        }
        self.stored_room = Some(room.to_string());
        self.join_on_connect = true;
        self.connect();
        if self.state == SessionState::Connected {
            self.join();
        }
    }

    fn advance(&mut self, millis: u64) {
        self.now += millis;
        match self.join_deadline {
            Some(deadline) if self.now >= deadline => {
                self.join_deadline = None;
                self.effect(format!("notify didError({ROOM_UNREACHABLE})"));
                self.disconnect();
            },
            _ => {},
        }
    }

    fn reset(&mut self) {
        self.join_on_connect = false;
        self.state = SessionState::Idle;
        if self.join_deadline.take().is_some() {
            self.effect("cancel");
        }
    }

    fn effect(&mut self, effect: impl Into<String>) {
        self.effects.push(effect.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut model = ModelSession::new(Some("ROOM42"));
        model.apply(&Operation::Connect);
        model.apply(&Operation::TransportConnected);
        let joined = model.apply(&Operation::JoinRoom);
        assert_eq!(joined.effects, ["notify willJoinRoom", "send join", "arm"]);

        let paired = model.apply(&Operation::ClientJoin);
        assert_eq!(paired.state, SessionState::Paired);
        assert_eq!(paired.effects, ["cancel", "notify didJoinRoom"]);
    }

    #[test]
    fn timeout_clears_room() {
        let mut model = ModelSession::new(Some("ROOM42"));
        model.apply(&Operation::Connect);
        model.apply(&Operation::TransportConnected);
        model.apply(&Operation::JoinRoom);

        assert!(model.apply(&Operation::AdvanceTime { millis: 4_999 }).effects.is_empty());
        let timed_out = model.apply(&Operation::AdvanceTime { millis: 1 });
        assert_eq!(timed_out.effects, [
            "notify didError(Room cannot be reached.)",
            "close",
            "notify didDisconnect"
        ]);
        assert_eq!(timed_out.state, SessionState::Idle);
        assert_eq!(timed_out.stored_room, None);
    }
}
