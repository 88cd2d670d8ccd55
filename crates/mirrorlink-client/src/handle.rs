//! Handle to a running session.

use mirrorlink_core::{SessionEvent, SessionSignal, SessionState};
use mirrorlink_proto::{Command, RoomId};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::ClientError;

/// Messages from handles to the runtime task.
#[derive(Debug)]
pub(crate) enum Request {
    Event(SessionEvent),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Pairing state
    pub state: SessionState,
    /// Transport fully established
    pub is_active: bool,
    /// Scans may start pairing
    pub enabled: bool,
    /// Persisted room
    pub room: Option<RoomId>,
}

/// Cloneable handle to the session task.
///
/// Every call is fire-and-forget: it enqueues a request and returns. Outcomes
/// arrive on the signal stream from [`SessionHandle::subscribe`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    requests: mpsc::UnboundedSender<Request>,
    signals: broadcast::Sender<SessionSignal>,
}

impl SessionHandle {
    pub(crate) fn new(
        requests: mpsc::UnboundedSender<Request>,
        signals: broadcast::Sender<SessionSignal>,
    ) -> Self {
        Self { requests, signals }
    }

    /// Subscribe to session signals.
    ///
    /// Only signals raised after subscribing are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.signals.subscribe()
    }

    /// Open the connection.
    pub fn connect(&self) -> Result<(), ClientError> {
        self.submit(SessionEvent::Connect)
    }

    /// Tear down and forget the stored room.
    pub fn disconnect(&self) -> Result<(), ClientError> {
        self.submit(SessionEvent::Disconnect)
    }

    /// Join the stored room.
    pub fn join_room(&self) -> Result<(), ClientError> {
        self.submit(SessionEvent::JoinRoom)
    }

    /// Leave the room and disconnect.
    pub fn exit_session(&self) -> Result<(), ClientError> {
        self.submit(SessionEvent::ExitSession)
    }

    /// Report a scanned room.
    pub fn room_scanned(&self, room: RoomId) -> Result<(), ClientError> {
        self.submit(SessionEvent::RoomScanned(room))
    }

    /// Allow or block scan-initiated pairing.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), ClientError> {
        self.submit(SessionEvent::SetEnabled(enabled))
    }

    /// Send a command to the mirror.
    pub fn send(&self, command: Command) -> Result<(), ClientError> {
        self.submit(SessionEvent::Send(command))
    }

    /// `product-select`
    pub fn product_select(&self, index: u32) -> Result<(), ClientError> {
        self.send(Command::ProductSelect { index })
    }

    /// `tea-select`
    pub fn tea_select(&self, index: u32) -> Result<(), ClientError> {
        self.send(Command::TeaSelect { index })
    }

    /// `tea-order`
    pub fn tea_order(&self, data: impl Into<String>) -> Result<(), ClientError> {
        self.send(Command::TeaOrder { data: data.into() })
    }

    /// `treatment-select`
    pub fn treatment_select(&self, index: u32) -> Result<(), ClientError> {
        self.send(Command::TreatmentSelect { index })
    }

    /// `view-treatment`
    pub fn view_treatment(&self, data: impl Into<String>) -> Result<(), ClientError> {
        self.send(Command::ViewTreatment { data: data.into() })
    }

    /// Current session state, after every request sent before this call.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, ClientError> {
        let (reply, response) = oneshot::channel();
        self.requests.send(Request::Snapshot(reply)).map_err(|_| ClientError::Closed)?;
        response.await.map_err(|_| ClientError::Closed)
    }

    /// True only when the transport is fully established.
    pub async fn is_active(&self) -> Result<bool, ClientError> {
        Ok(self.snapshot().await?.is_active)
    }

    /// Stop the runtime task, closing the transport.
    pub fn shutdown(&self) -> Result<(), ClientError> {
        self.requests.send(Request::Shutdown).map_err(|_| ClientError::Closed)
    }

    fn submit(&self, event: SessionEvent) -> Result<(), ClientError> {
        self.requests.send(Request::Event(event)).map_err(|_| ClientError::Closed)
    }
}
