//! The single-writer session task.
//!
//! All transitions happen here, one at a time: handle requests, inbound
//! envelopes, the pending transport open and the join timer are multiplexed
//! with `select!` and fed into the [`RoomSession`] in arrival order. Actions
//! are executed in the order the session produced them; events they cause
//! (send error) are queued and processed before the next external input.
//!
//! Opening the transport never blocks the task. The open runs as an
//! [`Opening`] polled alongside everything else, so a `disconnect` issued
//! while connecting is handled at once and aborts the open.

use std::{collections::VecDeque, future::Future, pin::Pin};

use mirrorlink_core::{
    Endpoint, RoomSession, RoomStore, SessionAction, SessionConfig, SessionEvent, SessionSignal,
    WatchdogToken,
};
use mirrorlink_proto::Envelope;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info, trace, warn};

use crate::{SessionHandle, SessionSnapshot, Transport, TransportError, handle::Request};

/// Signals buffered per subscriber before the slowest one starts lagging.
pub const SIGNAL_CHANNEL_CAPACITY: usize = 64;

/// Outcome of an open: the transport comes back either way. `None` when the
/// open was aborted.
type OpenOutcome<T> = (T, Option<Result<(), TransportError>>);

/// A transport open in flight. Owns the transport until it completes.
struct Opening<T> {
    abort: oneshot::Sender<()>,
    attempt: Pin<Box<dyn Future<Output = OpenOutcome<T>> + Send>>,
}

impl<T: Transport> Opening<T> {
    fn start(mut transport: T, endpoint: Endpoint) -> Self {
        let (abort, aborted) = oneshot::channel();
        let attempt = Box::pin(async move {
            let result = tokio::select! {
                biased;

                _ = aborted => None,
                result = transport.connect(&endpoint) => Some(result),
            };
            (transport, result)
        });
        Self { abort, attempt }
    }

    /// Abort and take the transport back. An open that already finished is
    /// discarded all the same.
    async fn abort(self) -> T {
        let Self { abort, attempt } = self;
        // Receiver lives inside `attempt`, which we still own
        let _ = abort.send(());
        let (transport, _) = attempt.await;
        transport
    }
}

/// Owns the session, the transport and the join timer.
pub struct SessionRuntime<T, S> {
    session: RoomSession<S>,
    transport: Option<T>,
    opening: Option<Opening<T>>,
    requests: mpsc::UnboundedReceiver<Request>,
    signals: broadcast::Sender<SessionSignal>,
    watchdog: Option<(WatchdogToken, Instant)>,
    feedback: VecDeque<SessionEvent>,
}

impl<T, S> SessionRuntime<T, S>
where
    T: Transport,
    S: RoomStore + Send + 'static,
{
    /// Create a runtime and a handle to it. Nothing runs until
    /// [`SessionRuntime::run`] is polled.
    pub fn new(config: SessionConfig, transport: T, store: S) -> (Self, SessionHandle) {
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let (signals, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        let handle = SessionHandle::new(requests_tx, signals.clone());

        let runtime = Self {
            session: RoomSession::new(config, store),
            transport: Some(transport),
            opening: None,
            requests,
            signals,
            watchdog: None,
            feedback: VecDeque::new(),
        };
        (runtime, handle)
    }

    /// Run until shut down or every handle is dropped.
    pub async fn run(mut self) {
        info!("session runtime started");

        loop {
            while let Some(event) = self.feedback.pop_front() {
                self.dispatch(event).await;
            }

            let connected = self.is_connected();
            let deadline = self.watchdog.map(|(_, deadline)| deadline);

            tokio::select! {
                biased;

                (transport, result) = open_finished(self.opening.as_mut()) => {
                    self.opening = None;
                    self.transport = Some(transport);
                    if let Some(result) = result {
                        self.on_opened(result).await;
                    }
                },

                request = self.requests.recv() => match request {
                    Some(Request::Event(event)) => self.dispatch(event).await,
                    Some(Request::Snapshot(reply)) => {
                        if reply.send(self.snapshot()).is_err() {
                            debug!("snapshot requester went away");
                        }
                    },
                    Some(Request::Shutdown) | None => break,
                },

                inbound = recv_from(self.transport.as_mut()), if connected => {
                    self.on_inbound(inbound).await;
                },

                () = sleep_until(deadline) => {
                    if let Some((token, _)) = self.watchdog.take() {
                        self.dispatch(SessionEvent::WatchdogFired(token)).await;
                    }
                },
            }
        }

        info!("session runtime stopping");
        self.close_transport().await;
    }

    fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(Transport::is_connected)
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.session.state(),
            is_active: self.session.is_active(),
            enabled: self.session.is_enabled(),
            room: self.session.stored_room(),
        }
    }

    async fn on_opened(&mut self, result: Result<(), TransportError>) {
        let event = match result {
            Ok(()) => SessionEvent::TransportConnected,
            Err(error) => SessionEvent::TransportConnectFailed { message: error.to_string() },
        };
        self.dispatch(event).await;
    }

    async fn on_inbound(&mut self, inbound: Option<Result<Envelope, TransportError>>) {
        match inbound {
            Some(Ok(envelope)) => {
                trace!(event = %envelope.event, "inbound envelope");
                self.dispatch(SessionEvent::Inbound(envelope)).await;
            },
            Some(Err(error)) if error.is_protocol() => {
                warn!(%error, "dropping malformed inbound line");
            },
            Some(Err(error)) => {
                warn!(%error, "transport receive failed");
                self.dispatch(SessionEvent::TransportError { message: error.to_string() }).await;
            },
            None => {},
        }

        if !self.is_connected() {
            self.dispatch(SessionEvent::TransportClosed).await;
        }
    }

    async fn dispatch(&mut self, event: SessionEvent) {
        let now = Instant::now().into_std();
        let actions = self.session.handle(event, now);
        self.execute(actions).await;
    }

    async fn execute(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::OpenTransport(endpoint) => self.open_transport(endpoint).await,
                SessionAction::CloseTransport => self.close_transport().await,
                SessionAction::Send(envelope) => {
                    let result = match self.transport.as_mut() {
                        Some(transport) => transport.send(&envelope).await,
                        None => Err(TransportError::NotConnected),
                    };
                    if let Err(error) = result {
                        warn!(event = %envelope.event, %error, "send failed");
                        self.feedback
                            .push_back(SessionEvent::TransportError { message: error.to_string() });
                    }
                },
                SessionAction::ArmWatchdog { token, deadline } => {
                    self.watchdog = Some((token, Instant::from_std(deadline)));
                },
                SessionAction::CancelWatchdog => self.watchdog = None,
                SessionAction::Notify(signal) => {
                    debug!(%signal, "signal");
                    // No subscribers is fine
                    let _ = self.signals.send(signal);
                },
            }
        }
    }

    async fn open_transport(&mut self, endpoint: Endpoint) {
        self.abort_open().await;
        match self.transport.take() {
            Some(transport) => {
                debug!(%endpoint, "opening transport");
                self.opening = Some(Opening::start(transport, endpoint));
            },
            None => warn!("no transport to open"),
        }
    }

    async fn close_transport(&mut self) {
        self.abort_open().await;
        if let Some(transport) = self.transport.as_mut() {
            transport.close().await;
        }
    }

    async fn abort_open(&mut self) {
        if let Some(opening) = self.opening.take() {
            debug!("aborting pending transport open");
            self.transport = Some(opening.abort().await);
        }
    }
}

/// Spawn a session runtime on the current tokio runtime.
pub fn spawn<T, S>(config: SessionConfig, transport: T, store: S) -> (SessionHandle, JoinHandle<()>)
where
    T: Transport,
    S: RoomStore + Send + 'static,
{
    let (runtime, handle) = SessionRuntime::new(config, transport, store);
    (handle, tokio::spawn(runtime.run()))
}

async fn open_finished<T>(opening: Option<&mut Opening<T>>) -> OpenOutcome<T> {
    match opening {
        Some(opening) => opening.attempt.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn recv_from<T: Transport>(
    transport: Option<&mut T>,
) -> Option<Result<Envelope, TransportError>> {
    match transport {
        Some(transport) => transport.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
