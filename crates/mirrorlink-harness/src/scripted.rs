//! Scripted in-memory transport.
//!
//! The test holds the [`MirrorRemote`] end. It pushes inbound envelopes,
//! drops the connection, refuses or stalls connects, and reads back
//! everything the session sent, in order.

use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use mirrorlink_client::{Transport, TransportError};
use mirrorlink_core::Endpoint;
use mirrorlink_proto::{Envelope, ProtocolError};
use serde_json::json;
use tokio::sync::mpsc;

/// Transport-level occurrences, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A connect succeeded
    Connect,
    /// A connect was refused
    Refused,
    /// An envelope with this event name was written
    Send(String),
    /// An open transport was closed
    Close,
}

#[derive(Debug, Default)]
struct Shared {
    log: Vec<TransportEvent>,
    refuse_connects: usize,
    connect_delay: Duration,
}

enum Inbound {
    Envelope(Envelope),
    Garbage,
    Close,
}

/// Client end, handed to the session runtime.
pub struct ScriptedTransport {
    shared: Arc<Mutex<Shared>>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    outbound: mpsc::UnboundedSender<Envelope>,
    connected: bool,
}

/// Mirror end, kept by the test.
pub struct MirrorRemote {
    shared: Arc<Mutex<Shared>>,
    inbound: mpsc::UnboundedSender<Inbound>,
    outbound: mpsc::UnboundedReceiver<Envelope>,
}

impl ScriptedTransport {
    /// Create a connected pair of ends.
    pub fn pair() -> (Self, MirrorRemote) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let transport = Self {
            shared: Arc::clone(&shared),
            inbound: inbound_rx,
            outbound: outbound_tx,
            connected: false,
        };
        let remote = MirrorRemote { shared, inbound: inbound_tx, outbound: outbound_rx };
        (transport, remote)
    }

    fn record(&self, event: TransportEvent) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.log.push(event);
        }
    }
}

impl Transport for ScriptedTransport {
    async fn connect(&mut self, _endpoint: &Endpoint) -> Result<(), TransportError> {
        let delay = self.shared.lock().map(|shared| shared.connect_delay).unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let refused = match self.shared.lock() {
            Ok(mut shared) if shared.refuse_connects > 0 => {
                shared.refuse_connects -= 1;
                true
            },
            _ => false,
        };

        if refused {
            self.record(TransportEvent::Refused);
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused).into());
        }

        self.connected = true;
        self.record(TransportEvent::Connect);
        Ok(())
    }

    async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.record(TransportEvent::Send(envelope.event.clone()));
        // Remote may have been dropped; the write still "succeeded"
        let _ = self.outbound.send(envelope.clone());
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Envelope, TransportError>> {
        if !self.connected {
            return None;
        }
        match self.inbound.recv().await {
            Some(Inbound::Envelope(envelope)) => Some(Ok(envelope)),
            Some(Inbound::Garbage) => Some(Err(ProtocolError::EmptyEventName.into())),
            Some(Inbound::Close) | None => {
                self.connected = false;
                None
            },
        }
    }

    async fn close(&mut self) {
        if self.connected {
            self.connected = false;
            self.record(TransportEvent::Close);
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl MirrorRemote {
    /// Deliver an envelope to the client.
    pub fn push(&self, envelope: Envelope) {
        let _ = self.inbound.send(Inbound::Envelope(envelope));
    }

    /// Acknowledge a join.
    pub fn ack_join(&self) {
        self.push(Envelope::new("client-join", json!({})));
    }

    /// Deliver a line that does not decode as an envelope.
    pub fn push_garbage(&self) {
        let _ = self.inbound.send(Inbound::Garbage);
    }

    /// Close the connection from the mirror side.
    pub fn drop_connection(&self) {
        let _ = self.inbound.send(Inbound::Close);
    }

    /// Refuse the next `count` connect attempts.
    pub fn refuse_connects(&self, count: usize) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.refuse_connects = count;
        }
    }

    /// Hold every later connect for `delay` before it resolves.
    pub fn delay_connects(&self, delay: Duration) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.connect_delay = delay;
        }
    }

    /// Next envelope sent by the client.
    pub async fn next_sent(&mut self) -> Option<Envelope> {
        self.outbound.recv().await
    }

    /// Everything that happened on the transport so far.
    pub fn log(&self) -> Vec<TransportEvent> {
        self.shared.lock().map(|shared| shared.log.clone()).unwrap_or_default()
    }

    /// Number of successful connects.
    pub fn connects(&self) -> usize {
        self.log().iter().filter(|event| **event == TransportEvent::Connect).count()
    }
}
