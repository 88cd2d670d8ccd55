//! Transport abstraction.

use std::future::Future;

use mirrorlink_core::Endpoint;
use mirrorlink_proto::Envelope;

use crate::TransportError;

/// The single persistent connection to the mirror server.
///
/// Implementations never retry or reconnect on their own; the session decides
/// everything. Production uses [`crate::LineTransport`] over TCP, tests use
/// scripted or simulated implementations from the harness.
pub trait Transport: Send + 'static {
    /// Open the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn connect(
        &mut self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Write one envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if not connected or the write fails.
    fn send(&mut self, envelope: &Envelope)
    -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receive the next envelope.
    ///
    /// Returns `None` once the peer has closed the connection, after which
    /// [`Transport::is_connected`] is false. Must be cancel safe: the runtime
    /// polls it inside `select!`.
    fn recv(&mut self) -> impl Future<Output = Option<Result<Envelope, TransportError>>> + Send;

    /// Close the connection. Closing a closed transport does nothing.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// Whether the connection is open.
    fn is_connected(&self) -> bool;
}
