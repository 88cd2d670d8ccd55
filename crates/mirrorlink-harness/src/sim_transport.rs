//! Line transport over turmoil's simulated network.

use std::io;

use mirrorlink_client::{Connector, LineTransport};
use mirrorlink_core::Endpoint;

/// Connects through turmoil's simulated TCP stack.
///
/// Only usable inside a turmoil host or client.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimConnector;

impl Connector for SimConnector {
    type Stream = turmoil::net::TcpStream;

    async fn connect(&self, endpoint: &Endpoint) -> io::Result<Self::Stream> {
        let addr = endpoint.authority();
        turmoil::net::TcpStream::connect(addr.as_str()).await
    }
}

/// Production framing on simulated sockets.
pub type SimTransport = LineTransport<SimConnector>;
