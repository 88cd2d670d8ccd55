//! Newline-delimited JSON transport.
//!
//! One [`Envelope`] per line in each direction. The byte stream comes from a
//! [`Connector`]: plain TCP in production, a simulated socket under test.

use std::{future::Future, io, time::Duration};

use futures::StreamExt;
use mirrorlink_core::Endpoint;
use mirrorlink_proto::Envelope;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf},
    net::TcpStream,
};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, trace, warn};

use crate::{Transport, TransportError};

/// Opens byte streams to an endpoint.
pub trait Connector: Send + Sync + 'static {
    /// Stream type produced.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a stream to `endpoint`.
    fn connect(&self, endpoint: &Endpoint) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Plain TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, endpoint: &Endpoint) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(endpoint.authority()).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// [`Transport`] framing envelopes as JSON lines over a connector's stream.
///
/// Inbound lines are capped at [`Envelope::MAX_LINE_SIZE`] while reading. A
/// peer exceeding it is cut off before the line is buffered in full.
pub struct LineTransport<C: Connector> {
    connector: C,
    connect_timeout: Duration,
    reader: Option<FramedRead<ReadHalf<C::Stream>, LinesCodec>>,
    writer: Option<WriteHalf<C::Stream>>,
}

impl<C: Connector> LineTransport<C> {
    /// Default bound on opening the stream.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a disconnected transport.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            reader: None,
            writer: None,
        }
    }

    /// Override the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn drop_stream(&mut self) {
        self.reader = None;
        self.writer = None;
    }
}

impl<C: Connector> Transport for LineTransport<C> {
    async fn connect(&mut self, endpoint: &Endpoint) -> Result<(), TransportError> {
        self.close().await;

        let stream = tokio::time::timeout(self.connect_timeout, self.connector.connect(endpoint))
            .await
            .map_err(|_| TransportError::ConnectTimeout)??;

        let (read, write) = tokio::io::split(stream);
        let codec = LinesCodec::new_with_max_length(Envelope::MAX_LINE_SIZE);
        self.reader = Some(FramedRead::new(read, codec));
        self.writer = Some(write);
        debug!(%endpoint, "line transport connected");
        Ok(())
    }

    async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::NotConnected)?;
        let line = envelope.encode_line()?;
        writer.write_all(&line).await?;
        writer.flush().await?;
        trace!(event = %envelope.event, bytes = line.len(), "sent envelope");
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Envelope, TransportError>> {
        loop {
            let reader = self.reader.as_mut()?;
            match reader.next().await {
                Some(Ok(line)) if line.trim().is_empty() => {},
                Some(Ok(line)) => {
                    return Some(Envelope::decode_line(line.as_bytes()).map_err(Into::into));
                },
                None => {
                    debug!("peer closed line transport");
                    self.drop_stream();
                    return None;
                },
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!(max = Envelope::MAX_LINE_SIZE, "inbound line too long, closing");
                    self.drop_stream();
                    return Some(Err(TransportError::LineTooLong { max: Envelope::MAX_LINE_SIZE }));
                },
                Some(Err(LinesCodecError::Io(error))) => {
                    self.drop_stream();
                    return Some(Err(error.into()));
                },
            }
        }
    }

    async fn close(&mut self) {
        self.reader = None;
        if let Some(mut writer) = self.writer.take() {
            if let Err(error) = writer.shutdown().await {
                debug!(%error, "shutdown on close failed");
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.writer.is_some()
    }
}
