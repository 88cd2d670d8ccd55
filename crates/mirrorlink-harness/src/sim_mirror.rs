//! Simulated mirror server.
//!
//! Runs as a turmoil host. Accepts one client connection at a time, records
//! every envelope it receives, and answers `join` with `client-join` after a
//! configurable delay (or never, to exercise the join timeout).

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use mirrorlink_proto::Envelope;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use turmoil::net::{TcpListener, TcpStream};

/// Port the simulated mirror listens on.
pub const MIRROR_PORT: u16 = 7000;

/// Envelopes received by the simulated mirror, in arrival order.
pub type MirrorLog = Arc<Mutex<Vec<Envelope>>>;

/// How the simulated mirror answers.
#[derive(Debug, Clone, Copy)]
pub struct MirrorBehavior {
    /// Delay before acknowledging a join. `None` never acknowledges.
    pub ack_delay: Option<Duration>,
}

impl MirrorBehavior {
    /// Acknowledge joins after `delay`.
    pub fn ack_after(delay: Duration) -> Self {
        Self { ack_delay: Some(delay) }
    }

    /// Never acknowledge.
    pub fn silent() -> Self {
        Self { ack_delay: None }
    }
}

/// Serve clients forever.
pub async fn serve(behavior: MirrorBehavior, log: MirrorLog) -> turmoil::Result {
    let addr = format!("0.0.0.0:{MIRROR_PORT}");
    let listener = TcpListener::bind(addr.as_str()).await?;

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "mirror accepted client");
        handle_client(stream, behavior, &log).await?;
        info!(%peer, "mirror client gone");
    }
}

async fn handle_client(
    stream: TcpStream,
    behavior: MirrorBehavior,
    log: &MirrorLog,
) -> turmoil::Result {
    let (read, mut write) = tokio::io::split(stream);
    let mut lines = BufReader::new(read).lines();

    // A reset connection ends the session the same way EOF does.
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let envelope = Envelope::decode_line(line.as_bytes())?;
        debug!(event = %envelope.event, "mirror received");

        let is_join = envelope.event == "join";
        if let Ok(mut log) = log.lock() {
            log.push(envelope);
        }

        if let (true, Some(delay)) = (is_join, behavior.ack_delay) {
            tokio::time::sleep(delay).await;
            let ack = Envelope::new("client-join", json!({})).encode_line()?;
            if write.write_all(&ack).await.is_err() {
                break;
            }
        }
    }

    Ok(())
}

/// Event names received so far.
pub fn received(log: &MirrorLog) -> Vec<String> {
    log.lock()
        .map(|log| log.iter().map(|envelope| envelope.event.clone()).collect())
        .unwrap_or_default()
}
