//! `mirrorlink` binary.

use clap::Parser;
use mirrorlink_cli::{Args, Result, run};
use mirrorlink_client::{RedbStore, TcpConnector, spawn};
use mirrorlink_core::{MemoryStore, RoomStore};
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the shell output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match &args.store {
        Some(path) => {
            info!(path = %path.display(), "using persistent room store");
            session(&args, RedbStore::open(path)?).await
        },
        None => session(&args, MemoryStore::new()).await,
    }
}

async fn session<S>(args: &Args, store: S) -> Result<()>
where
    S: RoomStore + Send + 'static,
{
    let config = args.session_config();
    info!(endpoint = %config.endpoint.resolve(), "mirrorlink starting");

    let transport = args.transport(TcpConnector);
    let (handle, task) = spawn(config, transport, store);

    if let Some(room) = args.initial_room()? {
        handle.room_scanned(room)?;
    }

    run(&handle, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    handle.shutdown()?;
    task.await?;
    Ok(())
}
