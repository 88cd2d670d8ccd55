//! CLI error types.

use mirrorlink_client::ClientError;
use mirrorlink_core::StoreError;
use mirrorlink_proto::ProtocolError;
use thiserror::Error;

/// Errors that end the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session runtime went away.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The room store could not be opened.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid command-line configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ProtocolError),

    /// The session task panicked or was cancelled.
    #[error("session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
