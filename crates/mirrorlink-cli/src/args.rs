//! Command-line configuration.
//!
//! Every option can also come from the environment, so the same binary can be
//! pointed at staging or production without changing invocations.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use mirrorlink_client::LineTransport;
use mirrorlink_core::{EndpointConfig, SessionConfig};
use mirrorlink_proto::RoomId;

use crate::Result;

/// Pair with a smart mirror from the terminal.
#[derive(Debug, Clone, Parser)]
#[command(name = "mirrorlink", version, about)]
pub struct Args {
    /// URL scheme of the mirror server
    #[arg(long, env = "MIRRORLINK_SCHEME", default_value = EndpointConfig::DEFAULT_SCHEME)]
    pub scheme: String,

    /// Production server host
    #[arg(
        long,
        env = "MIRRORLINK_PRODUCTION_HOST",
        default_value = EndpointConfig::DEFAULT_PRODUCTION_HOST
    )]
    pub production_host: String,

    /// Staging server host
    #[arg(
        long,
        env = "MIRRORLINK_STAGING_HOST",
        default_value = EndpointConfig::DEFAULT_STAGING_HOST
    )]
    pub staging_host: String,

    /// Server port
    #[arg(long, env = "MIRRORLINK_PORT", default_value_t = EndpointConfig::DEFAULT_PORT)]
    pub port: u16,

    /// Use the production host instead of staging
    #[arg(long, env = "MIRRORLINK_PRODUCTION")]
    pub production: bool,

    /// User id stamped on every command
    #[arg(long, env = "MIRRORLINK_USER_ID")]
    pub user_id: Option<String>,

    /// Persist the paired room in this database file
    #[arg(long, env = "MIRRORLINK_STORE")]
    pub store: Option<PathBuf>,

    /// Room to scan at startup
    #[arg(long)]
    pub room: Option<String>,

    /// Join acknowledgment timeout in milliseconds
    #[arg(long, env = "MIRRORLINK_JOIN_TIMEOUT_MS", default_value_t = 5_000)]
    pub join_timeout_ms: u64,

    /// TCP connect timeout in milliseconds
    #[arg(long, env = "MIRRORLINK_CONNECT_TIMEOUT_MS", default_value_t = 10_000)]
    pub connect_timeout_ms: u64,
}

impl Args {
    /// Endpoint selection.
    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig {
            scheme: self.scheme.clone(),
            production_host: self.production_host.clone(),
            staging_host: self.staging_host.clone(),
            port: self.port,
            production: self.production,
        }
    }

    /// Session configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            endpoint: self.endpoint(),
            user_id: self.user_id.clone(),
            join_timeout: Duration::from_millis(self.join_timeout_ms),
        }
    }

    /// Connect timeout for the line transport.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Transport configured from these arguments.
    pub fn transport<C: mirrorlink_client::Connector>(&self, connector: C) -> LineTransport<C> {
        LineTransport::new(connector).with_connect_timeout(self.connect_timeout())
    }

    /// Room given with `--room`, validated.
    pub fn initial_room(&self) -> Result<Option<RoomId>> {
        Ok(self.room.as_deref().map(RoomId::new).transpose()?)
    }
}
