//! Endpoint resolution.
//!
//! The mirror server lives at one of two hosts depending on whether this is
//! a production build. Hosts, port and scheme are configuration; the choice
//! between production and staging is the build flag.

use std::fmt;

use serde::Deserialize;

/// Transport target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// URL scheme (`http`).
    pub scheme: String,
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// `host:port`, suitable for a socket connect.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// URL scheme
    pub scheme: String,
    /// Host used by production builds
    pub production_host: String,
    /// Host used by every other build
    pub staging_host: String,
    /// Server port
    pub port: u16,
    /// Production build flag. Defaults to `true` for release builds.
    pub production: bool,
}

impl EndpointConfig {
    /// Default scheme.
    pub const DEFAULT_SCHEME: &'static str = "http";
    /// Default production host.
    pub const DEFAULT_PRODUCTION_HOST: &'static str = "mirror.example.com";
    /// Default staging host.
    pub const DEFAULT_STAGING_HOST: &'static str = "staging.mirror.example.com";
    /// Default port.
    pub const DEFAULT_PORT: u16 = 7000;

    /// Resolve the endpoint for this configuration.
    ///
    /// Pure and cheap; callers may resolve on every connect.
    pub fn resolve(&self) -> Endpoint {
        let host = if self.production { &self.production_host } else { &self.staging_host };
        Endpoint { scheme: self.scheme.clone(), host: host.clone(), port: self.port }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            scheme: Self::DEFAULT_SCHEME.to_string(),
            production_host: Self::DEFAULT_PRODUCTION_HOST.to_string(),
            staging_host: Self::DEFAULT_STAGING_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            production: !cfg!(debug_assertions),
        }
    }
}
