use std::net::SocketAddr;

use serde::Deserialize;

use boundary_core::error::{BoundaryError, Result};

/// Largest frame the broker will read from a peer.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    /// Bind address for the request/reply endpoint. Port 0 picks an
    /// ephemeral port, resolved at start.
    #[serde(default = "default_request_listen")]
    pub request_listen: String,

    /// Bind address for the announce endpoint.
    #[serde(default = "default_announce_listen")]
    pub announce_listen: String,

    /// Announce heartbeat period in milliseconds. A registry snapshot is
    /// published on every change and at least this often, so a late
    /// subscriber converges within one period. Default 250.
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// How long `shutdown` waits for the router task before aborting it.
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            request_listen: default_request_listen(),
            announce_listen: default_announce_listen(),
            heartbeat_ms: default_heartbeat_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}

impl BrokerConfig {
    pub fn validate(&self) -> Result<()> {
        self.request_listen
            .parse::<SocketAddr>()
            .map_err(|_| BoundaryError::Config("request_listen must be a socket address".into()))?;
        self.announce_listen
            .parse::<SocketAddr>()
            .map_err(|_| BoundaryError::Config("announce_listen must be a socket address".into()))?;
        if !(10..=60_000).contains(&self.heartbeat_ms) {
            return Err(BoundaryError::Config(
                "heartbeat_ms must be between 10 and 60000".into(),
            ));
        }
        if !(1024..=1024 * 1024 * 1024).contains(&self.max_frame_bytes) {
            return Err(BoundaryError::Config(
                "max_frame_bytes must be between 1 KiB and 1 GiB".into(),
            ));
        }
        if !(100..=60_000).contains(&self.join_timeout_ms) {
            return Err(BoundaryError::Config(
                "join_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_request_listen() -> String {
    "127.0.0.1:0".into()
}
fn default_announce_listen() -> String {
    "127.0.0.1:0".into()
}
fn default_heartbeat_ms() -> u64 {
    250
}
fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}
fn default_join_timeout_ms() -> u64 {
    5000
}
