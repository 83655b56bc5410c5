//! Configuration for the lanyard control daemon.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use crate::listener::Transport;
use std::path::PathBuf;

/// Configuration for `lanyardd`.
#[derive(Debug, Clone)]
pub struct CtlConfig {
    /// Listener transport.
    pub transport: Transport,

    /// Listener address: a socket path stem for unix (a `.sock` suffix is
    /// appended), `host:port` for tcp. Empty disables the control listener.
    pub address: String,

    /// Unix socket of the host network fabric service.
    pub fabric_socket: PathBuf,

    /// Name of the managed network.
    pub network_name: String,

    /// Fabric identifier of the managed network.
    pub network_fabric_id: String,
}

impl Default for CtlConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Unix,
            address: "/run/lanyard/lanyard".to_string(),
            fabric_socket: PathBuf::from("/run/lanyard/fabric.sock"),
            network_name: "default".to_string(),
            network_fabric_id: String::new(),
        }
    }
}

impl CtlConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LANYARD_TRANSPORT` | `unix` |
    /// | `LANYARD_ADDR` | `/run/lanyard/lanyard` |
    /// | `LANYARD_FABRIC_SOCKET` | `/run/lanyard/fabric.sock` |
    /// | `LANYARD_NETWORK` | `default` |
    /// | `LANYARD_NETWORK_ID` | empty |
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            transport: std::env::var("LANYARD_TRANSPORT")
                .map(|v| Transport::parse(&v))
                .unwrap_or(default.transport),
            address: std::env::var("LANYARD_ADDR").unwrap_or(default.address),
            fabric_socket: std::env::var("LANYARD_FABRIC_SOCKET")
                .map(PathBuf::from)
                .unwrap_or(default.fabric_socket),
            network_name: std::env::var("LANYARD_NETWORK").unwrap_or(default.network_name),
            network_fabric_id: std::env::var("LANYARD_NETWORK_ID")
                .unwrap_or(default.network_fabric_id),
        }
    }

    /// Log warnings for suspicious configuration without failing startup.
    pub fn validate_warn(&self) {
        if self.address.is_empty() {
            tracing::warn!("No listener address configured; control listener disabled");
        }

        if self.network_fabric_id.is_empty() {
            tracing::warn!("No network fabric id configured");
        }

        if !self.fabric_socket.exists() {
            tracing::warn!(path = %self.fabric_socket.display(), "Fabric socket not found");
        }
    }
}
