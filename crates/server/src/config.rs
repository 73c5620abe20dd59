//! Compute node configuration.

use std::net::{Ipv4Addr, SocketAddr};

use compute_core::{DEFAULT_PORT, SERVICE_NAME};

/// Compute node configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to; port 0 picks a free port
    pub bind_addr: SocketAddr,
    /// Name answered to `lookup` requests
    pub service_name: String,
    /// Server version reported on lookup
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            service_name: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
