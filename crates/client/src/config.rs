//! Client configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use compute_core::{DEFAULT_PORT, SERVICE_NAME};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Compute node host, with or without a port
    pub server: String,
    /// Service name to look up
    pub service_name: String,
    /// How many times each task is run
    pub trials: usize,
    /// Directory images are written to
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: format!("127.0.0.1:{}", DEFAULT_PORT),
            service_name: SERVICE_NAME.to_string(),
            trials: 5,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    /// `server` with the default port appended when it has none.
    pub fn server_addr(&self) -> String {
        if self.server.parse::<SocketAddr>().is_ok() || self.server.contains(':') {
            self.server.clone()
        } else {
            format!("{}:{}", self.server, DEFAULT_PORT)
        }
    }
}
