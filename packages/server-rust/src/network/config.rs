//! Network configuration types for the launch dispatcher.

use std::time::Duration;

/// Default cap on a `POST /launch` body.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// Top-level network configuration for the server.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
    /// Maximum accepted request body size in bytes.
    pub body_limit: usize,
    /// How long shutdown waits for in-flight launches before closing the store.
    pub drain_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            body_limit: DEFAULT_BODY_LIMIT,
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl NetworkConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
