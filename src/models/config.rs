//! Configuration model loaded from external sources.

use serde::Deserialize;

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub templates_dir: String,
    /// Key material for the flash message cookies; at least 64 bytes.
    pub secret: String,
    /// Base URL of the client records REST backend, e.g. `https://localhost:7179/api`.
    pub backend_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}
