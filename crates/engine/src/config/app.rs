//! Server configuration.

use serde::Deserialize;

/// Server configuration loaded from environment variables.
///
/// Environment variables are prefixed with `BIZFLOW_`:
/// - `BIZFLOW_HOST`: Server bind address (default: "0.0.0.0")
/// - `BIZFLOW_PORT`: Server port (default: 8090)
/// - `BIZFLOW_DEBUG`: Enable debug mode (default: false)
/// - `BIZFLOW_SERVER_NAME`: Server name for identification
/// - `BIZFLOW_INIT_SCHEMA`: Create tables at startup (default: true)
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable debug mode
    #[serde(default)]
    pub debug: bool,

    /// Server name for identification
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Create the database schema at startup
    #[serde(default = "default_true")]
    pub init_schema: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_server_name() -> String {
    "bizflow-engine".to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from `BIZFLOW_`-prefixed environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("BIZFLOW_").from_env::<AppConfig>()
    }

    /// Get the server bind address as a string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
            server_name: default_server_name(),
            init_schema: true,
        }
    }
}
