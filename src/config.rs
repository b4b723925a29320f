//! Configuration for OrbitKV client connections
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Default OrbitKV server port
pub const DEFAULT_PORT: u16 = 8087;

/// Default size for the buffered send and receive streams (200 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 200 * 1024;

/// Default delay before an idle pooled connection is retired
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-connection configuration
///
/// All values are fixed at connection construction; there is no runtime
/// reconfiguration surface.
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Server hostname or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Buffer Configuration
    // -------------------------------------------------------------------------
    /// Capacity of the buffered writer over the socket (in bytes)
    pub send_buffer_size: usize,

    /// Capacity of the buffered reader over the socket (in bytes)
    pub recv_buffer_size: usize,

    // -------------------------------------------------------------------------
    // Idle Lifecycle Configuration
    // -------------------------------------------------------------------------
    /// How long a pooled connection may sit idle before it is closed.
    /// Governs pooled, unused connections only; this is not a request timeout.
    pub idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            send_buffer_size: DEFAULT_BUFFER_SIZE,
            recv_buffer_size: DEFAULT_BUFFER_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server hostname or IP address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the buffered writer capacity (in bytes)
    pub fn send_buffer_size(mut self, size: usize) -> Self {
        self.config.send_buffer_size = size;
        self
    }

    /// Set the buffered reader capacity (in bytes)
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = size;
        self
    }

    /// Set the idle retirement delay
    pub fn idle_timeout(mut self, delay: Duration) -> Self {
        self.config.idle_timeout = delay;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
