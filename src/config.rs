//! Configuration for stalkwire
//!
//! Centralized client configuration with sensible defaults.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::error::{Result, StalkError};

/// Default beanstalkd port
pub const DEFAULT_PORT: u16 = 11300;

/// Main configuration for a stalkwire client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Server address (host:port)
    pub addr: String,

    /// TCP connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Socket write timeout (milliseconds, 0 = no timeout)
    ///
    /// Reads are never timed out: `reserve` may legitimately block forever.
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Reconnect Configuration
    // -------------------------------------------------------------------------
    /// Re-establish the connection and replay tube state after a loss
    pub auto_reconnect: bool,

    /// Delay between reconnect attempts (milliseconds)
    pub reconnect_delay_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Limits
    // -------------------------------------------------------------------------
    /// Largest body the client accepts in a server response (in bytes)
    pub max_body_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            connect_timeout_ms: 5000,
            write_timeout_ms: 5000,
            auto_reconnect: true,
            reconnect_delay_ms: 1000,
            max_body_size: 16 * 1024 * 1024, // 16 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Resolve `addr` to socket addresses, in resolver order
    pub fn socket_addrs(&self) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = self
            .addr
            .to_socket_addrs()
            .map_err(|e| StalkError::Config(format!("cannot resolve {}: {}", self.addr, e)))?
            .collect();

        if addrs.is_empty() {
            return Err(StalkError::Config(format!(
                "{} resolved to no addresses",
                self.addr
            )));
        }
        Ok(addrs)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server address (host:port)
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.config.addr = addr.into();
        self
    }

    /// Set host and port separately
    pub fn host_port(mut self, host: &str, port: u16) -> Self {
        self.config.addr = format!("{}:{}", host, port);
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Enable or disable automatic reconnection
    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.config.auto_reconnect = enabled;
        self
    }

    /// Set the delay between reconnect attempts (in milliseconds)
    pub fn reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.config.reconnect_delay_ms = ms;
        self
    }

    /// Set the largest accepted response body (in bytes)
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
