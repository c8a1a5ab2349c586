//! TCP transport
//!
//! Opens and configures the socket a connection runs on.

use std::net::TcpStream;

use crate::config::Config;
use crate::error::{Result, StalkError};

/// Connect to the configured server
///
/// Tries every resolved address in order and returns the first that
/// accepts within the connect timeout.
pub fn connect(config: &Config) -> Result<TcpStream> {
    let mut last_err = None;

    for addr in config.socket_addrs()? {
        match TcpStream::connect_timeout(&addr, config.connect_timeout()) {
            Ok(stream) => {
                // Disable Nagle's algorithm: commands are small and latency bound
                stream.set_nodelay(true)?;
                stream.set_write_timeout(config.write_timeout())?;
                stream.set_read_timeout(None)?;

                tracing::debug!("Connected to {}", addr);
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(last_err
        .map(StalkError::Io)
        .unwrap_or_else(|| StalkError::Config(format!("no address for {}", config.addr))))
}
