//! Network Module
//!
//! TCP transport and the pipelining connection runtime.
//!
//! ## Architecture
//! - Callers write commands directly, under the connection lock
//! - One supervisor thread per connection reads responses, resolves
//!   commands in FIFO order and handles reconnection

mod connection;
mod transport;

pub use connection::Connection;
pub use transport::connect;
