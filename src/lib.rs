//! # stalkwire
//!
//! A pipelining client for the beanstalkd work-queue protocol:
//! - Frame detection over partial reads (binary bodies inside a text protocol)
//! - Strict FIFO correlation of responses to pipelined commands
//! - Typed replies and typed server errors
//! - Tube selection replayed transparently after a reconnect
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Client                               │
//! │         (typed operations → Command + Pending<T>)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Connection                              │
//! │     (write under lock, in-flight FIFO, supervisor thread)    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │   Session   │
//!   │ frame/codec │          │  (replay)   │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use stalkwire::{Client, Config};
//!
//! # fn main() -> stalkwire::Result<()> {
//! let client = Client::connect(Config::default())?;
//! client.use_tube("orders").wait()?;
//! let id = client.put(100, 0, 60, &b"hello"[..]).wait()?;
//!
//! client.watch("orders").wait()?;
//! let job = client.reserve().wait()?;
//! client.delete(job.id).wait()?;
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod session;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StalkError, Result};
pub use config::Config;
pub use client::{Client, Job, Pending};
pub use protocol::{Stats, StatValue, Status};
pub use session::SessionState;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of stalkwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
