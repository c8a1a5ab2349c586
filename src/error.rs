//! Error types for stalkwire
//!
//! Provides a unified error type for all client operations.
//!
//! Three kinds matter to callers:
//! - transport errors (`Io`, `ConnectionLost`, `ConnectionClosed`)
//! - framing errors (`Malformed`), fatal for one command only
//! - protocol status errors (`Status`, `JobBuried`), carrying the raw status token

use thiserror::Error;

use crate::protocol::Status;

/// Status behind `JobBuried`
static BURIED: Status = Status::Buried;

/// Result type alias using StalkError
pub type Result<T> = std::result::Result<T, StalkError>;

/// Unified error type for stalkwire operations
#[derive(Debug, Error)]
pub enum StalkError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Connection closed")]
    ConnectionClosed,

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    #[error("Malformed response: {0}")]
    Malformed(String),

    // -------------------------------------------------------------------------
    // Protocol Status Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Status(Status),

    #[error("BURIED {0}")]
    JobBuried(u64),

    #[error("Stats parse error: {0}")]
    Stats(String),

    // -------------------------------------------------------------------------
    // Client-side Errors
    // -------------------------------------------------------------------------
    #[error("Invalid tube name: {0:?}")]
    InvalidTube(String),

    #[error("Command cancelled before it was sent")]
    Cancelled,

    #[error("Timed out waiting for reply")]
    WaitTimeout,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StalkError {
    /// The server status behind this error, if it came from the server
    pub fn status(&self) -> Option<&Status> {
        match self {
            StalkError::Status(status) => Some(status),
            StalkError::JobBuried(_) => Some(&BURIED),
            _ => None,
        }
    }

    /// `TIMED_OUT` from `reserve-with-timeout`: no job was available
    pub fn is_timed_out(&self) -> bool {
        matches!(self.status(), Some(Status::TimedOut))
    }

    /// `DEADLINE_SOON`: a reserved job's TTR is about to expire
    pub fn is_deadline_soon(&self) -> bool {
        matches!(self.status(), Some(Status::DeadlineSoon))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(Status::NotFound))
    }

    /// Connection-level failure rather than a per-command one
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            StalkError::Io(_) | StalkError::ConnectionLost(_) | StalkError::ConnectionClosed
        )
    }
}
