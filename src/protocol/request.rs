//! Request definitions
//!
//! The command text sent to the server, plus the job body for `put`.

use bytes::{BufMut, Bytes, BytesMut};

use super::frame::{CRLF, CRLF_LEN};
use crate::error::{Result, StalkError};

/// Name of the tube every connection starts out using and watching
pub const DEFAULT_TUBE: &str = "default";

/// Longest tube name the server accepts (in bytes)
pub const MAX_TUBE_NAME_LEN: usize = 200;

/// A request to send to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Command line, without terminator
    line: String,

    /// Raw body (only `put` carries one)
    body: Option<Bytes>,
}

impl Request {
    /// A bodiless request
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            body: None,
        }
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Wire bytes: `line\r\n`, followed by `body\r\n` when a body is present
    pub fn encode(&self) -> Bytes {
        let body_len = self.body.as_ref().map_or(0, |b| b.len() + CRLF_LEN);
        let mut buf = BytesMut::with_capacity(self.line.len() + CRLF_LEN + body_len);

        buf.put_slice(self.line.as_bytes());
        buf.put_slice(CRLF);
        if let Some(body) = &self.body {
            buf.put_slice(body);
            buf.put_slice(CRLF);
        }
        buf.freeze()
    }

    // -------------------------------------------------------------------------
    // Producer commands
    // -------------------------------------------------------------------------

    pub fn put(priority: u32, delay: u32, ttr: u32, body: Bytes) -> Self {
        Self {
            line: format!("put {} {} {} {}", priority, delay, ttr, body.len()),
            body: Some(body),
        }
    }

    pub fn use_tube(tube: &str) -> Self {
        Self::new(format!("use {}", tube))
    }

    // -------------------------------------------------------------------------
    // Worker commands
    // -------------------------------------------------------------------------

    pub fn reserve() -> Self {
        Self::new("reserve")
    }

    pub fn reserve_with_timeout(seconds: u32) -> Self {
        Self::new(format!("reserve-with-timeout {}", seconds))
    }

    pub fn delete(id: u64) -> Self {
        Self::new(format!("delete {}", id))
    }

    pub fn release(id: u64, priority: u32, delay: u32) -> Self {
        Self::new(format!("release {} {} {}", id, priority, delay))
    }

    pub fn bury(id: u64, priority: u32) -> Self {
        Self::new(format!("bury {} {}", id, priority))
    }

    pub fn touch(id: u64) -> Self {
        Self::new(format!("touch {}", id))
    }

    pub fn watch(tube: &str) -> Self {
        Self::new(format!("watch {}", tube))
    }

    pub fn ignore(tube: &str) -> Self {
        Self::new(format!("ignore {}", tube))
    }

    // -------------------------------------------------------------------------
    // Other commands
    // -------------------------------------------------------------------------

    pub fn peek(id: u64) -> Self {
        Self::new(format!("peek {}", id))
    }

    pub fn peek_ready() -> Self {
        Self::new("peek-ready")
    }

    pub fn peek_delayed() -> Self {
        Self::new("peek-delayed")
    }

    pub fn peek_buried() -> Self {
        Self::new("peek-buried")
    }

    pub fn kick(bound: u64) -> Self {
        Self::new(format!("kick {}", bound))
    }

    pub fn kick_job(id: u64) -> Self {
        Self::new(format!("kick-job {}", id))
    }

    pub fn stats_job(id: u64) -> Self {
        Self::new(format!("stats-job {}", id))
    }

    pub fn stats_tube(tube: &str) -> Self {
        Self::new(format!("stats-tube {}", tube))
    }

    pub fn stats() -> Self {
        Self::new("stats")
    }

    pub fn list_tubes() -> Self {
        Self::new("list-tubes")
    }

    pub fn list_tube_used() -> Self {
        Self::new("list-tube-used")
    }

    pub fn list_tubes_watched() -> Self {
        Self::new("list-tubes-watched")
    }

    pub fn pause_tube(tube: &str, delay: u32) -> Self {
        Self::new(format!("pause-tube {} {}", tube, delay))
    }

    pub fn quit() -> Self {
        Self::new("quit")
    }
}

/// Check a tube name against the server's name grammar
///
/// 1..=200 bytes of letters, digits and `-+/;.$_()`, not starting with `-`.
pub fn validate_tube(name: &str) -> Result<()> {
    let valid_char =
        |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '/' | ';' | '.' | '$' | '_' | '(' | ')');

    if name.is_empty()
        || name.len() > MAX_TUBE_NAME_LEN
        || name.starts_with('-')
        || !name.chars().all(valid_char)
    {
        return Err(StalkError::InvalidTube(name.to_string()));
    }
    Ok(())
}
