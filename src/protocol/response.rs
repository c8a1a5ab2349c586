//! Response definitions
//!
//! A complete server response split into status, metadata and body.

use bytes::Bytes;

use super::Status;
use crate::error::{Result, StalkError};

/// A decoded server response
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Status code (first word of the status line)
    pub status: Status,

    /// Remaining words of the status line, in order
    pub meta: Vec<String>,

    /// Body, for statuses that carry one
    pub body: Option<Bytes>,
}

impl Reply {
    /// Metadata token at `index`
    pub fn meta(&self, index: usize) -> Result<&str> {
        self.meta.get(index).map(String::as_str).ok_or_else(|| {
            StalkError::Malformed(format!(
                "{} reply is missing metadata field {}",
                self.status, index
            ))
        })
    }

    /// Metadata token at `index`, parsed as an unsigned integer
    pub fn meta_u64(&self, index: usize) -> Result<u64> {
        let token = self.meta(index)?;
        token.parse().map_err(|_| {
            StalkError::Malformed(format!(
                "{} reply has non-numeric field {:?}",
                self.status, token
            ))
        })
    }

    /// Body, or an empty buffer for bodiless replies
    pub fn body_or_empty(&self) -> Bytes {
        self.body.clone().unwrap_or_default()
    }
}
