//! Command definitions
//!
//! One `Command` per outstanding request. It owns the request until it is
//! encoded, and the sending half of a one-shot reply slot until it is
//! resolved. Resolving consumes the command, so it resolves exactly once.

use std::time::Duration;

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use super::codec::decode_reply;
use super::{Reply, Request, Status};
use crate::error::{Result, StalkError};

/// An outstanding request awaiting its response
#[derive(Debug)]
pub struct Command {
    /// The request to send
    request: Request,

    /// Fast-path success check
    expected: Option<Status>,

    /// Single-resolution reply slot
    reply_tx: Sender<Result<Reply>>,
}

impl Command {
    /// Create a command and the handle its outcome is delivered to
    pub fn new(request: Request, expected: Option<Status>) -> (Self, PendingReply) {
        let (reply_tx, reply_rx) = channel::bounded(1);
        let command = Self {
            request,
            expected,
            reply_tx,
        };
        (command, PendingReply { reply_rx })
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn expected(&self) -> Option<&Status> {
        self.expected.as_ref()
    }

    /// Wire bytes for this command
    pub fn encode(&self) -> Bytes {
        self.request.encode()
    }

    /// Decode a complete response buffer (or a transport failure) without
    /// resolving
    pub fn decode(&self, input: Result<Bytes>) -> Result<Reply> {
        let buf = input?;
        decode_reply(&buf, self.expected.as_ref())
    }

    /// Deliver an outcome to the waiting caller
    pub fn complete(self, outcome: Result<Reply>) {
        // The caller may have stopped waiting; the outcome is dropped then.
        if self.reply_tx.try_send(outcome).is_err() {
            tracing::trace!("Reply for {:?} dropped, nobody waiting", self.request.line());
        }
    }

    /// Decode `input` and deliver the outcome
    pub fn resolve(self, input: Result<Bytes>) {
        let outcome = self.decode(input);
        self.complete(outcome);
    }
}

/// Caller side of a command's reply slot
#[derive(Debug)]
pub struct PendingReply {
    reply_rx: Receiver<Result<Reply>>,
}

impl PendingReply {
    /// Block until the command resolves
    ///
    /// A command dropped without being resolved yields `Cancelled`.
    pub fn wait(self) -> Result<Reply> {
        self.reply_rx.recv().unwrap_or(Err(StalkError::Cancelled))
    }

    /// Block until the command resolves or `timeout` elapses
    pub fn wait_timeout(self, timeout: Duration) -> Result<Reply> {
        match self.reply_rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(StalkError::WaitTimeout),
            Err(RecvTimeoutError::Disconnected) => Err(StalkError::Cancelled),
        }
    }
}
