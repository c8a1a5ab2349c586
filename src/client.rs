//! Client Module
//!
//! The typed operation surface. Every operation builds one command, hands
//! it to the connection and returns a [`Pending`] handle that interprets
//! the reply.
//!
//! ## Outcomes
//! - Operations with a single success status set it as the command's
//!   expected status; anything else arrives as `StalkError::Status`.
//! - `put` maps its statuses explicitly (`BURIED <id>` keeps the id).
//! - `reserve` reports `TIMED_OUT` / `DEADLINE_SOON` as errors; use
//!   [`StalkError::is_timed_out`] to tell "no job" from a real failure.

use std::time::Duration;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{Result, StalkError};
use crate::network::Connection;
use crate::protocol::{
    parse_list_bytes, validate_tube, Command, PendingReply, Reply, Request, Stats, Status,
};
use crate::session::{SessionChange, SessionState};

/// A job as returned by `reserve` and the `peek` family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Server-assigned job id
    pub id: u64,

    /// Job payload, byte for byte
    pub body: Bytes,

    /// Body length the server declared
    pub declared_len: usize,
}

impl Job {
    fn from_reply(reply: Reply) -> Result<Self> {
        Ok(Self {
            id: reply.meta_u64(0)?,
            declared_len: reply.meta_u64(1)? as usize,
            body: reply.body_or_empty(),
        })
    }
}

type ReplyMap<T> = Box<dyn FnOnce(Reply) -> Result<T> + Send>;

enum PendingState {
    Waiting(PendingReply),
    Rejected(StalkError),
}

/// Handle to the outcome of an operation
///
/// Dropping it does not cancel the command once it has been written; its
/// response is still consumed to keep the pipeline in order.
pub struct Pending<T> {
    state: PendingState,
    map: ReplyMap<T>,
}

impl<T> Pending<T> {
    fn rejected(err: StalkError) -> Self {
        Self {
            state: PendingState::Rejected(err),
            map: Box::new(|_: Reply| -> Result<T> { Err(StalkError::Cancelled) }),
        }
    }

    /// Block until the operation completes
    pub fn wait(self) -> Result<T> {
        match self.state {
            PendingState::Waiting(reply) => (self.map)(reply.wait()?),
            PendingState::Rejected(err) => Err(err),
        }
    }

    /// Block until the operation completes or `timeout` elapses
    pub fn wait_timeout(self, timeout: Duration) -> Result<T> {
        match self.state {
            PendingState::Waiting(reply) => (self.map)(reply.wait_timeout(timeout)?),
            PendingState::Rejected(err) => Err(err),
        }
    }
}

/// A beanstalkd client over one pipelined connection
///
/// `Client` is `Send + Sync`; concurrent callers are serialized into one
/// ordered pipeline.
pub struct Client {
    conn: Connection,
}

impl Client {
    /// Connect to the configured server
    pub fn connect(config: Config) -> Result<Self> {
        tracing::debug!("Connecting to {}", config.addr);
        Ok(Self {
            conn: Connection::open(config)?,
        })
    }

    /// Run `f` with a connected client, closing it on every exit path
    pub fn scoped<T, F>(config: Config, f: F) -> Result<T>
    where
        F: FnOnce(&Client) -> Result<T>,
    {
        let client = Self::connect(config)?;
        let result = f(&client);
        client.close();
        result
    }

    /// Close the connection (idempotent)
    pub fn close(&self) {
        self.conn.close();
    }

    /// Snapshot of the used and watched tubes
    pub fn session(&self) -> SessionState {
        self.conn.session()
    }

    /// Number of connections established so far, counting reconnects
    pub fn connection_generation(&self) -> u64 {
        self.conn.generation()
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    fn send<T, F>(
        &self,
        request: Request,
        expected: Option<Status>,
        change: Option<SessionChange>,
        map: F,
    ) -> Pending<T>
    where
        F: FnOnce(Reply) -> Result<T> + Send + 'static,
    {
        let (command, reply) = Command::new(request, expected);
        self.conn.dispatch(command, change);
        Pending {
            state: PendingState::Waiting(reply),
            map: Box::new(map),
        }
    }

    fn expect_unit(&self, request: Request, expected: Status) -> Pending<()> {
        self.send(request, Some(expected), None, |_| Ok(()))
    }

    fn expect_job(&self, request: Request, expected: Status) -> Pending<Job> {
        self.send(request, Some(expected), None, Job::from_reply)
    }

    fn expect_stats(&self, request: Request) -> Pending<Stats> {
        self.send(request, Some(Status::Ok), None, |reply| {
            Stats::parse_bytes(&reply.body_or_empty())
        })
    }

    fn expect_list(&self, request: Request) -> Pending<Vec<String>> {
        self.send(request, Some(Status::Ok), None, |reply| {
            parse_list_bytes(&reply.body_or_empty())
        })
    }

    // =========================================================================
    // Producer Operations
    // =========================================================================

    /// Enqueue a job into the used tube; resolves to the new job id
    pub fn put(&self, priority: u32, delay: u32, ttr: u32, body: impl Into<Bytes>) -> Pending<u64> {
        let request = Request::put(priority, delay, ttr, body.into());
        self.send(request, None, None, |reply| match reply.status {
            Status::Inserted => reply.meta_u64(0),
            Status::Buried => Err(StalkError::JobBuried(reply.meta_u64(0)?)),
            other => Err(StalkError::Status(other)),
        })
    }

    /// Select the tube `put` targets
    pub fn use_tube(&self, tube: &str) -> Pending<String> {
        if let Err(e) = validate_tube(tube) {
            return Pending::rejected(e);
        }
        self.send(
            Request::use_tube(tube),
            Some(Status::Using),
            Some(SessionChange::Use(tube.to_string())),
            |reply| reply.meta(0).map(str::to_string),
        )
    }

    // =========================================================================
    // Worker Operations
    // =========================================================================

    /// Reserve a job, waiting as long as it takes
    pub fn reserve(&self) -> Pending<Job> {
        self.expect_job(Request::reserve(), Status::Reserved)
    }

    /// Reserve a job, waiting at most `seconds`
    pub fn reserve_with_timeout(&self, seconds: u32) -> Pending<Job> {
        self.expect_job(Request::reserve_with_timeout(seconds), Status::Reserved)
    }

    pub fn delete(&self, id: u64) -> Pending<()> {
        self.expect_unit(Request::delete(id), Status::Deleted)
    }

    pub fn release(&self, id: u64, priority: u32, delay: u32) -> Pending<()> {
        self.expect_unit(Request::release(id, priority, delay), Status::Released)
    }

    pub fn bury(&self, id: u64, priority: u32) -> Pending<()> {
        self.expect_unit(Request::bury(id, priority), Status::Buried)
    }

    /// Ask for more time on a reserved job
    pub fn touch(&self, id: u64) -> Pending<()> {
        self.expect_unit(Request::touch(id), Status::Touched)
    }

    /// Add a tube to the watch list; resolves to the number watched
    pub fn watch(&self, tube: &str) -> Pending<u64> {
        if let Err(e) = validate_tube(tube) {
            return Pending::rejected(e);
        }
        self.send(
            Request::watch(tube),
            Some(Status::Watching),
            Some(SessionChange::Watch(tube.to_string())),
            |reply| reply.meta_u64(0),
        )
    }

    /// Remove a tube from the watch list; resolves to the number watched
    ///
    /// Ignoring the last watched tube fails with `NOT_IGNORED`.
    pub fn ignore(&self, tube: &str) -> Pending<u64> {
        if let Err(e) = validate_tube(tube) {
            return Pending::rejected(e);
        }
        self.send(
            Request::ignore(tube),
            Some(Status::Watching),
            Some(SessionChange::Ignore(tube.to_string())),
            |reply| reply.meta_u64(0),
        )
    }

    // =========================================================================
    // Peek & Kick
    // =========================================================================

    pub fn peek(&self, id: u64) -> Pending<Job> {
        self.expect_job(Request::peek(id), Status::Found)
    }

    pub fn peek_ready(&self) -> Pending<Job> {
        self.expect_job(Request::peek_ready(), Status::Found)
    }

    pub fn peek_delayed(&self) -> Pending<Job> {
        self.expect_job(Request::peek_delayed(), Status::Found)
    }

    pub fn peek_buried(&self) -> Pending<Job> {
        self.expect_job(Request::peek_buried(), Status::Found)
    }

    /// Kick up to `bound` buried (or delayed) jobs; resolves to the count kicked
    pub fn kick(&self, bound: u64) -> Pending<u64> {
        self.send(Request::kick(bound), Some(Status::Kicked), None, |reply| {
            reply.meta_u64(0)
        })
    }

    pub fn kick_job(&self, id: u64) -> Pending<()> {
        self.expect_unit(Request::kick_job(id), Status::Kicked)
    }

    // =========================================================================
    // Statistics & Tube Administration
    // =========================================================================

    pub fn stats_job(&self, id: u64) -> Pending<Stats> {
        self.expect_stats(Request::stats_job(id))
    }

    pub fn stats_tube(&self, tube: &str) -> Pending<Stats> {
        if let Err(e) = validate_tube(tube) {
            return Pending::rejected(e);
        }
        self.expect_stats(Request::stats_tube(tube))
    }

    pub fn stats(&self) -> Pending<Stats> {
        self.expect_stats(Request::stats())
    }

    pub fn list_tubes(&self) -> Pending<Vec<String>> {
        self.expect_list(Request::list_tubes())
    }

    pub fn list_tubes_watched(&self) -> Pending<Vec<String>> {
        self.expect_list(Request::list_tubes_watched())
    }

    /// The tube the server says this connection uses
    pub fn list_tube_used(&self) -> Pending<String> {
        self.send(Request::list_tube_used(), Some(Status::Using), None, |reply| {
            reply.meta(0).map(str::to_string)
        })
    }

    /// Hold back reservations from `tube` for `delay` seconds
    pub fn pause_tube(&self, tube: &str, delay: u32) -> Pending<()> {
        if let Err(e) = validate_tube(tube) {
            return Pending::rejected(e);
        }
        self.expect_unit(Request::pause_tube(tube, delay), Status::Paused)
    }
}
