//! Connection runtime
//!
//! Owns the socket of one logical connection and pipelines commands over it.
//!
//! ## Ordering
//! Responses carry no request id, so the only correlation is order:
//! - `dispatch` writes a command and pushes it onto the in-flight FIFO
//!   under one lock, so FIFO order is wire order.
//! - The supervisor thread reads, splits complete frames with the frame
//!   detector and resolves the oldest in-flight command with each one.
//!
//! ## Reconnection
//! On loss every in-flight command fails with `ConnectionLost`. With
//! auto-reconnect enabled the supervisor reconnects, replays the session
//! state directly on the new socket, then publishes it and flushes the
//! commands that queued up in the backlog meanwhile.

use std::collections::VecDeque;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bytes::{Bytes, BytesMut};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use super::transport;
use crate::config::Config;
use crate::error::{Result, StalkError};
use crate::protocol::{round_trip, take_frame, Command, Request};
use crate::session::{SessionChange, SessionState};

/// Read chunk size for the supervisor
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// A command together with the session change its success implies
#[derive(Debug)]
struct InFlight {
    command: Command,
    change: Option<SessionChange>,
}

/// Mutable connection state, guarded by one lock
struct Link {
    /// Write half of the live socket; `None` while disconnected
    writer: Option<BufWriter<TcpStream>>,

    /// Handle used to shut the live socket down
    socket: Option<TcpStream>,

    /// Written commands awaiting responses, oldest first
    in_flight: VecDeque<InFlight>,

    /// Commands issued while disconnected, not yet written
    backlog: VecDeque<InFlight>,

    /// Number of connections established so far
    generation: u64,

    closed: bool,
}

impl Link {
    /// Write a command, or hold it in the backlog while disconnected
    fn send(&mut self, entry: InFlight) {
        let Some(writer) = self.writer.as_mut() else {
            self.backlog.push_back(entry);
            return;
        };

        tracing::trace!("-> {}", entry.command.request().line());
        let result = writer
            .write_all(&entry.command.encode())
            .and_then(|_| writer.flush());
        self.in_flight.push_back(entry);

        if let Err(e) = result {
            // The reader notices the shutdown and fails everything in flight
            tracing::warn!("Write failed: {}", e);
            self.writer = None;
            if let Some(socket) = &self.socket {
                let _ = socket.shutdown(Shutdown::Both);
            }
        }
    }
}

/// State shared between callers and the supervisor thread
struct Shared {
    config: Config,
    link: Mutex<Link>,
    session: Mutex<SessionState>,

    /// Dropped by `close` to wake the supervisor out of a reconnect delay
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
}

/// A pipelined client connection
pub struct Connection {
    shared: Arc<Shared>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Connect and start the supervisor thread
    pub fn open(config: Config) -> Result<Self> {
        let stream = transport::connect(&config)?;
        let reader = stream.try_clone()?;
        let socket = stream.try_clone()?;

        let (shutdown_tx, shutdown_rx) = channel::bounded(0);
        let shared = Arc::new(Shared {
            config,
            link: Mutex::new(Link {
                writer: Some(BufWriter::new(stream)),
                socket: Some(socket),
                in_flight: VecDeque::new(),
                backlog: VecDeque::new(),
                generation: 1,
                closed: false,
            }),
            session: Mutex::new(SessionState::new()),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
        });

        let supervisor = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("stalkwire-reader".to_string())
                .spawn(move || shared.supervise(reader, BytesMut::new()))?
        };

        Ok(Self {
            shared,
            supervisor: Mutex::new(Some(supervisor)),
        })
    }

    /// Queue a command for sending
    ///
    /// `change` is applied to the session state if the command succeeds,
    /// before its caller observes the outcome.
    pub fn dispatch(&self, command: Command, change: Option<SessionChange>) {
        let mut link = self.shared.link.lock();
        if link.closed {
            drop(link);
            command.complete(Err(StalkError::ConnectionClosed));
            return;
        }
        link.send(InFlight { command, change });
    }

    /// Snapshot of the believed tube selection
    pub fn session(&self) -> SessionState {
        self.shared.session.lock().clone()
    }

    /// Number of connections established so far (1 after `open`)
    pub fn generation(&self) -> u64 {
        self.shared.link.lock().generation
    }

    pub fn is_connected(&self) -> bool {
        self.shared.link.lock().writer.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.link.lock().closed
    }

    /// Close the connection
    ///
    /// Commands not yet written fail with `Cancelled`; commands in flight
    /// fail with `ConnectionClosed`. Idempotent.
    pub fn close(&self) {
        let backlog = {
            let mut link = self.shared.link.lock();
            if link.closed {
                return;
            }
            link.closed = true;

            if let Some(mut writer) = link.writer.take() {
                let _ = writer
                    .write_all(&Request::quit().encode())
                    .and_then(|_| writer.flush());
            }
            if let Some(socket) = link.socket.take() {
                let _ = socket.shutdown(Shutdown::Both);
            }
            link.backlog.drain(..).collect::<Vec<_>>()
        };

        self.shared.shutdown_tx.lock().take();
        for entry in backlog {
            entry.command.complete(Err(StalkError::Cancelled));
        }

        if let Some(handle) = self.supervisor.lock().take() {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::warn!("Reader thread panicked");
            }
        }
        tracing::debug!("Connection to {} closed", self.shared.config.addr);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.link.lock().closed
    }

    /// Supervisor thread body: read, and reconnect on loss
    fn supervise(&self, mut reader: TcpStream, mut buf: BytesMut) {
        loop {
            let cause = self.read_loop(&mut reader, &mut buf);
            self.connection_lost(&cause);

            if self.is_closed() {
                return;
            }
            if !self.config.auto_reconnect {
                self.shut_down();
                return;
            }

            match self.reconnect() {
                Some((stream, leftover)) => {
                    reader = stream;
                    buf = leftover;
                }
                None => return,
            }
        }
    }

    /// Read until the connection fails; returns the cause
    fn read_loop(&self, reader: &mut TcpStream, buf: &mut BytesMut) -> StalkError {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            loop {
                match take_frame(buf, self.config.max_body_size) {
                    Ok(Some(frame)) => self.deliver(frame),
                    Ok(None) => break,
                    Err(e) => {
                        // A response we cannot frame desynchronizes the stream
                        tracing::warn!("Dropping connection: {}", e);
                        return StalkError::ConnectionLost(e.to_string());
                    }
                }
            }

            match reader.read(&mut chunk) {
                Ok(0) => {
                    return StalkError::ConnectionLost("server closed the connection".to_string())
                }
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return StalkError::ConnectionLost(e.to_string()),
            }
        }
    }

    /// Resolve the oldest in-flight command with a complete frame
    fn deliver(&self, frame: Bytes) {
        let entry = self.link.lock().in_flight.pop_front();
        let Some(InFlight { command, change }) = entry else {
            tracing::warn!("Discarding unsolicited response ({} bytes)", frame.len());
            return;
        };

        let outcome = command.decode(Ok(frame));
        match (&outcome, &change) {
            (Ok(_), Some(change)) => {
                tracing::debug!("Session change applied: {:?}", change);
                self.session.lock().apply(change);
            }
            (Err(e), _) => {
                tracing::trace!("<- {} failed: {}", command.request().line(), e);
            }
            _ => {}
        }
        command.complete(outcome);
    }

    /// Fail every in-flight command and mark the link disconnected
    fn connection_lost(&self, cause: &StalkError) {
        let (failed, closed) = {
            let mut link = self.link.lock();
            link.writer = None;
            link.socket = None;
            (link.in_flight.drain(..).collect::<Vec<_>>(), link.closed)
        };

        if closed {
            tracing::debug!("Reader stopping: {}", cause);
        } else {
            tracing::warn!(
                "Connection to {} lost ({} in flight): {}",
                self.config.addr,
                failed.len(),
                cause
            );
        }

        for entry in failed {
            let err = if closed {
                StalkError::ConnectionClosed
            } else {
                StalkError::ConnectionLost(cause.to_string())
            };
            entry.command.complete(Err(err));
        }
    }

    /// Mark closed for good and fail whatever is still queued
    fn shut_down(&self) {
        let backlog = {
            let mut link = self.link.lock();
            link.closed = true;
            link.backlog.drain(..).collect::<Vec<_>>()
        };
        for entry in backlog {
            entry.command.complete(Err(StalkError::ConnectionClosed));
        }
    }

    /// Retry until a connection is re-established, or the client closes
    fn reconnect(&self) -> Option<(TcpStream, BytesMut)> {
        let mut attempt: u64 = 0;

        loop {
            match self.shutdown_rx.recv_timeout(self.config.reconnect_delay()) {
                Err(RecvTimeoutError::Timeout) => {}
                _ => return None,
            }
            if self.is_closed() {
                return None;
            }

            attempt += 1;
            match self.establish() {
                Ok(restored) => return Some(restored),
                Err(StalkError::ConnectionClosed) => return None,
                Err(e) => {
                    tracing::warn!("Reconnect attempt {} to {} failed: {}", attempt, self.config.addr, e);
                }
            }
        }
    }

    /// Connect, replay the session, then publish the socket and flush the
    /// backlog
    fn establish(&self) -> Result<(TcpStream, BytesMut)> {
        let mut stream = transport::connect(&self.config)?;
        let mut buf = BytesMut::new();

        // Replay bypasses the pipeline: nothing else may reach this socket first
        let session = self.session.lock().clone();
        stream.set_read_timeout(Some(self.config.connect_timeout()).filter(|d| !d.is_zero()))?;
        for (request, expected) in session.replay_plan() {
            tracing::debug!("Replaying {:?}", request.line());
            round_trip(
                &mut stream,
                &mut buf,
                &request,
                Some(&expected),
                self.config.max_body_size,
            )?;
        }
        stream.set_read_timeout(None)?;

        let reader = stream.try_clone()?;
        let socket = stream.try_clone()?;

        let mut link = self.link.lock();
        if link.closed {
            let _ = stream.shutdown(Shutdown::Both);
            return Err(StalkError::ConnectionClosed);
        }
        link.generation += 1;
        link.writer = Some(BufWriter::new(stream));
        link.socket = Some(socket);

        let backlog: Vec<InFlight> = link.backlog.drain(..).collect();
        tracing::info!(
            "Reconnected to {} (generation {}), flushing {} queued commands",
            self.config.addr,
            link.generation,
            backlog.len()
        );
        for entry in backlog {
            link.send(entry);
        }

        Ok((reader, buf))
    }
}
