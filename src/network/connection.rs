//! Client Connection
//!
//! One point-to-point connection to an OrbitKV server. Owns the socket, the
//! buffered streams over it, and the framing contract: strictly one request
//! frame out, one response frame back, never pipelined. The pool layered on
//! top guarantees a single caller thread drives send/receive at a time.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::protocol::{self, opcode, ServerFault};
use super::idle::{IdleScheduler, TimerKey};

/// Buffered halves of the socket, released together
struct Io {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

/// State shared with the timer thread
///
/// `io` absent means the connection is closed, terminally. `idle` holds the
/// token of the outstanding idle timer, present only while parked. The one
/// mutex around this pair is what makes the park / fire / reclaim triangle
/// race-safe.
struct Shared {
    io: Option<Io>,
    idle: Option<TimerKey>,
}

/// A single connection to an OrbitKV server
pub struct Connection {
    /// Peer address for logging
    peer_addr: String,

    /// Delay before an unreclaimed parked connection is closed
    idle_timeout: Duration,

    /// Shared timer facility, owned by the pool
    scheduler: Arc<IdleScheduler>,

    shared: Arc<Mutex<Shared>>,
}

impl Connection {
    /// Open a connection to the configured server
    ///
    /// Sets up buffered I/O sized from the config and disables Nagle's
    /// algorithm for request/response latency.
    pub fn connect(config: &Config, scheduler: Arc<IdleScheduler>) -> Result<Self> {
        let stream = TcpStream::connect((config.host.as_str(), config.port))?;

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| format!("{}:{}", config.host, config.port));

        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        tracing::debug!("connected to {}", peer_addr);

        Ok(Self {
            peer_addr,
            idle_timeout: config.idle_timeout,
            scheduler,
            shared: Arc::new(Mutex::new(Shared {
                io: Some(Io {
                    reader: BufReader::with_capacity(config.recv_buffer_size, read_stream),
                    writer: BufWriter::with_capacity(config.send_buffer_size, write_stream),
                }),
                idle: None,
            })),
        })
    }

    // -------------------------------------------------------------------------
    // Framing
    // -------------------------------------------------------------------------

    /// Send one request frame and flush it
    ///
    /// `body` is the externally-encoded message payload; pass an empty slice
    /// for body-less requests. The frame is fully handed to the transport
    /// before this returns.
    pub fn send(&self, op: u8, body: &[u8]) -> Result<()> {
        let mut shared = self.shared.lock();
        let io = shared.io.as_mut().ok_or(ClientError::Closed)?;
        protocol::write_frame(&mut io.writer, op, body)
    }

    /// Receive one response frame, expecting `op`
    ///
    /// An error-response frame fails with the server's reported code and
    /// message, checked before the opcode match since an error frame never
    /// carries the expected opcode. Any other opcode mismatch is a fatal
    /// desynchronization: byte alignment with the stream can no longer be
    /// trusted, so the connection must be discarded, not retried.
    ///
    /// On success returns the (possibly empty) body for external decoding.
    pub fn receive(&self, op: u8) -> Result<Vec<u8>> {
        let mut shared = self.shared.lock();
        let io = shared.io.as_mut().ok_or(ClientError::Closed)?;
        let (got, body) = protocol::read_frame(&mut io.reader)?;

        if got == opcode::ERROR_RESP {
            let fault = ServerFault::decode(&body)?;
            return Err(ClientError::Server {
                code: fault.code,
                message: fault.message,
            });
        }

        if got != op {
            return Err(ClientError::Framing(format!(
                "unexpected message code: expected 0x{:02x}, got 0x{:02x}",
                op, got
            )));
        }

        Ok(body)
    }

    /// Receive a body-less response frame, expecting `op`
    ///
    /// Same as [`receive`](Self::receive), with the additional requirement
    /// that the frame carries no body.
    pub fn receive_ack(&self, op: u8) -> Result<()> {
        let body = self.receive(op)?;
        if !body.is_empty() {
            return Err(ClientError::Framing(format!(
                "unexpected payload: {} bytes on a body-less response",
                body.len()
            )));
        }
        Ok(())
    }

    /// Run `f` with the buffered writer
    ///
    /// For collaborators that interleave their own writes for batched
    /// protocols. Whatever is written must leave the stream frame-aligned.
    pub fn with_writer<T>(
        &self,
        f: impl FnOnce(&mut BufWriter<TcpStream>) -> std::io::Result<T>,
    ) -> Result<T> {
        let mut shared = self.shared.lock();
        let io = shared.io.as_mut().ok_or(ClientError::Closed)?;
        f(&mut io.writer).map_err(ClientError::Transport)
    }

    // -------------------------------------------------------------------------
    // Idle Lifecycle
    // -------------------------------------------------------------------------

    /// Park the connection: schedule a deferred close after the idle delay
    ///
    /// Called by the pool when the connection is returned unused. The
    /// recorded token is what the firing timer checks its own identity
    /// against, so a replaced or cancelled timer can never close a
    /// reclaimed connection.
    pub fn begin_idle(&self) {
        let mut shared = self.shared.lock();
        let state = Arc::downgrade(&self.shared);
        let peer = self.peer_addr.clone();
        let key = self
            .scheduler
            .schedule(self.idle_timeout, move |fired| idle_fired(&state, fired, &peer));
        // Lock is held across the schedule call, so the job cannot observe
        // the shared state before the new token is recorded.
        shared.idle = Some(key);
    }

    /// Reclaim the connection from the pool
    ///
    /// Cancels the outstanding idle timer (best-effort; an already-fired
    /// timer loses the token check instead) and reports whether the socket
    /// survived. `false` means the timer won and the connection is dead;
    /// the pool must discard it and construct a fresh one.
    pub fn end_idle_and_check_valid(&self) -> bool {
        let mut shared = self.shared.lock();
        if let Some(key) = shared.idle.take() {
            self.scheduler.cancel(key);
        }
        shared.io.is_some()
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Close the connection explicitly
    ///
    /// Terminal: cancels any outstanding idle timer and releases the socket
    /// and both buffered streams. Closing an already-closed connection is a
    /// no-op.
    pub fn close(&self) -> Result<()> {
        let mut shared = self.shared.lock();
        if let Some(key) = shared.idle.take() {
            self.scheduler.cancel(key);
        }
        match shared.io.take() {
            Some(io) => {
                tracing::debug!("closed connection to {}", self.peer_addr);
                release_io(io)
            }
            None => Ok(()),
        }
    }

    /// Whether the socket is still present
    pub fn is_open(&self) -> bool {
        self.shared.lock().io.is_some()
    }

    /// Remote address this connection was opened against
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // Keeps the scheduler queue tidy; a timer that fires anyway finds
        // only a dead weak reference.
        let mut shared = self.shared.lock();
        if let Some(key) = shared.idle.take() {
            self.scheduler.cancel(key);
        }
    }
}

/// Timer-thread half of the idle race
///
/// Runs under the same mutex as `begin_idle` and `end_idle_and_check_valid`.
/// A stale token means the connection was reclaimed (and possibly re-idled)
/// after this timer was scheduled; the fire is then a no-op.
fn idle_fired(state: &Weak<Mutex<Shared>>, fired: TimerKey, peer: &str) {
    let state = match state.upgrade() {
        Some(state) => state,
        None => return,
    };

    let mut shared = state.lock();
    if shared.idle != Some(fired) {
        return;
    }
    shared.idle = None;

    if let Some(io) = shared.io.take() {
        tracing::debug!("closing idle connection to {}", peer);
        if let Err(e) = release_io(io) {
            // Best-effort: the socket is being discarded either way, and no
            // caller is waiting on this path.
            tracing::warn!("error closing idle connection to {}: {}", peer, e);
        }
    }
}

/// Release the socket under both buffered streams
///
/// Buffered but unflushed output is dropped, not sent: retirement only
/// happens between request cycles, when the stream is quiet.
fn release_io(io: Io) -> Result<()> {
    io.writer
        .get_ref()
        .shutdown(Shutdown::Both)
        .map_err(ClientError::Resource)?;
    Ok(())
}
