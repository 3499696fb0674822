//! Connection Handler Module
//!
//! This module handles individual client connections to flashmc.
//! Each client gets its own handler task that runs in a loop,
//! reading command lines and sending replies.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  Read command line           │
//!    │  Parse it                    │
//!    │  Read data line (storage)    │
//!    │  Execute against the store   │
//!    │  Send reply (unless noreply) │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. Client disconnects / stream fails
//!        │
//!        ▼
//! 5. Stream shut down, handler task ends
//! ```
//!
//! ## Error Policy
//!
//! A malformed line or a failed command never ends the connection: the
//! client gets an error reply and the loop continues. Only end of stream or
//! an I/O error meaning the stream is gone ends it; other read and write
//! errors are logged and the loop carries on.
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut` buffer and lines are split off
//! its front. A line that grows past [`MAX_LINE_LENGTH`] without a newline
//! is dropped up to the next newline, so a misbehaving client can't make
//! the buffer grow without bound.

use crate::commands::CommandHandler;
use crate::protocol::{parse_command, Reply};
use bytes::BytesMut;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace, warn};

/// Longest line accepted, terminator excluded (64 KB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// One line taken off the read buffer.
#[derive(Debug)]
enum Line {
    /// A complete line without its terminator
    Text(String),
    /// A line longer than `MAX_LINE_LENGTH`; its bytes were discarded
    TooLong,
    /// A complete line that isn't valid UTF-8
    InvalidUtf8,
}

/// Handles a single client connection.
///
/// Generic over the stream so the same loop serves TCP sockets and the
/// in-memory streams used in tests.
pub struct ConnectionHandler<S> {
    /// The stream for this connection
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// Dropping bytes until the end of an oversized line
    discarding: bool,

    /// The command handler (shared storage)
    command_handler: CommandHandler,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The byte stream for this connection
    /// * `addr` - The client's socket address
    /// * `command_handler` - The command handler for executing commands
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            discarding: false,
            command_handler,
            stats,
        }
    }

    /// Runs the main connection loop.
    ///
    /// This method reads commands from the client, executes them, and
    /// sends back replies until the client disconnects or the stream fails.
    /// The stream is shut down on the way out, whatever the reason.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = match self.main_loop().await {
            Err(ConnectionError::ClientDisconnected) => {
                debug!(client = %self.addr, "Client disconnected");
                Ok(())
            }
            Err(e) if e.is_disconnect() => {
                debug!(client = %self.addr, error = %e, "Connection dropped by client");
                Err(e)
            }
            Err(e) => {
                warn!(client = %self.addr, error = %e, "Connection error");
                Err(e)
            }
            Ok(()) => Ok(()),
        };

        if let Err(e) = self.stream.shutdown().await {
            trace!(client = %self.addr, error = %e, "Shutdown after close failed");
        }

        self.stats.connection_closed();
        result
    }

    /// The read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            let line = match self.read_line().await? {
                Line::Text(line) => line,
                Line::TooLong => {
                    self.send_reply(&Reply::client_error("line too long")).await?;
                    continue;
                }
                Line::InvalidUtf8 => {
                    self.send_reply(&Reply::client_error("command line is not valid UTF-8"))
                        .await?;
                    continue;
                }
            };

            trace!(client = %self.addr, line = %line, "Command received");

            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(e) => {
                    if let Some(name) = e.unknown_verb() {
                        debug!(client = %self.addr, command = %name, "Unknown command");
                        if e.has_data_line() {
                            // The payload belongs to the rejected command
                            self.read_line().await?;
                        }
                        self.send_reply(&Reply::Error(format!("unknown command '{}'", name)))
                            .await?;
                    } else {
                        warn!(client = %self.addr, error = %e, "Parse error");
                        self.send_reply(&Reply::client_error(e.to_string())).await?;
                    }
                    continue;
                }
            };

            let data = if command.verb.expects_data() {
                match self.read_line().await? {
                    Line::Text(data) => Some(data),
                    Line::TooLong => {
                        self.send_reply(&Reply::client_error("data line too long"))
                            .await?;
                        continue;
                    }
                    Line::InvalidUtf8 => {
                        self.send_reply(&Reply::client_error("data line is not valid UTF-8"))
                            .await?;
                        continue;
                    }
                }
            } else {
                None
            };

            let reply = self.command_handler.execute(&command, data.as_deref());
            self.stats.command_processed();

            if reply.is_error() {
                debug!(client = %self.addr, command = %command.verb, reply = %reply, "Command failed");
            }

            if command.noreply {
                trace!(client = %self.addr, reply = %reply, "Reply suppressed");
                continue;
            }

            self.send_reply(&reply).await?;
        }
    }

    /// Takes the next line off the buffer, reading from the stream as needed.
    ///
    /// The trailing `\n` and an optional `\r` before it are stripped.
    async fn read_line(&mut self) -> Result<Line, ConnectionError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let raw = self.buffer.split_to(pos + 1);

                if self.discarding {
                    self.discarding = false;
                    return Ok(Line::TooLong);
                }

                let mut content = &raw[..pos];
                if let Some(stripped) = content.strip_suffix(b"\r") {
                    content = stripped;
                }

                if content.len() > MAX_LINE_LENGTH {
                    warn!(client = %self.addr, size = content.len(), "Line too long");
                    return Ok(Line::TooLong);
                }

                return Ok(match std::str::from_utf8(content) {
                    Ok(text) => Line::Text(text.to_string()),
                    Err(_) => Line::InvalidUtf8,
                });
            }

            // No terminator yet; keep at most one line's worth buffered
            if self.buffer.len() > MAX_LINE_LENGTH {
                if !self.discarding {
                    warn!(
                        client = %self.addr,
                        size = self.buffer.len(),
                        "Line length limit exceeded, discarding"
                    );
                }
                self.buffer.clear();
                self.discarding = true;
            }

            self.read_more_data().await?;
        }
    }

    /// Reads more data from the stream into the buffer.
    ///
    /// Read errors that leave the stream usable are logged and swallowed;
    /// the caller simply waits for the next chunk.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        // Ensure we have some capacity
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = match self.stream.get_mut().read_buf(&mut self.buffer).await {
            Ok(n) => n,
            Err(e) if is_disconnect_kind(e.kind()) => return Err(e.into()),
            Err(e) => {
                warn!(client = %self.addr, error = %e, "Error reading from connection");
                return Ok(());
            }
        };

        if n == 0 {
            // Connection closed by client
            if self.buffer.is_empty() || self.discarding {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                // Partial line in buffer
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Sends a reply to the client.
    ///
    /// Only a write error meaning the stream is gone ends the connection.
    /// After any other error the unsent bytes stay buffered and go out
    /// ahead of the next reply.
    async fn send_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        let bytes = reply.serialize();

        match self.write_bytes(&bytes).await {
            Ok(()) => {
                self.stats.bytes_written(bytes.len());
                trace!(
                    client = %self.addr,
                    reply = %reply,
                    "Sent reply"
                );
            }
            Err(e) if is_disconnect_kind(e.kind()) => return Err(e.into()),
            Err(e) => {
                warn!(client = %self.addr, error = %e, "Error writing to connection");
            }
        }

        Ok(())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial line)
    #[error("Unexpected end of stream")]
    UnexpectedEof,
}

impl ConnectionError {
    /// Returns true if the peer went away rather than something failing.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ConnectionError::ClientDisconnected | ConnectionError::UnexpectedEof => true,
            ConnectionError::IoError(e) => is_disconnect_kind(e.kind()),
        }
    }
}

/// I/O error kinds meaning the stream itself is gone.
fn is_disconnect_kind(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
            | ErrorKind::WriteZero
    )
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion.
///
/// # Arguments
///
/// * `stream` - The byte stream for this connection
/// * `addr` - The client's socket address
/// * `command_handler` - The command handler for executing commands
/// * `stats` - Shared connection statistics
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats);
    if let Err(e) = handler.run().await {
        if !e.is_disconnect() {
            debug!(client = %addr, error = %e, "Connection ended with error");
        }
    }
}
