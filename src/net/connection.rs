//! Synthetic connection state machine.
//!
//! # Responsibilities
//! - Serve the serialized request to the server as socket reads
//! - Capture everything the server writes back
//! - Signal completion exactly once, on close or drop
//!
//! # Design Decisions
//! - Buffers are owned by the connection, never shared across invocations
//! - Reads stay pending once the request is drained, like an idle socket
//! - Deadlines are accepted and ignored; the platform bounds each invocation

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::oneshot;

/// Global atomic counter for connection IDs.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Placeholder address reported as the local end of every synthetic connection.
pub const UNSPECIFIED_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Connection state for lifecycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Request may still be read and response bytes written.
    Open,
    /// Completion has been signalled; further writes fail.
    Closed,
}

/// Receiving end of a connection's completion signal.
///
/// Resolves to the bytes the server wrote before closing.
pub type Completion = oneshot::Receiver<Bytes>;

/// An accepted connection backed by in-memory buffers.
#[derive(Debug)]
pub struct SyntheticConnection {
    id: ConnectionId,
    remote_addr: SocketAddr,
    request: Bytes,
    response: Vec<u8>,
    state: ConnectionState,
    done: Option<oneshot::Sender<Bytes>>,
}

impl SyntheticConnection {
    /// Create a connection carrying `request`, and the completion it will fire on close.
    pub fn new(remote_addr: SocketAddr, request: Bytes) -> (Self, Completion) {
        let (done, completion) = oneshot::channel();
        let conn = Self {
            id: ConnectionId::new(),
            remote_addr,
            request,
            response: Vec::new(),
            state: ConnectionState::Open,
            done: Some(done),
        };
        (conn, completion)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Always the unspecified address.
    pub fn local_addr(&self) -> SocketAddr {
        UNSPECIFIED_ADDR
    }

    /// The invoking client's address, as reported by the event.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn set_deadline(&mut self, _deadline: Option<Instant>) -> io::Result<()> {
        Ok(())
    }

    pub fn set_read_deadline(&mut self, _deadline: Option<Instant>) -> io::Result<()> {
        Ok(())
    }

    pub fn set_write_deadline(&mut self, _deadline: Option<Instant>) -> io::Result<()> {
        Ok(())
    }

    /// Close the connection, handing the captured response to the waiting invocation.
    pub fn close(&mut self) {
        if let Some(done) = self.done.take() {
            self.state = ConnectionState::Closed;
            let response = Bytes::from(std::mem::take(&mut self.response));
            tracing::trace!(
                connection_id = %self.id,
                response_bytes = response.len(),
                "Synthetic connection closed"
            );
            // The invocation may have given up waiting; nothing to hand back then.
            let _ = done.send(response);
        }
    }
}

impl AsyncRead for SyntheticConnection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.request.is_empty() || self.state == ConnectionState::Closed {
            return Poll::Pending;
        }
        let n = buf.remaining().min(self.request.len());
        let chunk = self.request.split_to(n);
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for SyntheticConnection {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.state == ConnectionState::Closed {
            return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
        }
        self.response.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.close();
        Poll::Ready(Ok(()))
    }
}

impl Drop for SyntheticConnection {
    fn drop(&mut self) {
        self.close();
    }
}
