//! Synthetic listener fed by platform invocations.
//!
//! # Responsibilities
//! - Hand each invocation's connection to the server as an accepted socket
//! - Let the invocation wait for the server to finish with its connection
//!
//! # Design Decisions
//! - Single-slot hand-off: at most one connection waits to be accepted,
//!   a further invocation blocks until the server accepts again
//! - Accept never fails while any handle is alive

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::net::connection::{SyntheticConnection, UNSPECIFIED_ADDR};

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Every handle or the listener itself has been dropped.
    Closed,
    /// The server dropped the connection without a completion being delivered.
    Abandoned,
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Closed => write!(f, "Synthetic listener is closed"),
            ListenerError::Abandoned => write!(f, "Connection abandoned before completion"),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Create a connected listener/handle pair.
pub fn bind() -> (SyntheticListener, ListenerHandle) {
    let (tx, rx) = mpsc::channel(1);
    tracing::debug!("Synthetic listener bound");
    (SyntheticListener { incoming: rx }, ListenerHandle { outgoing: tx })
}

/// The server side: yields one connection per invocation.
#[derive(Debug)]
pub struct SyntheticListener {
    incoming: mpsc::Receiver<SyntheticConnection>,
}

impl SyntheticListener {
    /// Wait for the next invocation's connection.
    pub async fn accept(&mut self) -> Result<(SyntheticConnection, SocketAddr), ListenerError> {
        let conn = self.incoming.recv().await.ok_or(ListenerError::Closed)?;
        let addr = conn.remote_addr();

        tracing::debug!(
            connection_id = %conn.id(),
            peer_addr = %addr,
            "Connection accepted"
        );

        Ok((conn, addr))
    }

    /// Always the unspecified address.
    pub fn local_addr(&self) -> SocketAddr {
        UNSPECIFIED_ADDR
    }
}

impl axum::serve::Listener for SyntheticListener {
    type Io = SyntheticConnection;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        match SyntheticListener::accept(self).await {
            Ok(accepted) => accepted,
            Err(e) => {
                // Nothing can ever arrive again; park the server like an idle socket.
                tracing::debug!(error = %e, "Synthetic listener drained");
                std::future::pending().await
            }
        }
    }

    fn local_addr(&self) -> std::io::Result<Self::Addr> {
        Ok(UNSPECIFIED_ADDR)
    }
}

/// The invocation side: pushes connections and waits for them to close.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    outgoing: mpsc::Sender<SyntheticConnection>,
}

impl ListenerHandle {
    /// Deliver `request` as a new connection from `remote_addr` and return the
    /// bytes the server wrote before closing it.
    pub async fn dispatch(
        &self,
        remote_addr: SocketAddr,
        request: Bytes,
    ) -> Result<Bytes, ListenerError> {
        let (conn, completion) = SyntheticConnection::new(remote_addr, request);
        let id = conn.id();

        self.outgoing.send(conn).await.map_err(|_| ListenerError::Closed)?;
        tracing::trace!(connection_id = %id, "Connection handed off");

        completion.await.map_err(|_| ListenerError::Abandoned)
    }

    /// True once the listener has been dropped.
    pub fn is_closed(&self) -> bool {
        self.outgoing.is_closed()
    }
}
