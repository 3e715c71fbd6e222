//! Synthetic network layer.
//!
//! # Data Flow
//! ```text
//! Invocation
//!     → ListenerHandle::dispatch (request bytes + caller address)
//!     → listener.rs (single-slot hand-off)
//!     → SyntheticListener::accept (server side, e.g. axum::serve)
//!     → connection.rs (reads request, captures response)
//!     → close fires completion → invocation resumes with response bytes
//!
//! Connection States:
//!     Open → Closed
//! ```

pub mod connection;
pub mod listener;

pub use connection::{ConnectionId, ConnectionState, SyntheticConnection};
pub use listener::{bind, ListenerError, ListenerHandle, SyntheticListener};
