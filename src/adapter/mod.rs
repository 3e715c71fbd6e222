//! Invocation adapters.
//!
//! # Data Flow
//! ```text
//! event bytes + invocation context
//!     → ProxyEvent → http::request::decode_request
//!     → loopback.rs: wire bytes → ListenerHandle → server → wire bytes
//!       direct.rs:   reqwest → local server socket
//!     → http::response::encode_response
//!     → ProxyResponse
//! ```
//!
//! # Design Decisions
//! - Loopback mode surfaces every failure to the harness as an invocation error
//! - Direct mode absorbs failures into a 500 response and records a diagnostic

use std::future::Future;

use serde_json::Value;

use crate::event::ProxyResponse;

pub mod direct;
pub mod error;
pub mod loopback;

pub use direct::{DirectAdapter, Dispatch};
pub use error::{AdapterError, AdapterResult};
pub use loopback::LoopbackAdapter;

/// A handler for one platform invocation.
pub trait Invoke: Send + Sync {
    /// Handle the raw event bytes of one invocation.
    ///
    /// `Err` is reported to the platform as a failed invocation.
    fn invoke(
        &self,
        event: &[u8],
        context: &Value,
    ) -> impl Future<Output = AdapterResult<ProxyResponse>> + Send;
}
