//! HTTP translation subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyEvent
//!     → request.rs (target, body, headers, X-Forwarded-For)
//!     → wire.rs (HTTP/1.1 bytes, loopback mode) or reqwest (direct mode)
//!     → [server handles request]
//!     → wire.rs (parse captured response, loopback mode)
//!     → response.rs (sniff.rs + media.rs decide encoding, flatten headers)
//!     → ProxyResponse
//! ```

pub mod media;
pub mod request;
pub mod response;
pub mod server;
pub mod sniff;
pub mod wire;

pub use media::BinaryMediaTypes;
pub use request::{annotate, decode_request};
pub use response::encode_response;
pub use server::{echo_router, HttpServer};
