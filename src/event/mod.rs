//! API Gateway proxy event and response shapes.
//!
//! # Data Flow
//! ```text
//! platform event bytes
//!     → ProxyEvent (serde, opaque fields preserved)
//!     → http::request (decoded into a standard request)
//!     ...
//!     → http::response (encoded from a standard response)
//!     → ProxyResponse → platform result
//! ```

pub mod types;

pub use types::{Identity, ProxyEvent, ProxyResponse, RequestContext, TRUNCATED_BODY};
