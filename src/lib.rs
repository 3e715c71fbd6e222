//! Run socket-style HTTP servers behind API Gateway proxy invocations.

pub mod adapter;
pub mod config;
pub mod event;
pub mod harness;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use adapter::{AdapterError, DirectAdapter, Invoke, LoopbackAdapter};
pub use config::AdapterConfig;
pub use event::{ProxyEvent, ProxyResponse};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
