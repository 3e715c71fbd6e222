//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging through `tracing`, fields over formatted strings
//! - Logs go to stderr; stdout carries invocation results in local mode
//! - `RUST_LOG` overrides the configured level

pub mod logging;
