//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Start server task → Start harness
//!
//! Shutdown (shutdown.rs):
//!     Input exhausted or Ctrl+C → Stop accepting → Drain connections → Exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
