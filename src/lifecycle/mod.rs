//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Trigger → acceptor stops accepting → in-flight sessions drain → run() returns
//!
//! Signals (signals.rs):
//!     SIGINT (Ctrl+C) → trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Shutdown state is sticky: subscribing after the trigger still observes it
//! - Serving the configured capacity ends the process the same way

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
