//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, concurrent-connection limit)
//!     → connection.rs (session id, active count, drain on shutdown)
//!     → Hand off to HTTP layer (one request, one response, close)
//! ```
//!
//! # Design Decisions
//! - Semaphore-bounded accept prevents resource exhaustion
//! - Each session tracked so shutdown can wait for in-flight responses

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
