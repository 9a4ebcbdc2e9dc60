//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Received request bytes
//!     → router.rs (ordered route table lookup)
//!     → matcher.rs (token containment or anchored prefix)
//!     → Return: RouteKind or None (404)
//! ```
//!
//! # Design Decisions
//! - Fixed table compiled at startup, immutable at runtime
//! - No regex in hot path (literal tokens only)
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod matcher;
pub mod router;

pub use router::{RouteKind, Router, ROUTE_TABLE};
