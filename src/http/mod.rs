//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted TCP connection
//!     → server.rs (acceptor loop, one session per connection)
//!     → request.rs (bounded read, tokenize head and body)
//!     → [routing layer picks a RouteKind]
//!     → handlers.rs (extract.rs for path fields, storage for files)
//!     → compression.rs (gzip when accepted)
//!     → response.rs (status line, headers, Content-Length, body)
//!     → Write to client, close
//! ```

pub mod compression;
pub mod extract;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::Request;
pub use response::{Response, StatusCode};
pub use server::{handle_connection, ConnectionContext, ConnectionError, Exchange, HttpServer, ServerError};
