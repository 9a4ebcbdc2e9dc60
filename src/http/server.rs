//! HTTP server: acceptor loop and per-connection handling.
//!
//! # Responsibilities
//! - Accept connections up to the configured capacity
//! - Schedule sessions sequentially or one task per connection
//! - Read one request, route, dispatch, write one response, close
//! - Report transport failures without affecting other sessions
//! - Drain in-flight sessions on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::config::{AcceptMode, ServerConfig};
use crate::http::handlers::{dispatch, HandlerOptions};
use crate::http::request::{read_request, ParseError, ReadError, Request};
use crate::http::response::{Response, StatusCode};
use crate::lifecycle::ShutdownSignal;
use crate::net::{ConnectionGuard, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::{RouteKind, Router};
use crate::storage::{BlobStore, FsStore};

/// Fatal acceptor failure.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport failure on a single session.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to read request: {0}")]
    Read(std::io::Error),

    #[error("failed to write response: {0}")]
    Write(std::io::Error),

    #[error("request not received within {0:?}")]
    Timeout(Duration),
}

impl ConnectionError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionError::Read(_) => "read",
            ConnectionError::Write(_) => "write",
            ConnectionError::Timeout(_) => "timeout",
        }
    }
}

/// What one session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub route: Option<RouteKind>,
    pub status: StatusCode,
    pub bytes_written: usize,
}

/// Everything a session needs, shared by all sessions.
#[derive(Debug)]
pub struct ConnectionContext<S> {
    pub router: Router,
    pub store: S,
    pub options: HandlerOptions,
    pub max_request_bytes: usize,
    pub read_timeout: Duration,
}

impl<S: BlobStore> ConnectionContext<S> {
    pub fn from_config(config: &ServerConfig, store: S) -> Self {
        Self {
            router: Router::from_config(&config.routing),
            store,
            options: HandlerOptions {
                gzip: config.compression.gzip,
            },
            max_request_bytes: config.limits.max_request_bytes,
            read_timeout: Duration::from_secs(config.timeouts.read_secs),
        }
    }
}

fn status_for(err: &ParseError) -> StatusCode {
    match err {
        ParseError::InvalidContentLength(_) => StatusCode::BadRequest,
        ParseError::TooLarge(_) => StatusCode::PayloadTooLarge,
    }
}

/// Serve exactly one request on `stream`, then close it.
///
/// Returns `Ok(None)` when the peer closed without sending anything. A peer
/// that misses the read deadline is answered `408 Request Timeout` and the
/// session still ends in [`ConnectionError::Timeout`].
pub async fn handle_connection<T, S>(
    mut stream: T,
    ctx: &ConnectionContext<S>,
) -> Result<Option<Exchange>, ConnectionError>
where
    T: AsyncRead + AsyncWrite + Unpin,
    S: BlobStore,
{
    let outcome =
        tokio::time::timeout(ctx.read_timeout, read_request(&mut stream, ctx.max_request_bytes)).await;
    let received = match outcome {
        Ok(received) => received,
        Err(_) => {
            let response = Response::new(StatusCode::RequestTimeout);
            if let Err(e) = write_response(&mut stream, &response).await {
                tracing::debug!(error = %e, "Timeout response not delivered");
            }
            return Err(ConnectionError::Timeout(ctx.read_timeout));
        }
    };

    let (route, response) = match received {
        Ok(buf) if buf.is_empty() => return Ok(None),
        Ok(buf) => {
            let route = ctx.router.match_request(&buf);
            let response = match Request::parse(&buf) {
                Ok(request) => respond(route, &request, ctx).await,
                Err(e) => {
                    tracing::debug!(error = %e, "Malformed request");
                    Response::new(status_for(&e))
                }
            };
            (route, response)
        }
        Err(ReadError::Parse(e)) => {
            tracing::debug!(error = %e, "Request rejected");
            (None, Response::new(status_for(&e)))
        }
        Err(ReadError::Io(e)) => return Err(ConnectionError::Read(e)),
    };

    let bytes_written = write_response(&mut stream, &response).await?;

    Ok(Some(Exchange {
        route,
        status: response.status(),
        bytes_written,
    }))
}

/// Write `response`, flush, and close the write half.
async fn write_response<T>(stream: &mut T, response: &Response) -> Result<usize, ConnectionError>
where
    T: AsyncWrite + Unpin,
{
    let bytes = response.to_bytes();
    stream.write_all(&bytes).await.map_err(ConnectionError::Write)?;
    stream.flush().await.map_err(ConnectionError::Write)?;
    if let Err(e) = stream.shutdown().await {
        tracing::debug!(error = %e, "Shutdown after response failed");
    }
    Ok(bytes.len())
}

async fn respond<S: BlobStore>(
    route: Option<RouteKind>,
    request: &Request,
    ctx: &ConnectionContext<S>,
) -> Response {
    match dispatch(route, request, &ctx.store, ctx.options).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                route = route.map(|r| r.as_str()).unwrap_or("none"),
                target = request.target(),
                error = %e,
                "Handler failed"
            );
            Response::new(StatusCode::InternalServerError)
        }
    }
}

/// HTTP server over a blob store.
pub struct HttpServer<S = FsStore> {
    ctx: Arc<ConnectionContext<S>>,
    mode: AcceptMode,
    capacity: Option<usize>,
    tracker: ConnectionTracker,
}

impl HttpServer<FsStore> {
    /// Create a server storing files under the configured directory.
    pub fn new(config: ServerConfig) -> Self {
        let store = FsStore::new(config.storage.directory.clone());
        Self::with_store(config, store)
    }
}

impl<S: BlobStore> HttpServer<S> {
    pub fn with_store(config: ServerConfig, store: S) -> Self {
        Self {
            ctx: Arc::new(ConnectionContext::from_config(&config, store)),
            mode: config.listener.mode,
            capacity: config.listener.capacity,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Accept and serve connections until the capacity is reached or
    /// shutdown is triggered, then wait for in-flight sessions.
    ///
    /// Returns the number of connections accepted.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) -> Result<usize, ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = ?self.mode,
            capacity = ?self.capacity,
            "HTTP server starting"
        );

        let mut accepted = 0usize;
        loop {
            if self.capacity.is_some_and(|cap| accepted >= cap) {
                tracing::info!(accepted, "Connection capacity reached");
                break;
            }

            let next = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting");
                    break;
                }
                next = listener.accept() => next,
            };

            let (stream, peer, permit) = match next {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, "Accept failed");
                    self.tracker.wait_idle().await;
                    return Err(e.into());
                }
            };
            accepted += 1;

            let guard = self.tracker.track();
            let ctx = Arc::clone(&self.ctx);
            match self.mode {
                AcceptMode::Sequential => {
                    serve(stream, peer, guard, &ctx).await;
                    drop(permit);
                }
                AcceptMode::Concurrent => {
                    tokio::spawn(async move {
                        let _permit = permit;
                        serve(stream, peer, guard, &ctx).await;
                    });
                }
            }
        }

        self.tracker.wait_idle().await;
        tracing::info!(accepted, "HTTP server stopped");
        Ok(accepted)
    }
}

async fn serve<S: BlobStore>(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    guard: ConnectionGuard,
    ctx: &ConnectionContext<S>,
) {
    let start = Instant::now();
    let connection_id = guard.id();

    match handle_connection(stream, ctx).await {
        Ok(Some(exchange)) => {
            let route = exchange.route.map(|r| r.as_str()).unwrap_or("none");
            tracing::info!(
                connection_id = %connection_id,
                peer_addr = %peer,
                route,
                status = exchange.status.as_u16(),
                bytes = exchange.bytes_written,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request served"
            );
            metrics::record_request(route, exchange.status.as_u16(), start);
        }
        Ok(None) => {
            tracing::debug!(connection_id = %connection_id, peer_addr = %peer, "Peer closed without a request");
        }
        Err(e) => {
            tracing::warn!(connection_id = %connection_id, peer_addr = %peer, error = %e, "Connection failed");
            metrics::record_transport_error(e.kind());
        }
    }
    drop(guard);
}
