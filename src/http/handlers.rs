//! Route handlers.
//!
//! Each handler turns a tokenized request (and, for the file routes, the
//! blob store) into a [`Response`]. Only storage and encoding failures are
//! errors; missing routes and missing files are ordinary 404 responses.

use thiserror::Error;

use crate::http::compression::encode_body;
use crate::http::extract::extract_between;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::routing::RouteKind;
use crate::storage::{BlobStore, StorageError};

pub const TEXT_PLAIN: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A handler failure that must not be reported as success.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("response compression failed: {0}")]
    Compression(std::io::Error),
}

/// Settings the handlers read per request.
#[derive(Debug, Clone, Copy)]
pub struct HandlerOptions {
    pub gzip: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self { gzip: true }
    }
}

/// Run the handler for `route`, or answer 404 when nothing matched.
pub async fn dispatch<S: BlobStore>(
    route: Option<RouteKind>,
    request: &Request,
    store: &S,
    options: HandlerOptions,
) -> Result<Response, HandlerError> {
    match route {
        Some(RouteKind::Root) => Ok(root()),
        Some(RouteKind::Echo) => echo(request, options),
        Some(RouteKind::UserAgent) => user_agent(request, options),
        Some(RouteKind::FileRead) => read_file(request, store).await,
        Some(RouteKind::FileWrite) => write_file(request, store).await,
        None => Ok(Response::not_found()),
    }
}

pub fn root() -> Response {
    Response::new(StatusCode::Ok)
}

/// Reflect the path segment after `/echo/`.
pub fn echo(request: &Request, options: HandlerOptions) -> Result<Response, HandlerError> {
    let payload = extract_between("echo/", " HTTP", request.request_line()).unwrap_or_default();
    text(request, payload, options)
}

/// Reflect the `User-Agent` header.
pub fn user_agent(request: &Request, options: HandlerOptions) -> Result<Response, HandlerError> {
    let agent = request.header("user-agent").unwrap_or_default();
    text(request, agent, options)
}

fn text(request: &Request, body: &str, options: HandlerOptions) -> Result<Response, HandlerError> {
    let response = Response::new(StatusCode::Ok).with_header("Content-Type", TEXT_PLAIN);
    encode_body(request, response, body.as_bytes(), options.gzip).map_err(HandlerError::Compression)
}

fn file_name(request: &Request) -> Option<&str> {
    extract_between("files/", " HTTP", request.request_line())
}

pub async fn read_file<S: BlobStore>(request: &Request, store: &S) -> Result<Response, HandlerError> {
    let Some(name) = file_name(request) else {
        return Ok(Response::not_found());
    };

    match store.read(name).await {
        Ok(Some(bytes)) => Ok(Response::new(StatusCode::Ok)
            .with_header("Content-Type", OCTET_STREAM)
            .with_body(bytes)),
        Ok(None) => Ok(Response::not_found()),
        Err(err @ (StorageError::Disabled | StorageError::InvalidName(_))) => {
            tracing::debug!(name = %name, error = %err, "File read refused");
            Ok(Response::not_found())
        }
        Err(err) => Err(err.into()),
    }
}

/// Store the request body under the name after `/files/`.
pub async fn write_file<S: BlobStore>(request: &Request, store: &S) -> Result<Response, HandlerError> {
    let Some(name) = file_name(request) else {
        return Ok(Response::new(StatusCode::BadRequest));
    };

    match store.write(name, request.body()).await {
        Ok(()) => Ok(Response::new(StatusCode::Created)),
        Err(StorageError::InvalidName(name)) => {
            tracing::debug!(name = %name, "File write refused");
            Ok(Response::new(StatusCode::BadRequest))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Router;
    use crate::storage::{FsStore, MemoryStore};

    async fn respond(raw: &[u8], store: &impl BlobStore) -> Result<Response, HandlerError> {
        let route = Router::default().match_request(raw);
        let request = Request::parse(raw).unwrap();
        dispatch(route, &request, store, HandlerOptions::default()).await
    }

    #[tokio::test]
    async fn root_probe() {
        let res = respond(b"GET / HTTP/1.1\r\n\r\n", &MemoryStore::new()).await.unwrap();
        assert_eq!(res.to_bytes(), b"HTTP/1.1 200 OK\r\n\r\n");
    }

    #[tokio::test]
    async fn echo_reflects_payload() {
        let res = respond(b"GET /echo/abc HTTP/1.1\r\n\r\n", &MemoryStore::new()).await.unwrap();
        assert_eq!(
            res.to_bytes(),
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\nabc"
        );
    }

    #[tokio::test]
    async fn echo_with_gzip_advertises_encoding() {
        let res = respond(
            b"GET /echo/abc HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n",
            &MemoryStore::new(),
        )
        .await
        .unwrap();
        assert_eq!(res.header("Content-Encoding"), Some("gzip"));
        assert_ne!(res.body(), b"abc");
    }

    #[tokio::test]
    async fn user_agent_reflects_header() {
        let res = respond(
            b"GET /user-agent HTTP/1.1\r\nHost: localhost\r\nUser-Agent: test-agent\r\n\r\n",
            &MemoryStore::new(),
        )
        .await
        .unwrap();
        assert_eq!(res.body(), b"test-agent");
        assert_eq!(res.header("Content-Type"), Some("text/plain"));
        assert_eq!(res.header("Content-Length"), Some("10"));
    }

    #[tokio::test]
    async fn user_agent_missing_header_is_empty() {
        let res = respond(b"GET /user-agent HTTP/1.1\r\n\r\n", &MemoryStore::new()).await.unwrap();
        assert_eq!(res.status(), StatusCode::Ok);
        assert!(res.body().is_empty());
        assert!(res.header("Content-Length").is_none());
    }

    #[tokio::test]
    async fn file_round_trip() {
        let store = MemoryStore::new();
        let created = respond(
            b"POST /files/note HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello",
            &store,
        )
        .await
        .unwrap();
        assert_eq!(created.to_bytes(), b"HTTP/1.1 201 Created\r\n\r\n");

        let read = respond(b"GET /files/note HTTP/1.1\r\n\r\n", &store).await.unwrap();
        assert_eq!(
            read.to_bytes(),
            b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: 5\r\n\r\nhello"
        );
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let res = respond(b"GET /files/none HTTP/1.1\r\n\r\n", &MemoryStore::new()).await.unwrap();
        assert_eq!(res.to_bytes(), b"HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let res = respond(b"GET /nowhere HTTP/1.1\r\n\r\n", &MemoryStore::new()).await.unwrap();
        assert_eq!(res.to_bytes(), b"HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[tokio::test]
    async fn path_escape_is_rejected() {
        let store = MemoryStore::new();
        let res = respond(b"POST /files/../x HTTP/1.1\r\n\r\nbody", &store).await.unwrap();
        assert_eq!(res.status(), StatusCode::BadRequest);
        assert!(store.is_empty());

        let res = respond(b"GET /files/../x HTTP/1.1\r\n\r\n", &store).await.unwrap();
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn write_without_directory_is_an_error() {
        let store = FsStore::default();
        let err = respond(b"POST /files/a HTTP/1.1\r\n\r\nbody", &store).await.unwrap_err();
        assert!(matches!(err, HandlerError::Storage(StorageError::Disabled)));

        let res = respond(b"GET /files/a HTTP/1.1\r\n\r\n", &store).await.unwrap();
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn repeated_get_is_byte_identical() {
        let store = MemoryStore::new();
        store.write("same", b"\x00\x01binary").await.unwrap();

        let first = respond(b"GET /files/same HTTP/1.1\r\n\r\n", &store).await.unwrap();
        let second = respond(b"GET /files/same HTTP/1.1\r\n\r\n", &store).await.unwrap();
        assert_eq!(first.to_bytes(), second.to_bytes());
    }
}
