//! Request reading and tokenization.
//!
//! # Responsibilities
//! - Read one request from a connection with an explicit received length
//! - Enforce the request size bound before buffering more bytes
//! - Split the head into request line and headers, and cut the body
//!
//! # Design Decisions
//! - Destructive reads; the buffer only ever holds bytes actually received
//! - Header lookup is case-insensitive, first occurrence wins
//! - A body without `Content-Length` is whatever followed the blank line

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Separates the head from the body.
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

const READ_CHUNK: usize = 1024;

/// A request that cannot be answered normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid Content-Length header `{0}`")]
    InvalidContentLength(String),

    #[error("request exceeds {0} bytes")]
    TooLarge(usize),
}

/// Failure while receiving a request.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Read one request, returning exactly the bytes received.
///
/// Stops once the head and any declared body are complete, or when the peer
/// closes its write half. Without `Content-Length` the bytes that arrived
/// alongside the head are kept as the body. An empty result means the peer
/// sent nothing.
pub async fn read_request<R>(reader: &mut R, limit: usize) -> Result<Vec<u8>, ReadError>
where
    R: AsyncRead + Unpin,
{
    let mut received = Vec::with_capacity(READ_CHUNK.min(limit));
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        received.extend_from_slice(&chunk[..n]);

        match find_head_end(&received) {
            Some(head_end) => {
                let head = String::from_utf8_lossy(&received[..head_end]);
                let (_, headers) = split_head(&head);
                let declared = content_length(&headers)?;
                let wanted = head_end.saturating_add(declared.unwrap_or(0));
                if wanted > limit {
                    return Err(ParseError::TooLarge(limit).into());
                }
                if received.len() >= wanted {
                    if declared.is_some() {
                        received.truncate(wanted);
                    }
                    break;
                }
            }
            None if received.len() > limit => {
                return Err(ParseError::TooLarge(limit).into());
            }
            None => {}
        }
    }

    Ok(received)
}

/// Offset just past the `\r\n\r\n` terminator, if the head is complete.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
        .map(|pos| pos + HEAD_TERMINATOR.len())
}

/// A tokenized request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    request_line: String,
    method: String,
    target: String,
    version: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    /// Tokenize received bytes.
    ///
    /// Missing request-line parts become empty strings so that routing can
    /// still fall through to `404 Not Found`.
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        let (head_bytes, rest) = match find_head_end(buf) {
            Some(end) => (&buf[..end - HEAD_TERMINATOR.len()], &buf[end..]),
            None => (buf, &[][..]),
        };

        let head = String::from_utf8_lossy(head_bytes);
        let (request_line, headers) = split_head(&head);

        let mut parts = request_line.split(' ').filter(|p| !p.is_empty());
        let method = parts.next().unwrap_or_default().to_string();
        let target = parts.next().unwrap_or_default().to_string();
        let version = parts.next().unwrap_or_default().to_string();

        let body = match content_length(&headers)? {
            Some(len) => &rest[..len.min(rest.len())],
            None => rest,
        };

        Ok(Self {
            request_line: request_line.to_string(),
            method,
            target,
            version,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_vec(),
        })
    }

    /// The first line, without its terminator.
    pub fn request_line(&self) -> &str {
        &self.request_line
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Headers in the order they were received.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether `Accept-Encoding` lists `encoding` among its tokens.
    pub fn accepts_encoding(&self, encoding: &str) -> bool {
        self.header("accept-encoding")
            .map(|value| {
                value
                    .split(',')
                    .map(|token| token.split(';').next().unwrap_or_default().trim())
                    .any(|token| token.eq_ignore_ascii_case(encoding))
            })
            .unwrap_or(false)
    }
}

/// Split a head into its request line and `name: value` pairs.
/// Lines without a colon are skipped.
fn split_head(head: &str) -> (&str, Vec<(&str, &str)>) {
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim(), value.trim()))
        .collect();
    (request_line, headers)
}

fn content_length(headers: &[(&str, &str)]) -> Result<Option<usize>, ParseError> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .map(|(_, v)| {
            v.parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength((*v).to_string()))
        })
        .transpose()
}
