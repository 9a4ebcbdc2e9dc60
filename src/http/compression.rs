//! Gzip response encoding.

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::http::request::Request;
use crate::http::response::Response;

pub const GZIP: &str = "gzip";

/// Gzip `bytes` with the default compression level.
pub fn gzip(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2 + 32), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Set `body` on `response`, gzipped when enabled and accepted by the client.
pub fn encode_body(
    request: &Request,
    response: Response,
    body: &[u8],
    enabled: bool,
) -> io::Result<Response> {
    if enabled && request.accepts_encoding(GZIP) {
        let compressed = gzip(body)?;
        Ok(response
            .with_header("Content-Encoding", GZIP)
            .with_body(compressed))
    } else {
        Ok(response.with_body(body))
    }
}
