//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use minihttpd::config::ServerConfig;
use minihttpd::http::{HttpServer, ServerError};
use minihttpd::lifecycle::Shutdown;
use minihttpd::net::Listener;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// A server running on an ephemeral port with its own storage directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<usize, ServerError>>,
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the acceptor to return.
    pub async fn stop(self) -> usize {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap()
    }
}

/// Start a server with `config`, overriding its bind address and directory.
pub async fn start_server(mut config: ServerConfig) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.storage.directory = Some(dir.path().to_path_buf());

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let server = HttpServer::new(config);
    let handle = tokio::spawn(async move { server.run(listener, signal).await });

    TestServer {
        addr,
        shutdown,
        handle,
        dir,
    }
}

/// Send raw bytes on a fresh connection and read until the server closes.
#[allow(dead_code)]
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("response timed out")
        .unwrap();
    response
}

/// Split a raw response into head text and body bytes.
#[allow(dead_code)]
pub fn split_response(response: &[u8]) -> (String, Vec<u8>) {
    let pos = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator");
    (
        String::from_utf8_lossy(&response[..pos]).into_owned(),
        response[pos + 4..].to_vec(),
    )
}
