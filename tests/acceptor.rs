//! Acceptor scheduling, capacity and shutdown.

use std::time::Duration;

use minihttpd::config::{AcceptMode, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

use common::{send_raw, start_server};

fn config(mode: AcceptMode, capacity: Option<usize>) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.mode = mode;
    config.listener.capacity = capacity;
    config
}

async fn read_with_timeout(stream: &mut TcpStream, wait: Duration) -> Option<Vec<u8>> {
    let mut response = Vec::new();
    match tokio::time::timeout(wait, stream.read_to_end(&mut response)).await {
        Ok(result) => {
            result.unwrap();
            Some(response)
        }
        Err(_) => None,
    }
}

#[tokio::test]
async fn sequential_capacity_serves_then_returns() {
    let server = start_server(config(AcceptMode::Sequential, Some(3))).await;

    for _ in 0..3 {
        let response = send_raw(server.addr, b"GET / HTTP/1.1\r\n\r\n").await;
        assert_eq!(response, b"HTTP/1.1 200 OK\r\n\r\n");
    }

    let served = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(served, 3);
}

#[tokio::test]
async fn sequential_mode_serves_in_arrival_order() {
    let server = start_server(config(AcceptMode::Sequential, None)).await;

    // The first connection is accepted but stays silent.
    let mut first = TcpStream::connect(server.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut second = TcpStream::connect(server.addr).await.unwrap();
    second.write_all(b"GET /echo/second HTTP/1.1\r\n\r\n").await.unwrap();

    assert!(read_with_timeout(&mut second, Duration::from_millis(200)).await.is_none());

    first.write_all(b"GET /echo/first HTTP/1.1\r\n\r\n").await.unwrap();
    let first_response = read_with_timeout(&mut first, Duration::from_secs(5)).await.unwrap();
    assert!(first_response.ends_with(b"first"));

    let second_response = read_with_timeout(&mut second, Duration::from_secs(5)).await.unwrap();
    assert!(second_response.ends_with(b"second"));

    server.stop().await;
}

#[tokio::test]
async fn concurrent_mode_does_not_wait_for_idle_peer() {
    let server = start_server(config(AcceptMode::Concurrent, None)).await;

    let mut idle = TcpStream::connect(server.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = send_raw(server.addr, b"GET /echo/fast HTTP/1.1\r\n\r\n").await;
    assert!(response.ends_with(b"fast"));

    idle.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    let late = read_with_timeout(&mut idle, Duration::from_secs(5)).await.unwrap();
    assert_eq!(late, b"HTTP/1.1 200 OK\r\n\r\n");

    assert_eq!(server.stop().await, 2);
}

#[tokio::test]
async fn concurrent_capacity_drains_in_flight_sessions() {
    let mut server = start_server(config(AcceptMode::Concurrent, Some(2))).await;

    // Accepted first, answered last.
    let mut slow = TcpStream::connect(server.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = send_raw(server.addr, b"GET /echo/quick HTTP/1.1\r\n\r\n").await;
    assert!(response.ends_with(b"quick"));

    // Capacity is reached but the slow session is still open.
    assert!(tokio::time::timeout(Duration::from_millis(200), &mut server.handle)
        .await
        .is_err());

    slow.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    let late = read_with_timeout(&mut slow, Duration::from_secs(5)).await.unwrap();
    assert_eq!(late, b"HTTP/1.1 200 OK\r\n\r\n");

    let served = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(served, 2);
}

#[tokio::test]
async fn concurrent_writes_to_distinct_files() {
    let server = start_server(config(AcceptMode::Concurrent, None)).await;
    let addr = server.addr;

    let mut tasks = Vec::new();
    for i in 0..10 {
        tasks.push(tokio::spawn(async move {
            let body = format!("content-{i}");
            let request = format!(
                "POST /files/f{i} HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
            send_raw(addr, request.as_bytes()).await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), b"HTTP/1.1 201 Created\r\n\r\n");
    }

    for i in 0..10 {
        let stored = std::fs::read_to_string(server.dir.path().join(format!("f{i}"))).unwrap();
        assert_eq!(stored, format!("content-{i}"));
    }
    server.stop().await;
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let server = start_server(ServerConfig::default()).await;
    let addr = server.addr;

    send_raw(addr, b"GET / HTTP/1.1\r\n\r\n").await;
    assert_eq!(server.stop().await, 1);

    // The listener is gone once run() has returned.
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn exactly_one_response_per_connection() {
    let server = start_server(ServerConfig::default()).await;

    // Two requests on one connection: only the first is answered.
    let response = send_raw(
        server.addr,
        b"GET /echo/one HTTP/1.1\r\n\r\nGET /echo/two HTTP/1.1\r\n\r\n",
    )
    .await;
    assert_eq!(
        response,
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\none"
    );
    server.stop().await;
}
