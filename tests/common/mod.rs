//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use lambda_net::adapter::LoopbackAdapter;
use lambda_net::http::{BinaryMediaTypes, HttpServer};
use lambda_net::lifecycle::Shutdown;
use lambda_net::net;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::TcpListener;

pub const PNG: &[u8] = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR\x00\x00\x00\x01\x00\x00\x00\x01";

/// A proxy event with the fields API Gateway always sends.
pub fn proxy_event(method: &str, path: &str) -> Value {
    json!({
        "resource": "/{proxy+}",
        "path": path,
        "httpMethod": method,
        "headers": {"Host": "api.example.com"},
        "queryStringParameters": null,
        "pathParameters": null,
        "stageVariables": {"env": "test"},
        "requestContext": {
            "stage": "test",
            "requestId": "req-1",
            "identity": {"sourceIp": "203.0.113.5"}
        },
        "body": null,
        "isBase64Encoded": false
    })
}

pub fn to_bytes(event: &Value) -> Vec<u8> {
    serde_json::to_vec(event).unwrap()
}

pub fn context() -> Value {
    json!({"awsRequestId": "ctx-1", "functionName": "test"})
}

/// Serve `app` on a fresh synthetic listener and return an adapter wired to it.
pub fn start_loopback(app: Router, binary: BinaryMediaTypes) -> (LoopbackAdapter, Shutdown) {
    let (listener, handle) = net::bind();
    let shutdown = Shutdown::new();
    tokio::spawn(HttpServer::new(app).run_synthetic(listener, shutdown.wait()));
    (LoopbackAdapter::new(handle, binary), shutdown)
}

/// Serve `app` on an ephemeral local port.
pub async fn start_tcp(app: Router) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    tokio::spawn(HttpServer::new(app).run_tcp(listener, shutdown.wait()));
    (addr, shutdown)
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start a raw backend that answers every connection with `response` verbatim.
pub async fn start_raw_backend(response: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let _ = socket.write_all(response).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Consume a bodiless request up to the end of its headers.
async fn read_request_head(socket: &mut TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}
