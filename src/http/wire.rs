//! Raw HTTP/1.1 framing for the loopback transport.
//!
//! # Responsibilities
//! - Serialize a decoded request into the bytes a socket would carry
//! - Parse the bytes written back by the server as an HTTP response
//!
//! # Design Decisions
//! - Requests always carry `Content-Length` and `Connection: close`, so a
//!   keep-alive server still finishes the connection after one response
//! - Responses are parsed by a hyper client connection replaying the captured
//!   bytes, which covers length-delimited, chunked and close-delimited bodies

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use axum::http::header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::http::{Method, Request, Response};
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::adapter::error::{AdapterError, AdapterResult};

/// Serialize `request` as an HTTP/1.1 message.
///
/// `default_host` is used when the request carries no `Host` header.
pub fn write_request(request: &Request<Bytes>, default_host: &str) -> Bytes {
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let body = request.body();

    let mut buf = Vec::with_capacity(256 + body.len());
    buf.extend_from_slice(format!("{} {} HTTP/1.1\r\n", request.method(), target).as_bytes());

    if !request.headers().contains_key(HOST) {
        buf.extend_from_slice(format!("host: {}\r\n", default_host).as_bytes());
    }
    for (name, value) in request.headers() {
        if name == CONTENT_LENGTH || name == CONNECTION || name == TRANSFER_ENCODING {
            continue;
        }
        buf.extend_from_slice(name.as_str().as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf.extend_from_slice(
        format!("content-length: {}\r\nconnection: close\r\n\r\n", body.len()).as_bytes(),
    );
    buf.extend_from_slice(body);

    Bytes::from(buf)
}

/// Parse a complete HTTP/1.x response, as answered to a request with `method`.
pub async fn read_response(method: &Method, raw: Bytes) -> AdapterResult<Response<Bytes>> {
    let malformed = |e: hyper::Error| AdapterError::MalformedUpstreamResponse(e.to_string());

    let io = TokioIo::new(Replay::new(raw));
    let (mut sender, conn) = hyper::client::conn::http1::handshake::<_, Empty<Bytes>>(io)
        .await
        .map_err(malformed)?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::trace!(error = %e, "Replay connection ended with error");
        }
    });

    let request = Request::builder()
        .method(method.clone())
        .uri("/")
        .body(Empty::<Bytes>::new())?;

    let response = sender.send_request(request).await.map_err(malformed)?;
    let (parts, body) = response.into_parts();
    let body = body.collect().await.map_err(malformed)?.to_bytes();

    Ok(Response::from_parts(parts, body))
}

/// Replays captured response bytes once the request has been written.
///
/// Reads stay pending until the first write, so the client never sees the
/// response before it has sent its request.
struct Replay {
    response: Bytes,
    requested: bool,
    read_waker: Option<Waker>,
}

impl Replay {
    fn new(response: Bytes) -> Self {
        Self {
            response,
            requested: false,
            read_waker: None,
        }
    }
}

impl AsyncRead for Replay {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if !self.requested {
            self.read_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
        let n = buf.remaining().min(self.response.len());
        let chunk = self.response.split_to(n);
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for Replay {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.requested = true;
        if let Some(waker) = self.read_waker.take() {
            waker.wake();
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_write_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/items?x=2")
            .header("x-forwarded-for", "203.0.113.5")
            .header("content-length", "999")
            .body(Bytes::from_static(b"hello"))
            .unwrap();

        let raw = write_request(&request, "0.0.0.0");
        assert_eq!(
            raw,
            Bytes::from_static(
                b"POST /items?x=2 HTTP/1.1\r\n\
                  host: 0.0.0.0\r\n\
                  x-forwarded-for: 203.0.113.5\r\n\
                  content-length: 5\r\n\
                  connection: close\r\n\r\n\
                  hello"
            )
        );
    }

    #[test]
    fn test_write_request_keeps_host() {
        let request = Request::builder()
            .uri("/")
            .header("host", "api.example.com")
            .body(Bytes::new())
            .unwrap();

        let raw = write_request(&request, "0.0.0.0");
        let text = std::str::from_utf8(&raw).unwrap();
        assert!(text.starts_with("GET / HTTP/1.1\r\nhost: api.example.com\r\n"));
        assert_eq!(text.matches("host:").count(), 1);
    }

    #[tokio::test]
    async fn test_read_length_delimited() {
        let raw = Bytes::from_static(
            b"HTTP/1.1 201 Created\r\ncontent-type: text/plain\r\ncontent-length: 5\r\n\r\nhello",
        );
        let res = read_response(&Method::POST, raw).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()["content-type"], "text/plain");
        assert_eq!(&res.body()[..], b"hello");
    }

    #[tokio::test]
    async fn test_read_chunked() {
        let raw = Bytes::from_static(
            b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
        );
        let res = read_response(&Method::GET, raw).await.unwrap();
        assert_eq!(&res.body()[..], b"hello world");
    }

    #[tokio::test]
    async fn test_read_close_delimited() {
        let raw = Bytes::from_static(b"HTTP/1.1 200 OK\r\nconnection: close\r\n\r\nuntil eof");
        let res = read_response(&Method::GET, raw).await.unwrap();
        assert_eq!(&res.body()[..], b"until eof");
    }

    #[tokio::test]
    async fn test_read_head_has_no_body() {
        let raw = Bytes::from_static(b"HTTP/1.1 200 OK\r\ncontent-length: 42\r\n\r\n");
        let res = read_response(&Method::HEAD, raw).await.unwrap();
        assert_eq!(res.headers()["content-length"], "42");
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn test_read_garbage() {
        let err = read_response(&Method::GET, Bytes::from_static(b"not http at all\r\n\r\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::MalformedUpstreamResponse(_)));

        let err = read_response(&Method::GET, Bytes::new()).await.unwrap_err();
        assert!(matches!(err, AdapterError::MalformedUpstreamResponse(_)));
    }
}
