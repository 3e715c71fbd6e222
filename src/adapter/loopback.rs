//! Wire-loopback mode: the request travels through a synthetic socket.

use serde_json::Value;

use crate::adapter::error::{AdapterError, AdapterResult};
use crate::adapter::Invoke;
use crate::event::{ProxyEvent, ProxyResponse};
use crate::http::request::{annotate, decode_request, request_host};
use crate::http::{encode_response, wire, BinaryMediaTypes};
use crate::net::connection::UNSPECIFIED_ADDR;
use crate::net::listener::ListenerError;
use crate::net::ListenerHandle;

/// Drives each invocation through a synthetic listener served by a local HTTP server.
#[derive(Debug, Clone)]
pub struct LoopbackAdapter {
    listener: ListenerHandle,
    binary: BinaryMediaTypes,
}

impl LoopbackAdapter {
    pub fn new(listener: ListenerHandle, binary: BinaryMediaTypes) -> Self {
        Self { listener, binary }
    }

    async fn handle(&self, raw: &[u8], context: &Value) -> AdapterResult<ProxyResponse> {
        if self.listener.is_closed() {
            return Err(ListenerError::Closed.into());
        }

        let mut event: ProxyEvent = serde_json::from_slice(raw)?;
        let remote_addr = event.remote_addr();

        let mut request = decode_request(&event)?;
        annotate(&mut request, &mut event, context)?;

        let default_host = UNSPECIFIED_ADDR.ip().to_string();
        let host = request_host(&request).unwrap_or(&default_host);
        let bytes = wire::write_request(&request, host);

        tracing::debug!(
            method = %request.method(),
            uri = %request.uri(),
            remote_addr = %remote_addr,
            request_bytes = bytes.len(),
            "Dispatching invocation to synthetic listener"
        );

        let captured = self.listener.dispatch(remote_addr, bytes).await?;
        let response = wire::read_response(request.method(), captured).await?;

        let (parts, body) = response.into_parts();
        let encoded = encode_response(parts.status, parts.headers, body, &self.binary);

        tracing::debug!(
            status = encoded.status_code,
            base64 = encoded.is_base64_encoded,
            "Invocation complete"
        );
        Ok(encoded)
    }
}

impl Invoke for LoopbackAdapter {
    async fn invoke(&self, event: &[u8], context: &Value) -> AdapterResult<ProxyResponse> {
        self.handle(event, context).await.map_err(|e: AdapterError| {
            tracing::error!(error = %e, kind = e.kind(), "Invocation failed");
            e
        })
    }
}
