//! Direct-dispatch mode: the request is sent over a real socket to a local server.
//!
//! Failures never fail the invocation. They are logged, recorded on the
//! [`Dispatch`] result, and the client sees a bare 500.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::uri::{Authority, Scheme};
use axum::http::{Request, Uri};
use serde_json::Value;

use crate::adapter::error::{AdapterError, AdapterResult};
use crate::adapter::Invoke;
use crate::event::{ProxyEvent, ProxyResponse};
use crate::http::request::{annotate, decode_request};
use crate::http::{encode_response, BinaryMediaTypes};

/// Outcome of a direct dispatch.
#[derive(Debug)]
pub struct Dispatch {
    /// What the platform receives.
    pub response: ProxyResponse,
    /// The failure absorbed into `response`, if any.
    pub diagnostic: Option<AdapterError>,
}

/// Forwards each invocation to a server listening on a local address.
#[derive(Debug, Clone)]
pub struct DirectAdapter {
    client: reqwest::Client,
    authority: Authority,
    binary: BinaryMediaTypes,
}

impl DirectAdapter {
    /// Create an adapter targeting `target`.
    ///
    /// Redirects are never followed, so 3xx responses reach the client as-is.
    pub fn new(
        target: SocketAddr,
        binary: BinaryMediaTypes,
        timeout: Option<Duration>,
    ) -> AdapterResult<Self> {
        let authority = target
            .to_string()
            .parse::<Authority>()
            .map_err(|e| AdapterError::InvalidRequest(format!("target {}: {}", target, e)))?;

        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            authority,
            binary,
        })
    }

    /// Forward one invocation, absorbing any failure into a 500 response.
    pub async fn dispatch(&self, raw: &[u8], context: &Value) -> Dispatch {
        match self.forward(raw, context).await {
            Ok(response) => Dispatch {
                response,
                diagnostic: None,
            },
            Err(e) => {
                tracing::error!(
                    error = %e,
                    kind = e.kind(),
                    target = %self.authority,
                    "Direct dispatch failed, answering 500"
                );
                Dispatch {
                    response: ProxyResponse::default(),
                    diagnostic: Some(e),
                }
            }
        }
    }

    async fn forward(&self, raw: &[u8], context: &Value) -> AdapterResult<ProxyResponse> {
        let mut event: ProxyEvent = serde_json::from_slice(raw)?;

        let mut request = decode_request(&event)?;
        annotate(&mut request, &mut event, context)?;

        // URI rewrite
        let (mut parts, body) = request.into_parts();
        let mut uri_parts = parts.uri.into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.authority.clone());
        parts.uri = Uri::from_parts(uri_parts)
            .map_err(|e| AdapterError::InvalidRequest(format!("request uri: {}", e)))?;

        let request = reqwest::Request::try_from(Request::from_parts(parts, body))
            .map_err(|e| AdapterError::InvalidRequest(e.to_string()))?;

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Forwarding invocation to local server"
        );

        let response = self.client.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(encode_response(status, headers, body, &self.binary))
    }
}

impl Invoke for DirectAdapter {
    async fn invoke(&self, event: &[u8], context: &Value) -> AdapterResult<ProxyResponse> {
        Ok(self.dispatch(event, context).await.response)
    }
}
