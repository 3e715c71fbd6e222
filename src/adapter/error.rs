//! Invocation error taxonomy.

use thiserror::Error;

use crate::net::listener::ListenerError;

/// Errors raised while translating or forwarding a single invocation.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The event payload is not a valid proxy event.
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    /// The event path does not parse as a URL.
    #[error("malformed path {path:?}: {source}")]
    MalformedPath {
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// The event body is flagged base64 but does not decode.
    #[error("malformed body: {0}")]
    MalformedBody(#[from] base64::DecodeError),

    /// Method, header name or header value rejected while building the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The outbound call to the local server failed.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[from] reqwest::Error),

    /// No server is accepting on the synthetic listener any more.
    #[error("listener closed: {0}")]
    ListenerClosed(#[from] ListenerError),

    /// The bytes written back by the server are not an HTTP response.
    #[error("malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),
}

impl AdapterError {
    /// Stable name reported as `errorType` to the harness.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::MalformedEvent(_) => "MalformedEvent",
            AdapterError::MalformedPath { .. } => "MalformedPath",
            AdapterError::MalformedBody(_) => "MalformedBody",
            AdapterError::InvalidRequest(_) => "InvalidRequest",
            AdapterError::UpstreamUnreachable(_) => "UpstreamUnreachable",
            AdapterError::ListenerClosed(_) => "ListenerClosed",
            AdapterError::MalformedUpstreamResponse(_) => "MalformedUpstreamResponse",
        }
    }
}

impl From<axum::http::Error> for AdapterError {
    fn from(e: axum::http::Error) -> Self {
        AdapterError::InvalidRequest(e.to_string())
    }
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
