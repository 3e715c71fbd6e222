//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the application router with the tracing layer
//! - Serve it on a synthetic listener (loopback mode) or a TCP listener
//!   (direct-dispatch mode) through the unmodified `axum::serve` loop
//! - Provide the echo application used by the binary

use std::future::Future;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, Uri},
    response::Json,
    routing::any,
    Router,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::net::SyntheticListener;

/// HTTP server for the application behind the adapter.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around `app`.
    pub fn new(app: Router) -> Self {
        Self {
            router: app.layer(TraceLayer::new_for_http()),
        }
    }

    /// Serve invocations delivered through a synthetic listener.
    pub async fn run_synthetic<F>(
        self,
        listener: SyntheticListener,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("HTTP server starting on synthetic listener");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve on a real socket, for direct dispatch.
    pub async fn run_tcp<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Application that answers every request with a JSON description of it.
pub fn echo_router() -> Router {
    Router::new()
        .route("/{*path}", any(echo_handler))
        .route("/", any(echo_handler))
}

async fn echo_handler(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let headers: Map<String, Value> = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()),
            )
        })
        .collect();

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}
