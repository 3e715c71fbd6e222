//! Request decoding: proxy event → standard HTTP request.
//!
//! # Responsibilities
//! - Rebuild the request target from `path` and `queryStringParameters`
//! - Decode base64 bodies
//! - Copy headers, restore `Host` and `X-Forwarded-For`
//! - Attach the event and invocation context as diagnostic headers
//!
//! # Design Decisions
//! - Explicit query parameters replace every embedded value for the same key
//! - Query keys are emitted sorted so the target is deterministic
//! - One value per header name, later duplicates overwrite
//! - `Content-Length` and `Transfer-Encoding` are not copied

use std::collections::{BTreeMap, HashMap};

use axum::http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::http::{Method, Request, Uri};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use url::{form_urlencoded, Url};

use crate::adapter::error::{AdapterError, AdapterResult};
use crate::event::ProxyEvent;

/// Forwarded client address header.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Carries the JSON-encoded event (body truncated).
pub const X_PROXY_EVENT: &str = "x-apigatewayproxy-event";

/// Carries the JSON-encoded invocation context.
pub const X_PROXY_CONTEXT: &str = "x-apigatewayproxy-context";

const PLACEHOLDER_ORIGIN: &str = "http://localhost";

/// Build the HTTP request described by `event`.
///
/// The request URI is in origin form (`/path?query`).
pub fn decode_request(event: &ProxyEvent) -> AdapterResult<Request<Bytes>> {
    let uri = request_target(&event.path, &event.query_string_parameters)?;
    let body = decode_body(event)?;

    let method = Method::from_bytes(event.http_method.as_bytes())
        .map_err(|e| {
            AdapterError::InvalidRequest(format!("method {:?}: {}", event.http_method, e))
        })?;

    let mut request = Request::builder().method(method).uri(uri).body(body)?;

    let headers = request.headers_mut();
    for (k, v) in &event.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .map_err(|e| AdapterError::InvalidRequest(format!("header name {:?}: {}", k, e)))?;
        // Framing follows the decoded body, not the original client's headers.
        if name == CONTENT_LENGTH || name == TRANSFER_ENCODING {
            continue;
        }
        let value = HeaderValue::from_str(v)
            .map_err(|e| AdapterError::InvalidRequest(format!("header {:?}: {}", k, e)))?;
        headers.insert(name, value);
    }

    if !headers.contains_key(X_FORWARDED_FOR) {
        if let Some(ip) = event.request_context.source_ip() {
            let value = HeaderValue::from_str(ip)
                .map_err(|e| AdapterError::InvalidRequest(format!("source ip {:?}: {}", ip, e)))?;
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    Ok(request)
}

/// Host the request is addressed to, taken from the event's own `Host` header.
pub fn request_host<B>(request: &Request<B>) -> Option<&str> {
    request.headers().get(HOST).and_then(|h| h.to_str().ok())
}

/// Attach the event and invocation context as diagnostic headers.
///
/// The event body is truncated first so the payload is not duplicated into a header.
pub fn annotate<B, C>(
    request: &mut Request<B>,
    event: &mut ProxyEvent,
    context: &C,
) -> AdapterResult<()>
where
    C: Serialize + ?Sized,
{
    event.truncate_body();

    let event_json = serde_json::to_string(&*event)?;
    let context_json = serde_json::to_string(context)?;

    let headers = request.headers_mut();
    for (name, json) in [(X_PROXY_EVENT, event_json), (X_PROXY_CONTEXT, context_json)] {
        let value = HeaderValue::from_str(&json)
            .map_err(|e| AdapterError::InvalidRequest(format!("{}: {}", name, e)))?;
        headers.insert(name, value);
    }
    Ok(())
}

fn request_target(path: &str, params: &HashMap<String, String>) -> AdapterResult<Uri> {
    let malformed = |source| AdapterError::MalformedPath {
        path: path.to_string(),
        source,
    };

    let (raw_path, embedded) = if path.starts_with('/') {
        // Parsed only to reject garbage; the path itself is sent as given.
        Url::parse(&format!("{}{}", PLACEHOLDER_ORIGIN, path)).map_err(malformed)?;
        split_target(path)
    } else {
        match Url::parse(path) {
            Ok(url) if url.has_host() => {
                (url.path().to_string(), url.query().map(str::to_string))
            }
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
                split_target(&format!("/{}", path))
            }
            Err(e) => return Err(malformed(e)),
        }
    };

    let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Some(embedded) = &embedded {
        for (k, v) in form_urlencoded::parse(embedded.as_bytes()) {
            query.entry(k.into_owned()).or_default().push(v.into_owned());
        }
    }
    for (k, v) in params {
        query.insert(k.clone(), vec![v.clone()]);
    }

    let mut target = escape_path(&raw_path);
    if !query.is_empty() {
        let mut encoder = form_urlencoded::Serializer::new(String::new());
        for (k, values) in &query {
            for v in values {
                encoder.append_pair(k, v);
            }
        }
        target.push('?');
        target.push_str(&encoder.finish());
    }

    target
        .parse::<Uri>()
        .map_err(|e| AdapterError::InvalidRequest(format!("request target {:?}: {}", target, e)))
}

/// Split `path?query#fragment` into the raw path and query, dropping the fragment.
fn split_target(target: &str) -> (String, Option<String>) {
    let target = target.split_once('#').map_or(target, |(before, _)| before);
    match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    }
}

/// Percent-encode the bytes a request target cannot carry literally.
///
/// Existing escapes are left alone, so an already-encoded path is not encoded twice.
fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for &b in path.as_bytes() {
        let literal = b.is_ascii_graphic()
            && !matches!(b, b'"' | b'<' | b'>' | b'\\' | b'^' | b'`' | b'{' | b'|' | b'}');
        if literal {
            escaped.push(b as char);
        } else {
            escaped.push_str(&format!("%{:02X}", b));
        }
    }
    escaped
}

fn decode_body(event: &ProxyEvent) -> AdapterResult<Bytes> {
    if event.is_base64_encoded {
        Ok(Bytes::from(STANDARD.decode(event.body.as_bytes())?))
    } else {
        Ok(Bytes::from(event.body.clone()))
    }
}
