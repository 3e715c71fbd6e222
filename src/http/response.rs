//! Response encoding: standard HTTP response → proxy response.
//!
//! # Responsibilities
//! - Sniff a content type when the response does not declare one
//! - Base64 encode bodies whose content type is configured as binary
//! - Flatten headers into a single value per name
//!
//! # Design Decisions
//! - Last value wins when a header repeats
//! - Hop-by-hop headers are dropped, the body is already de-chunked
//! - Header names are rendered in canonical `Title-Case`

use std::collections::HashMap;

use axum::http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::event::ProxyResponse;
use crate::http::media::BinaryMediaTypes;
use crate::http::sniff::detect_content_type;

const HOP_BY_HOP: &[&str] = &["connection", "keep-alive", "transfer-encoding"];

/// Encode a complete response into the proxy response shape.
pub fn encode_response(
    status: StatusCode,
    mut headers: HeaderMap,
    body: Bytes,
    binary: &BinaryMediaTypes,
) -> ProxyResponse {
    let content_type = match headers.get(CONTENT_TYPE) {
        Some(ct) if !ct.is_empty() => String::from_utf8_lossy(ct.as_bytes()).into_owned(),
        _ => {
            let sniffed = detect_content_type(&body);
            tracing::trace!(content_type = sniffed, "Sniffed response content type");
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(sniffed));
            sniffed.to_string()
        }
    };

    let is_base64_encoded = binary.contains(&content_type);
    let body = if is_base64_encoded {
        STANDARD.encode(&body)
    } else {
        String::from_utf8_lossy(&body).into_owned()
    };

    ProxyResponse {
        status_code: status.as_u16(),
        headers: flatten_headers(&headers),
        body,
        is_base64_encoded,
    }
}

/// Collapse a header map to one value per name, keeping the last one.
pub fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flat = HashMap::with_capacity(headers.keys_len());
    for name in headers.keys() {
        if HOP_BY_HOP.contains(&name.as_str()) {
            continue;
        }
        if let Some(value) = headers.get_all(name).iter().last() {
            flat.insert(
                canonical_name(name.as_str()),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
    }
    flat
}

/// `x-forwarded-for` → `X-Forwarded-For`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{CONNECTION, SET_COOKIE, TRANSFER_ENCODING};

    const PNG: &[u8] = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR\x00\x00\x00\x01";

    #[test]
    fn test_sniffed_png_is_binary() {
        let binary = BinaryMediaTypes::new(["image/png"]);
        let res =
            encode_response(StatusCode::OK, HeaderMap::new(), Bytes::from_static(PNG), &binary);

        assert_eq!(res.header("Content-Type"), Some("image/png"));
        assert!(res.is_base64_encoded);
        assert_eq!(STANDARD.decode(&res.body).unwrap(), PNG);
    }

    #[test]
    fn test_sniffed_png_without_policy_is_text() {
        let res = encode_response(
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from_static(PNG),
            &BinaryMediaTypes::default(),
        );
        assert_eq!(res.header("content-type"), Some("image/png"));
        assert!(!res.is_base64_encoded);
    }

    #[test]
    fn test_declared_content_type_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let binary = BinaryMediaTypes::new(["image/png"]);

        let res = encode_response(StatusCode::CREATED, headers, Bytes::from_static(PNG), &binary);
        assert_eq!(res.status_code, 201);
        assert_eq!(res.header("Content-Type"), Some("application/json"));
        assert!(!res.is_base64_encoded);
    }

    #[test]
    fn test_set_cookie_last_wins() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let res = encode_response(
            StatusCode::OK,
            headers,
            Bytes::from_static(b"ok"),
            &BinaryMediaTypes::default(),
        );
        assert_eq!(res.headers.get("Set-Cookie").map(String::as_str), Some("b=2"));
        assert_eq!(res.headers.len(), 2);
        assert_eq!(res.body, "ok");
    }

    #[test]
    fn test_hop_by_hop_headers_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        headers.insert("x-request-id", HeaderValue::from_static("r-1"));

        let flat = flatten_headers(&headers);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["X-Request-Id"], "r-1");
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("x-amz-apigw-id"), "X-Amz-Apigw-Id");
        assert_eq!(canonical_name("etag"), "Etag");
    }
}
