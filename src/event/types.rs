//! Proxy event wire types.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Placeholder written over the event body once it has been consumed.
pub const TRUNCATED_BODY: &str = "... truncated";

/// A proxy integration event as delivered by API Gateway.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    #[serde(default)]
    pub resource: Option<Value>,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub http_method: String,

    /// Request headers, one value per name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,

    #[serde(default)]
    pub path_parameters: Option<Value>,

    #[serde(default)]
    pub stage_variables: Option<Value>,

    #[serde(default)]
    pub request_context: RequestContext,

    /// Request payload, base64 encoded when `is_base64_encoded` is set.
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,

    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ProxyEvent {
    /// Address of the original caller, or `0.0.0.0:0` when the event does not carry one.
    pub fn remote_addr(&self) -> SocketAddr {
        let ip = self
            .request_context
            .source_ip()
            .and_then(|ip| ip.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, 0)
    }

    /// Replace the body so the event can be re-serialized cheaply.
    pub fn truncate_body(&mut self) {
        self.body = TRUNCATED_BODY.to_string();
    }
}

/// The `requestContext` object. Only `identity.sourceIp` is interpreted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RequestContext {
    #[serde(default)]
    pub identity: Identity,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestContext {
    pub fn source_ip(&self) -> Option<&str> {
        self.identity
            .source_ip
            .as_deref()
            .filter(|ip| !ip.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The result returned to API Gateway for a proxy integration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl Default for ProxyResponse {
    fn default() -> Self {
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            headers: HashMap::new(),
            body: String::new(),
            is_base64_encoded: false,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
