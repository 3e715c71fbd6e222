//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::BinaryMediaTypes;

/// Root configuration for the adapter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdapterConfig {
    /// How invocations reach the HTTP server.
    pub mode: Mode,

    /// Response content types returned base64 encoded.
    pub binary_media_types: Vec<String>,

    /// Direct-dispatch settings.
    pub direct: DirectConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl AdapterConfig {
    pub fn binary_media_types(&self) -> BinaryMediaTypes {
        BinaryMediaTypes::new(self.binary_media_types.iter().cloned())
    }
}

/// Operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Raw HTTP/1.1 over a synthetic in-process socket.
    #[default]
    Loopback,
    /// Real outbound HTTP call to a local listener.
    Direct,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loopback" => Ok(Mode::Loopback),
            "direct" => Ok(Mode::Direct),
            other => Err(format!("unknown mode {:?} (expected loopback or direct)", other)),
        }
    }
}

/// Direct-dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectConfig {
    /// Local address the HTTP server listens on (e.g., "127.0.0.1:8080").
    pub target_address: String,

    /// Client-side request timeout in seconds, 0 disables it.
    pub request_timeout_secs: u64,
}

impl DirectConfig {
    pub fn target(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.target_address.parse()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self {
            target_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
