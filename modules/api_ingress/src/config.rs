use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ApiIngressConfig {
    /// `host:port`; port 0 picks a free port.
    pub bind_addr: String,
    /// Serve `/openapi.json` and `/docs`.
    pub enable_docs: bool,
    pub cors_enabled: bool,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
    /// How long `stop` waits for in-flight requests to drain.
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_string(),
            enable_docs: false,
            cors_enabled: false,
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 16 * 1024 * 1024,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}
