//! Connection settings for an HAI panel's REST API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where and how to reach the panel's REST API.
///
/// Every adapter receives its URLs from the [`HaiClient`](crate::HaiClient)
/// built from one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaiConfig {
    /// Host name or `host:port` of the API server.
    pub host: String,

    /// URL scheme.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl HaiConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            scheme: default_scheme(),
            timeout_secs: default_timeout(),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `{scheme}://{host}/api`
    pub fn api_url(&self) -> String {
        format!("{}://{}/api", self.scheme, self.host.trim_end_matches('/'))
    }

    /// URL of a light (lights and switches share the endpoint).
    pub fn light_url(&self, id: &str) -> String {
        format!("{}/light/{}", self.api_url(), id)
    }

    /// URL of a security zone.
    pub fn zone_url(&self, id: &str) -> String {
        format!("{}/zone/{}", self.api_url(), id)
    }
}
