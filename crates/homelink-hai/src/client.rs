//! HTTP client for the panel's REST API.

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use homelink_core::error::{Error, Result};

use crate::config::HaiConfig;

/// Body of `GET /api/light/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LightReport {
    pub is_on: bool,
    /// Arrives as a number or a zero-padded string (`"001"`).
    #[serde(default)]
    pub brightness_level: Option<Value>,
}

impl LightReport {
    /// `brightness_level` as a number, if it is one.
    pub fn level(&self) -> Option<i64> {
        match self.brightness_level.as_ref()? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Body of `PUT /api/light/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LightCommand {
    pub is_on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness_level: Option<u8>,
}

/// Body of `GET /api/zone/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneReport {
    pub zone_status: String,
}

/// Shared REST client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HaiClient {
    http: Client,
    config: Arc<HaiConfig>,
}

impl HaiClient {
    pub fn new(config: HaiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &HaiConfig {
        &self.config
    }

    pub async fn get_light(&self, id: &str) -> Result<LightReport> {
        self.get_json(&self.config.light_url(id)).await
    }

    /// Send a light command and return the HTTP status. The panel answers
    /// `202 Accepted` when it takes the command.
    pub async fn put_light(&self, id: &str, command: &LightCommand) -> Result<StatusCode> {
        let url = self.config.light_url(id);
        tracing::debug!(url = %url, ?command, "HAI light command");

        let response = self
            .http
            .put(&url)
            .json(command)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Ok(response.status())
    }

    pub async fn get_zone(&self, id: &str) -> Result<ZoneReport> {
        self.get_json(&self.config.zone_url(id)).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::trace!(url = %url, "HAI GET");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "GET {url} returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Protocol(format!("bad response from {url}: {e}")))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Transport(e.to_string())
    }
}
