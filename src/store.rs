use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;

/// Errors from the remote telemetry store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("write to '{variable}' rejected: {message}")]
    Write { variable: String, message: String },
    #[error("read of '{variable}' failed: HTTP error {status}")]
    Read { variable: String, status: u16 },
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Access to named variables on the remote store — allows mocking in tests
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Latest value of a variable, or None if the store holds no samples
    async fn read_latest(&self, variable: &str) -> Result<Option<f64>, StoreError>;

    /// Write a value with a timestamped context; returns the stored record
    async fn write_latest(&self, variable: &str, value: f64) -> Result<Value, StoreError>;
}

#[derive(Debug, Serialize)]
struct WriteRequest {
    value: f64,
    context: WriteContext,
}

#[derive(Debug, Serialize)]
struct WriteContext {
    timestamp: String,
    source: String,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    results: Vec<Sample>,
}

#[derive(Debug, Deserialize)]
struct Sample {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for a Ubidots-style telemetry API (v1.6)
pub struct UbidotsClient {
    client: Client,
    api_url: String,
    device_label: String,
    auth_token: String,
    source_tag: String,
}

impl UbidotsClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .expect("failed to create HTTP client"),
            api_url: config.api_url.clone(),
            device_label: config.device_label.clone(),
            auth_token: config.auth_token.clone(),
            source_tag: config.source_tag.clone(),
        }
    }

    fn values_url(&self, variable: &str) -> String {
        format!(
            "{}/devices/{}/{}/values",
            self.api_url, self.device_label, variable
        )
    }
}

#[async_trait]
impl RemoteStore for UbidotsClient {
    async fn read_latest(&self, variable: &str) -> Result<Option<f64>, StoreError> {
        let url = format!("{}?page_size=1", self.values_url(variable));

        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", &self.auth_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Read {
                variable: variable.to_string(),
                status: status.as_u16(),
            });
        }

        let body: ValuesResponse = response.json().await?;
        let latest = body.results.first().map(|s| s.value);
        debug!(variable = %variable, value = ?latest, "read latest value");
        Ok(latest)
    }

    async fn write_latest(&self, variable: &str, value: f64) -> Result<Value, StoreError> {
        let request = WriteRequest {
            value,
            context: WriteContext {
                timestamp: chrono::Utc::now().to_rfc3339(),
                source: self.source_tag.clone(),
            },
        };

        let response = self
            .client
            .post(self.values_url(variable))
            .header("X-Auth-Token", &self.auth_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("HTTP error: {}", status.as_u16()));
            return Err(StoreError::Write {
                variable: variable.to_string(),
                message,
            });
        }

        let body = response.json().await?;
        debug!(variable = %variable, value = value, "value written");
        Ok(body)
    }
}
