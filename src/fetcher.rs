//! Settings fetcher boundary and its HTTP implementation
//!
//! The manager only ever sees the [`SettingsFetcher`] trait: one round-trip
//! that returns the full current set of settings or an error. [`HttpFetcher`]
//! is the production implementation speaking the configuration service's
//! HTTP contract: a GET to the settings endpoint carrying the calling
//! service's name in a header, answered with HTTP 200 and a JSON array of
//! settings.

use crate::error::{ConfigError, Result};
use crate::types::Setting;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, instrument, warn};

/// Request header identifying the calling service
pub const SERVICE_NAME_HEADER: &str = "SERVICE_NAME";

/// One round-trip to the configuration service.
///
/// Implementations are free to enforce their own timeouts and retry policy;
/// the manager treats a fetch as an indivisible success or failure.
#[async_trait]
pub trait SettingsFetcher: Send + Sync {
    /// Fetch the full current set of settings
    async fn fetch(&self) -> Result<Vec<Setting>>;
}

/// Configuration for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Name of the calling service, sent in the `SERVICE_NAME` header
    pub service_name: String,
    /// Full URL of the settings endpoint
    pub endpoint: String,
    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
    /// Retries within one fetch for transport and 5xx failures (default: 2)
    pub max_retries: usize,
}

impl HttpFetcherConfig {
    /// Create a new configuration with the minimum required parameters
    pub fn new(service_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            endpoint: endpoint.into(),
            timeout_secs: 10,
            max_retries: 2,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the maximum retry attempts within one fetch
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// HTTP implementation of the fetcher boundary
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: HttpFetcherConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration
    pub fn new(config: HttpFetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::fetch_with_source("failed to create HTTP client", e))?;

        Ok(Self { client, config })
    }

    /// One request/response exchange, returning the raw body on HTTP 200.
    async fn round_trip(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .header(SERVICE_NAME_HEADER, &self.config.service_name)
            .send()
            .await
            .map_err(|e| ConfigError::fetch_with_source("request to config service failed", e))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "config service returned unexpected status");
            return Err(ConfigError::fetch_with_status(
                format!("unexpected status code: {}", status.as_u16()),
                status.as_u16(),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| ConfigError::fetch_with_source("failed to read response body", e))
    }
}

#[async_trait]
impl SettingsFetcher for HttpFetcher {
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    async fn fetch(&self) -> Result<Vec<Setting>> {
        let backoff = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(self.config.max_retries);

        let body = RetryIf::spawn(
            backoff,
            || self.round_trip(),
            |err: &ConfigError| {
                let retry = err.is_retryable();
                if retry {
                    warn!(error = %err, "fetch attempt failed, will retry");
                }
                retry
            },
        )
        .await?;

        let settings: Vec<Setting> = serde_json::from_str(&body).map_err(|e| ConfigError::Fetch {
            message: "failed to deserialize response from config service".to_string(),
            status: Some(StatusCode::OK.as_u16()),
            source: Some(Box::new(e)),
        })?;

        debug!(count = settings.len(), "fetched settings from config service");
        Ok(settings)
    }
}
