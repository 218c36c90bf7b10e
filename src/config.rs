//! Endpoint configuration
//!
//! Two endpoints are configured once per process: the REST/SSE API and the
//! object store that serves original and transformed image bytes.

use std::time::Duration;

use reqwest::Url;

use crate::shared::errors::ClientError;

pub const API_URL_ENV: &str = "HENKAN_API_URL";
pub const STORAGE_URL_ENV: &str = "HENKAN_BUCKET_ENDPOINT";
pub const REQUEST_TIMEOUT_ENV: &str = "HENKAN_REQUEST_TIMEOUT_SECS";

/// Local development API (the service's default listen port)
pub const DEFAULT_API_URL: &str = "http://localhost:42069";
/// Local development bucket endpoint (MinIO)
pub const DEFAULT_STORAGE_URL: &str = "http://localhost:9000/images";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST/SSE API, without trailing slash
    pub api_url: String,
    /// Base URL objects are served from, without trailing slash
    pub storage_url: String,
    /// Applies to REST calls and object fetches, never to event streams
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: &str, storage_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            api_url: normalize_base_url("API URL", api_url)?,
            storage_url: normalize_base_url("storage URL", storage_url)?,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        })
    }

    /// Read configuration from the process environment, falling back to the
    /// local-development defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = non_empty(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let storage_url =
            non_empty(STORAGE_URL_ENV).unwrap_or_else(|| DEFAULT_STORAGE_URL.to_string());

        let mut config = Self::new(&api_url, &storage_url)?;

        if let Some(raw) = non_empty(REQUEST_TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{} must be a whole number of seconds, got '{}'", REQUEST_TIMEOUT_ENV, raw))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

fn normalize_base_url(label: &str, raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|e| ClientError::Config(format!("invalid {} '{}': {}", label, raw, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!(
            "{} must use http or https, got '{}'",
            label, raw
        )));
    }
    Ok(trimmed.to_string())
}
