// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the edge endpoint

use std::env;
use std::time::Duration;
use url::Url;

use super::PublishError;

/// Default module identity when `EDGE_MODULE_ID` is not set
pub const DEFAULT_MODULE_ID: &str = "image-inference";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the edge endpoint
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    /// Base URL of the endpoint's HTTP ingress
    pub endpoint: Url,
    /// Device this module runs on
    pub device_id: String,
    /// Identity of this module
    pub module_id: String,
    /// Bearer token sent with every event
    pub auth_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl EdgeConfig {
    /// Load configuration from environment variables
    ///
    /// - `EDGE_ENDPOINT` (required)
    /// - `EDGE_DEVICE_ID` (required)
    /// - `EDGE_MODULE_ID` (default `image-inference`)
    /// - `EDGE_AUTH_TOKEN` (optional)
    /// - `EDGE_TIMEOUT_SECS` (default 10)
    pub fn from_env() -> Result<Self, PublishError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self, PublishError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = get("EDGE_ENDPOINT").ok_or(PublishError::MissingConfig("EDGE_ENDPOINT"))?;
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| PublishError::InvalidConfig(format!("EDGE_ENDPOINT '{}': {}", endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(PublishError::InvalidConfig(format!(
                "EDGE_ENDPOINT must use http or https, got '{}'",
                endpoint.scheme()
            )));
        }

        let device_id = get("EDGE_DEVICE_ID").ok_or(PublishError::MissingConfig("EDGE_DEVICE_ID"))?;
        let module_id = get("EDGE_MODULE_ID").unwrap_or_else(|| DEFAULT_MODULE_ID.to_string());

        let timeout_secs = get("EDGE_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            endpoint,
            device_id,
            module_id,
            auth_token: get("EDGE_AUTH_TOKEN"),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// URL that receives events for a module output
    pub fn output_url(&self, output_name: &str) -> Result<Url, PublishError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| PublishError::InvalidConfig("EDGE_ENDPOINT cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend([
                "devices",
                self.device_id.as_str(),
                "modules",
                self.module_id.as_str(),
                "outputs",
                output_name,
            ]);
        Ok(url)
    }
}
