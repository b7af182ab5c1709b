// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP client for sending module events to the edge endpoint

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info};

use super::{EdgeConfig, EventPublisher, PublishError};

/// Client for one module on one device
///
/// Events are POSTed to
/// `{endpoint}/devices/{device}/modules/{module}/outputs/{output}`.
pub struct EdgeModuleClient {
    config: EdgeConfig,
    client: Option<Client>,
}

impl EdgeModuleClient {
    pub fn new(config: EdgeConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Create a client from `EDGE_*` environment variables
    pub fn create_from_env() -> Result<Self, PublishError> {
        let config = EdgeConfig::from_env()?;
        debug!("Edge configuration loaded for device {}", config.device_id);
        Ok(Self::new(config))
    }

    /// Prepare the HTTP client
    pub async fn open(&mut self) -> Result<(), PublishError> {
        let client = Client::builder().timeout(self.config.timeout).build()?;
        self.client = Some(client);

        info!(
            "Edge module client opened for {}/{} at {}",
            self.config.device_id, self.config.module_id, self.config.endpoint
        );
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

#[async_trait]
impl EventPublisher for EdgeModuleClient {
    async fn send_event(&self, output_name: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        let client = self.client.as_ref().ok_or(PublishError::NotOpen)?;
        let url = self.config.output_url(output_name)?;

        let mut request = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PublishError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Event sent to output '{}' ({})", output_name, status);
        Ok(())
    }
}
