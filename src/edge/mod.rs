// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Publishing results to a device-management (edge) endpoint
//!
//! Components:
//! - `config` - Endpoint configuration from the environment
//! - `module_client` - HTTP client that posts events to a module output
//! - `EventPublisher` - Seam used by the image pipeline

pub mod config;
pub mod module_client;

use async_trait::async_trait;
use thiserror::Error;

pub use config::EdgeConfig;
pub use module_client::EdgeModuleClient;

/// Module output that receives classification results
pub const RESULTS_OUTPUT: &str = "resultsOutput";

/// Errors raised while configuring or sending to the edge endpoint
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Missing edge configuration: {0} is not set")]
    MissingConfig(&'static str),

    #[error("Invalid edge configuration: {0}")]
    InvalidConfig(String),

    #[error("Edge client is not open")]
    NotOpen,

    #[error("Edge request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Edge endpoint returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Sends event payloads to a named output
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn send_event(&self, output_name: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}
