// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::PathBuf;
use thiserror::Error;

use crate::cli::ConfigError;
use crate::edge::PublishError;
use crate::vision::{ImageError, ModelError};

/// Any failure that ends a run
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Failed to read image directory {}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to resolve working directory")]
    WorkingDirectory(#[source] std::io::Error),

    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}
