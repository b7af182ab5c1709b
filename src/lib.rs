// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod app;
pub mod cli;
pub mod edge;
pub mod error;
pub mod message;
pub mod pipeline;
pub mod utils;
pub mod version;
pub mod vision;

pub use app::{run, run_with_cancellation, EXIT_FAILURE, EXIT_SUCCESS};
pub use cli::{AppOptions, ComputeDevice, ConfigError};
pub use edge::{EdgeConfig, EdgeModuleClient, EventPublisher, PublishError};
pub use error::AppError;
pub use message::{LabelResult, MessageBody, ResultMetrics, PLACEHOLDER_CONFIDENCE};
pub use pipeline::{ImagePipeline, RunSummary};
pub use vision::{Classifier, ModelError, ScoringInput, ScoringModel, ScoringOutput, TensorLayout};
