// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sequential image classification loop
//!
//! Every image goes through decode → tensor → evaluate → record → log →
//! optional publish, one at a time. The first failure ends the run.

use image::DynamicImage;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::edge::{EventPublisher, RESULTS_OUTPUT};
use crate::error::AppError;
use crate::message::{results_to_message, MessageBody};
use crate::utils::block_timer;
use crate::vision::{image_to_tensor, list_image_files, load_image_file, Classifier, ScoringInput};

/// Outcome of a directory run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Records in processing order
    pub messages: Vec<MessageBody>,
    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
}

/// Classifies images with one model, optionally publishing each result
pub struct ImagePipeline<'a, C: Classifier + ?Sized> {
    classifier: &'a C,
    publisher: Option<&'a dyn EventPublisher>,
    publish_interval: Duration,
    cancel: CancellationToken,
}

impl<'a, C: Classifier + ?Sized> ImagePipeline<'a, C> {
    pub fn new(classifier: &'a C, cancel: CancellationToken) -> Self {
        Self {
            classifier,
            publisher: None,
            publish_interval: Duration::ZERO,
            cancel,
        }
    }

    /// Publish every result, waiting `interval` after each send
    pub fn with_publisher(mut self, publisher: &'a dyn EventPublisher, interval: Duration) -> Self {
        self.publisher = Some(publisher);
        self.publish_interval = interval;
        self
    }

    /// Classify every file of `dir` in enumeration order
    pub async fn process_directory(&self, dir: &Path) -> Result<RunSummary, AppError> {
        let files = list_image_files(dir)
            .await
            .map_err(|source| AppError::Directory {
                path: dir.to_path_buf(),
                source,
            })?;
        info!("Found {} files in {}", files.len(), dir.display());

        let mut summary = RunSummary::default();
        for file in files {
            if self.cancel.is_cancelled() {
                warn!("⚠️  Run cancelled, {} images processed", summary.messages.len());
                summary.cancelled = true;
                break;
            }

            debug!("Opening {}...", file.display());
            let (image, info) = load_image_file(&file).await?;
            debug!(
                "Decoded {}x{} {:?} ({} bytes)",
                info.width, info.height, info.format, info.size_bytes
            );

            let message = self.process_frame(&image).await?;
            summary.messages.push(message);
        }

        Ok(summary)
    }

    /// Classify one decoded image
    pub async fn process_frame(&self, image: &DynamicImage) -> Result<MessageBody, AppError> {
        let input = ScoringInput {
            data: image_to_tensor(image, &self.classifier.layout()),
        };

        let (outcome, eval_ms) =
            block_timer("Running the model", self.classifier.evaluate(input)).await;
        let outcome = outcome?;

        let mut message = results_to_message(&outcome)?;
        message.metrics.evaltimeinms = eval_ms;

        let json = message.to_json()?;
        info!("Recognized {}", json);

        if let Some(publisher) = self.publisher {
            publisher
                .send_event(RESULTS_OUTPUT, json.into_bytes())
                .await?;

            // Avoid flooding the endpoint
            if !self.publish_interval.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.publish_interval) => {}
                    _ = self.cancel.cancelled() => {}
                }
            }
        }

        Ok(message)
    }
}
