// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures for pipeline tests

use async_trait::async_trait;
use edge_image_inference::{
    Classifier, EventPublisher, ModelError, PublishError, ScoringInput, ScoringOutput,
    TensorLayout,
};
use image::{Rgb, RgbImage};
use mockall::mock;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

pub const RED: [u8; 3] = [230, 10, 10];
pub const GREEN: [u8; 3] = [10, 230, 10];
pub const BLUE: [u8; 3] = [10, 10, 230];

/// Labels an image by its dominant colour
///
/// Uses the default BGR layout at 8x8, so plane 0 is blue and plane 2 red.
/// Labels are returned most dominant first.
#[derive(Default)]
pub struct ColorClassifier {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Classifier for ColorClassifier {
    fn layout(&self) -> TensorLayout {
        TensorLayout {
            width: 8,
            height: 8,
            ..TensorLayout::default()
        }
    }

    async fn evaluate(&self, input: ScoringInput) -> Result<ScoringOutput, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let planes = ["blue", "green", "red"];
        let mut means: Vec<(f32, &str)> = planes
            .iter()
            .enumerate()
            .map(|(plane, name)| {
                let sum: f32 = input.data.slice(ndarray::s![0, plane, .., ..]).sum();
                (sum, *name)
            })
            .collect();
        means.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

        Ok(ScoringOutput {
            class_label: means.into_iter().map(|(_, name)| name.to_string()).collect(),
        })
    }
}

/// Cancels a token once it has classified `after` images
pub struct CancellingClassifier {
    pub inner: ColorClassifier,
    pub token: CancellationToken,
    pub after: usize,
}

#[async_trait]
impl Classifier for CancellingClassifier {
    fn layout(&self) -> TensorLayout {
        self.inner.layout()
    }

    async fn evaluate(&self, input: ScoringInput) -> Result<ScoringOutput, ModelError> {
        let output = self.inner.evaluate(input).await;
        if self.inner.calls.load(Ordering::SeqCst) >= self.after {
            self.token.cancel();
        }
        output
    }
}

mock! {
    pub Publisher {}

    #[async_trait]
    impl EventPublisher for Publisher {
        async fn send_event(&self, output_name: &str, payload: Vec<u8>) -> Result<(), PublishError>;
    }
}

/// Write a solid-colour PNG
pub fn write_image(dir: &Path, name: &str, color: [u8; 3]) {
    RgbImage::from_pixel(12, 10, Rgb(color))
        .save(dir.join(name))
        .unwrap();
}
