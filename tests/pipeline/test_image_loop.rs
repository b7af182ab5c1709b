// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::support::{write_image, ColorClassifier, BLUE, GREEN, RED};
use edge_image_inference::vision::ImageError;
use edge_image_inference::{AppError, ImagePipeline, PLACEHOLDER_CONFIDENCE};
use std::sync::atomic::Ordering;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_empty_directory_produces_no_records() {
    let dir = TempDir::new().unwrap();
    let classifier = ColorClassifier::default();
    let pipeline = ImagePipeline::new(&classifier, CancellationToken::new());

    let summary = pipeline.process_directory(dir.path()).await.unwrap();

    assert!(summary.messages.is_empty());
    assert!(!summary.cancelled);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_images_processed_in_sorted_order() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "03_blue.png", BLUE);
    write_image(dir.path(), "01_red.png", RED);
    write_image(dir.path(), "02_green.png", GREEN);

    let classifier = ColorClassifier::default();
    let pipeline = ImagePipeline::new(&classifier, CancellationToken::new());
    let summary = pipeline.process_directory(dir.path()).await.unwrap();

    let labels: Vec<_> = summary
        .messages
        .iter()
        .map(|m| m.results[0].label.as_str())
        .collect();
    assert_eq!(labels, vec!["red", "green", "blue"]);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_every_record_has_one_placeholder_result() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "a.png", RED);
    write_image(dir.path(), "b.png", BLUE);

    let classifier = ColorClassifier::default();
    let pipeline = ImagePipeline::new(&classifier, CancellationToken::new());
    let summary = pipeline.process_directory(dir.path()).await.unwrap();

    assert_eq!(summary.messages.len(), 2);
    for message in &summary.messages {
        assert_eq!(message.results.len(), 1);
        assert_eq!(message.results[0].confidence, PLACEHOLDER_CONFIDENCE);
    }
}

#[tokio::test]
async fn test_non_image_file_aborts_run() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "01_red.png", RED);
    std::fs::write(dir.path().join("02_notes.txt"), b"not an image at all").unwrap();
    write_image(dir.path(), "03_blue.png", BLUE);

    let classifier = ColorClassifier::default();
    let pipeline = ImagePipeline::new(&classifier, CancellationToken::new());
    let result = pipeline.process_directory(dir.path()).await;

    assert!(matches!(
        result,
        Err(AppError::Image(ImageError::UnsupportedFormat))
    ));
    // The first image was classified before the failure
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_subdirectories_are_skipped() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "only.png", GREEN);
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let classifier = ColorClassifier::default();
    let pipeline = ImagePipeline::new(&classifier, CancellationToken::new());
    let summary = pipeline.process_directory(dir.path()).await.unwrap();

    assert_eq!(summary.messages.len(), 1);
    assert_eq!(summary.messages[0].results[0].label, "green");
}
