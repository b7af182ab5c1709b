// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::support::{write_image, ColorClassifier, MockPublisher, BLUE, RED};
use edge_image_inference::{AppError, ImagePipeline, MessageBody, PublishError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_one_event_per_image() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "1.png", RED);
    write_image(dir.path(), "2.png", BLUE);

    let sent: Arc<Mutex<Vec<(String, Vec<u8>)>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = sent.clone();

    let mut publisher = MockPublisher::new();
    publisher
        .expect_send_event()
        .times(2)
        .returning(move |output, payload| {
            recorder
                .lock()
                .unwrap()
                .push((output.to_string(), payload));
            Ok(())
        });

    let classifier = ColorClassifier::default();
    let pipeline = ImagePipeline::new(&classifier, CancellationToken::new())
        .with_publisher(&publisher, Duration::ZERO);
    let summary = pipeline.process_directory(dir.path()).await.unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    for ((output, payload), record) in sent.iter().zip(&summary.messages) {
        assert_eq!(output, "resultsOutput");
        let body: MessageBody = serde_json::from_slice(payload).unwrap();
        assert_eq!(body.results.len(), 1);
        assert_eq!(&body, record);
    }
}

#[tokio::test]
async fn test_publish_failure_ends_run() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "1.png", RED);
    write_image(dir.path(), "2.png", BLUE);

    let mut publisher = MockPublisher::new();
    publisher.expect_send_event().times(1).returning(|_, _| {
        Err(PublishError::Status {
            status: 500,
            message: "down".to_string(),
        })
    });

    let classifier = ColorClassifier::default();
    let pipeline = ImagePipeline::new(&classifier, CancellationToken::new())
        .with_publisher(&publisher, Duration::ZERO);
    let result = pipeline.process_directory(dir.path()).await;

    assert!(matches!(
        result,
        Err(AppError::Publish(PublishError::Status { status: 500, .. }))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_publish_interval_is_observed() {
    let dir = TempDir::new().unwrap();
    write_image(dir.path(), "1.png", RED);
    write_image(dir.path(), "2.png", BLUE);

    let mut publisher = MockPublisher::new();
    publisher.expect_send_event().times(2).returning(|_, _| Ok(()));

    let classifier = ColorClassifier::default();
    let pipeline = ImagePipeline::new(&classifier, CancellationToken::new())
        .with_publisher(&publisher, Duration::from_millis(500));

    let start = tokio::time::Instant::now();
    let summary = pipeline.process_directory(dir.path()).await.unwrap();

    assert_eq!(summary.messages.len(), 2);
    assert!(start.elapsed() >= Duration::from_millis(1000));
}
