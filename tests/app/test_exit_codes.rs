// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use edge_image_inference::app::execute;
use edge_image_inference::{
    run_with_cancellation, AppError, AppOptions, ConfigError, ModelError, PublishError,
    EXIT_FAILURE,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn options(args: &[&str]) -> AppOptions {
    let mut argv = vec!["edge-image-inference"];
    argv.extend_from_slice(args);
    AppOptions::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn test_no_source_is_config_error() {
    let opts = options(&[]);
    if opts.device_id.is_some() || opts.images_dir.is_some() {
        // Selector supplied by the environment
        return;
    }

    let result = execute(&opts, CancellationToken::new()).await;
    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::MissingSource))
    ));
    assert_eq!(
        run_with_cancellation(opts, CancellationToken::new()).await,
        EXIT_FAILURE
    );
}

#[tokio::test]
async fn test_zero_input_size_is_config_error() {
    let opts = options(&["--imagedir", "images", "--input-size", "0"]);
    let result = execute(&opts, CancellationToken::new()).await;
    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::InvalidInputSize))
    ));
}

#[tokio::test]
async fn test_missing_model_fails() {
    let dir = TempDir::new().unwrap();
    let model = dir.path().join("missing.onnx");
    let images = dir.path().join("images");
    std::fs::create_dir(&images).unwrap();

    let opts = options(&[
        "--imagedir",
        images.to_str().unwrap(),
        "--model",
        model.to_str().unwrap(),
    ]);

    let result = execute(&opts, CancellationToken::new()).await;
    assert!(matches!(
        result,
        Err(AppError::Model(ModelError::NotFound(_)))
    ));
    assert_eq!(
        run_with_cancellation(opts, CancellationToken::new()).await,
        EXIT_FAILURE
    );
}

#[tokio::test]
async fn test_unloadable_model_fails() {
    let dir = TempDir::new().unwrap();
    let model = dir.path().join("garbage.onnx");
    std::fs::write(&model, b"this is not an onnx graph").unwrap();

    let opts = options(&[
        "--imagedir",
        dir.path().to_str().unwrap(),
        "--model",
        model.to_str().unwrap(),
    ]);

    let result = execute(&opts, CancellationToken::new()).await;
    assert!(matches!(result, Err(AppError::Model(ModelError::Load(_)))));
}

#[tokio::test]
async fn test_edge_without_endpoint_fails_before_model_load() {
    if std::env::var("EDGE_ENDPOINT").is_ok() {
        return;
    }

    let dir = TempDir::new().unwrap();
    let opts = options(&[
        "--edge",
        "--imagedir",
        dir.path().to_str().unwrap(),
        "--model",
        dir.path().join("missing.onnx").to_str().unwrap(),
    ]);

    let result = execute(&opts, CancellationToken::new()).await;
    assert!(matches!(
        result,
        Err(AppError::Publish(PublishError::MissingConfig("EDGE_ENDPOINT")))
    ));
}
