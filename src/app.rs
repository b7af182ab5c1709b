// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Top-level run: validate options, connect to the edge, load the model and
//! classify the image directory

use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::AppOptions;
use crate::edge::{EdgeModuleClient, EventPublisher};
use crate::error::AppError;
use crate::pipeline::{ImagePipeline, RunSummary};
use crate::utils::{block_timer, log_error_chain};
use crate::version;
use crate::vision::ScoringModel;

/// Exit code of a completed run
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code of a configuration error or failed run
pub const EXIT_FAILURE: i32 = -1;

/// Run with Ctrl-C / SIGTERM wired to cancellation
pub async fn run(options: AppOptions) -> i32 {
    let cancel = CancellationToken::new();
    install_shutdown_handlers(cancel.clone());
    run_with_cancellation(options, cancel).await
}

/// Run until done, failed or cancelled, returning the process exit code
pub async fn run_with_cancellation(options: AppOptions, cancel: CancellationToken) -> i32 {
    match execute(&options, cancel).await {
        Ok(summary) => {
            info!(
                "Finished: {} images classified{}",
                summary.messages.len(),
                if summary.cancelled { " (cancelled)" } else { "" }
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            log_error_chain(e);
            EXIT_FAILURE
        }
    }
}

/// Perform the whole run, returning every record produced
pub async fn execute(options: &AppOptions, cancel: CancellationToken) -> Result<RunSummary, AppError> {
    options.validate()?;

    let edge_client = if options.use_edge {
        info!("{} module starting.", version::APP_NAME);
        let (client, _) = block_timer("Initializing edge module client", init_edge()).await;
        Some(client?)
    } else {
        None
    };

    let model_path = resolve_path(&options.model_path)?;
    let device = options.compute_device();
    let labels_path = options
        .labels_path
        .as_deref()
        .map(resolve_path)
        .transpose()?;

    let label = format!(
        "Loading modelfile '{}' on the {}",
        options.model_path.display(),
        device.as_str()
    );
    let (model, _) = block_timer(&label, async {
        debug!("Model path: {}", model_path.display());
        ScoringModel::load(
            &model_path,
            device,
            labels_path.as_deref(),
            options.tensor_layout(),
        )
        .await
    })
    .await;
    let model = model?;
    match model.labels() {
        Some(labels) => info!(
            "Model ready on the {} with {} labels",
            model.device().as_str(),
            labels.len()
        ),
        None => info!("Model ready on the {}", model.device().as_str()),
    }

    let Some(images_dir) = options.images_dir.as_deref() else {
        if let Some(device_id) = &options.device_id {
            warn!(
                "⚠️  Live capture from device '{}' is not supported; no frames will be processed",
                device_id
            );
        }
        return Ok(RunSummary::default());
    };

    let images_dir = resolve_path(images_dir)?;
    debug!("Image directory: {}", images_dir.display());

    let mut pipeline = ImagePipeline::new(&model, cancel);
    if let Some(client) = edge_client.as_ref() {
        pipeline = pipeline.with_publisher(client as &dyn EventPublisher, options.publish_interval());
    }

    pipeline.process_directory(&images_dir).await
}

async fn init_edge() -> Result<EdgeModuleClient, AppError> {
    let mut client = EdgeModuleClient::create_from_env()?;
    debug!("create_from_env OK");

    client.open().await?;
    debug!("open OK");

    info!("Edge module client initialized.");
    Ok(client)
}

/// Resolve a path against the current working directory
fn resolve_path(path: &Path) -> Result<PathBuf, AppError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(AppError::WorkingDirectory)?;
    Ok(cwd.join(path))
}

fn install_shutdown_handlers(cancel: CancellationToken) {
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️  Interrupt received, stopping after the current image");
            on_ctrl_c.cancel();
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut term) = signal(SignalKind::terminate()) {
            if term.recv().await.is_some() {
                warn!("⚠️  Termination requested, stopping after the current image");
                cancel.cancel();
            }
        }
    });
}
