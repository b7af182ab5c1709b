// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX image classification model
//!
//! Wraps an ONNX Runtime session for a classifier such as a Custom Vision
//! export. Two output shapes are understood:
//! - a string tensor of class labels (`classLabel`), used as-is
//! - a numeric score vector, mapped through a labels file and ordered by
//!   descending score

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use ndarray::Array4;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::preprocessing::TensorLayout;
use crate::cli::ComputeDevice;

/// Output name used by Custom Vision classifiers for the label vector
pub const CLASS_LABEL_OUTPUT: &str = "classLabel";

/// Labels file looked up next to the model when none is given
pub const DEFAULT_LABELS_FILE: &str = "labels.txt";

/// Errors raised while loading or evaluating a model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load model")]
    Load(#[source] anyhow::Error),

    #[error("Inference failed")]
    Inference(#[source] anyhow::Error),

    #[error("Invalid input shape: {actual:?}, expected {expected:?}")]
    InvalidInput {
        expected: [usize; 4],
        actual: Vec<usize>,
    },

    #[error("Model returned no class labels")]
    EmptyOutput,
}

/// Model input for one image
#[derive(Debug, Clone)]
pub struct ScoringInput {
    /// NCHW tensor `[1, 3, H, W]`
    pub data: Array4<f32>,
}

/// Model output for one image
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOutput {
    /// Class labels, most likely first when the model provides an order
    pub class_label: Vec<String>,
}

/// Anything that can classify a preprocessed image
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Tensor layout this classifier expects
    fn layout(&self) -> TensorLayout;

    /// Run the model on one input
    async fn evaluate(&self, input: ScoringInput) -> Result<ScoringOutput, ModelError>;
}

/// ONNX Runtime backed classifier
#[derive(Clone)]
pub struct ScoringModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Output holding labels or scores
    label_output: String,
    /// Labels for score-vector outputs
    labels: Option<Arc<Vec<String>>>,
    layout: TensorLayout,
    device: ComputeDevice,
}

impl std::fmt::Debug for ScoringModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringModel")
            .field("input_name", &self.input_name)
            .field("label_output", &self.label_output)
            .field("labels", &self.labels.as_ref().map(|l| l.len()))
            .field("layout", &self.layout)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl ScoringModel {
    /// Load a model from an ONNX file
    ///
    /// # Arguments
    /// - `model_path`: Path to the ONNX model file
    /// - `device`: CPU or GPU; GPU falls back to CPU when CUDA is unavailable
    /// - `labels_path`: Labels file for score-vector outputs. When `None`,
    ///   `labels.txt` next to the model is used if it exists
    /// - `layout`: Tensor layout of the model input
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    /// - The labels file cannot be read
    pub async fn load(
        model_path: &Path,
        device: ComputeDevice,
        labels_path: Option<&Path>,
        layout: TensorLayout,
    ) -> Result<Self, ModelError> {
        if !model_path.is_file() {
            return Err(ModelError::NotFound(model_path.to_path_buf()));
        }

        let fingerprint = fingerprint_file(model_path)
            .await
            .map_err(ModelError::Load)?;
        debug!("Model sha256: {}", fingerprint);

        let (session, device) = build_session(model_path, device).map_err(ModelError::Load)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "data".to_string());

        let output_names: Vec<String> = session
            .outputs
            .iter()
            .map(|output| output.name.clone())
            .collect();
        let label_output = select_label_output(&output_names)
            .ok_or_else(|| ModelError::Load(anyhow!("Model has no outputs")))?;

        if let Some(input) = session.inputs.first() {
            debug!("Model input '{}': {:?}", input_name, input.input_type);
        }
        debug!("Model outputs: {:?}, labels from '{}'", output_names, label_output);

        let labels_path = labels_path
            .map(Path::to_path_buf)
            .or_else(|| default_labels_path(model_path));
        let labels = match labels_path {
            Some(path) => {
                let labels = load_labels(&path).await.map_err(ModelError::Load)?;
                info!("Loaded {} labels from {}", labels.len(), path.display());
                Some(Arc::new(labels))
            }
            None => None,
        };

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            label_output,
            labels,
            layout,
            device,
        })
    }

    /// Device the session runs on, after any CUDA fallback
    pub fn device(&self) -> ComputeDevice {
        self.device
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref().map(Vec::as_slice)
    }
}

#[async_trait]
impl Classifier for ScoringModel {
    fn layout(&self) -> TensorLayout {
        self.layout
    }

    async fn evaluate(&self, input: ScoringInput) -> Result<ScoringOutput, ModelError> {
        let expected = self.layout.shape();
        if input.data.shape() != &expected[..] {
            return Err(ModelError::InvalidInput {
                expected,
                actual: input.data.shape().to_vec(),
            });
        }

        let session = Arc::clone(&self.session);
        let input_name = self.input_name.clone();
        let label_output = self.label_output.clone();
        let labels = self.labels.clone();

        tokio::task::spawn_blocking(move || -> Result<ScoringOutput, ModelError> {
            let mut session = session
                .lock()
                .map_err(|_| ModelError::Inference(anyhow!("Session lock poisoned")))?;

            let input_value = Value::from_array(input.data)
                .context("Failed to create input tensor")
                .map_err(ModelError::Inference)?;

            let outputs = session
                .run(ort::inputs![input_name.as_str() => input_value])
                .context("Model evaluation failed")
                .map_err(ModelError::Inference)?;

            let output = &outputs[label_output.as_str()];

            // String label tensors come first; anything else is treated as scores
            if let Ok(strings) = output.try_extract_string_array() {
                return Ok(ScoringOutput {
                    class_label: strings.iter().cloned().collect(),
                });
            }

            let scores = output
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")
                .map_err(ModelError::Inference)?;
            let scores: Vec<f32> = scores.iter().copied().collect();

            Ok(ScoringOutput {
                class_label: rank_labels(&scores, labels.as_deref().map(Vec::as_slice)),
            })
        })
        .await
        .map_err(|e| ModelError::Inference(anyhow!("Inference task failed: {}", e)))?
    }
}

fn build_session(
    model_path: &Path,
    device: ComputeDevice,
) -> anyhow::Result<(Session, ComputeDevice)> {
    info!("Loading ONNX model from {}", model_path.display());

    if device == ComputeDevice::Gpu {
        info!("   Attempting CUDA execution provider...");
        let cuda_result = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .commit_from_file(model_path);

        match cuda_result {
            Ok(session) => {
                info!("✅ CUDA execution provider initialized");
                return Ok((session, ComputeDevice::Gpu));
            }
            Err(e) => {
                warn!("⚠️  CUDA execution provider failed: {}", e);
                warn!("   Falling back to CPU execution provider");
            }
        }
    }

    let session = Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(4)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!("Failed to load ONNX model from {}", model_path.display()))?;

    Ok((session, ComputeDevice::Cpu))
}

/// Prefer the Custom Vision label output, otherwise the first output
fn select_label_output(output_names: &[String]) -> Option<String> {
    output_names
        .iter()
        .find(|name| name.as_str() == CLASS_LABEL_OUTPUT)
        .or_else(|| output_names.first())
        .cloned()
}

fn default_labels_path(model_path: &Path) -> Option<PathBuf> {
    let candidate = model_path.with_file_name(DEFAULT_LABELS_FILE);
    candidate.is_file().then_some(candidate)
}

/// Read one label per non-empty line
pub async fn load_labels(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read labels file {}", path.display()))?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Order labels by descending score
///
/// Indices without a label are reported as their index.
pub fn rank_labels(scores: &[f32], labels: Option<&[String]>) -> Vec<String> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    order
        .into_iter()
        .map(|idx| {
            labels
                .and_then(|l| l.get(idx))
                .cloned()
                .unwrap_or_else(|| idx.to_string())
        })
        .collect()
}

async fn fingerprint_file(path: &Path) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read model file {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
