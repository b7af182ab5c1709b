// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for image classification
//!
//! This module provides:
//! - Image decoding with EXIF orientation
//! - Conversion to the model's tensor layout
//! - ONNX Runtime classification on CPU or GPU

pub mod image_utils;
pub mod preprocessing;
pub mod scoring_model;

pub use image_utils::{
    decode_image_bytes, detect_format, list_image_files, load_image_file, ImageError, ImageInfo,
};
pub use preprocessing::{image_to_tensor, ChannelOrder, PixelScale, TensorLayout};
pub use scoring_model::{Classifier, ModelError, ScoringInput, ScoringModel, ScoringOutput};
