// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the edge image inference module

/// Application name used in startup logs
pub const APP_NAME: &str = "edge-image-inference";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-11-04";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "onnx-classification",
    "cpu-inference",
    "cuda-inference",
    "image-directory",
    "exif-orientation",
    "edge-publishing",
    "graceful-cancellation",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("{} {} ({})", APP_NAME, VERSION_NUMBER, BUILD_DATE)
}
