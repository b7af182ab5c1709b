// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Command-line options for the image inference module

use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::app::EXIT_FAILURE;
use crate::vision::preprocessing::{ChannelOrder, PixelScale, TensorLayout};

/// Default model file, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "CustomVision.onnx";

/// Default delay after each edge publish
pub const DEFAULT_PUBLISH_INTERVAL_MS: u64 = 500;

/// Configuration errors detected before any work starts
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Please use --device to specify which camera to use or --imagedir to specify a set of images")]
    MissingSource,

    #[error("Input size must be greater than 0")]
    InvalidInputSize,
}

/// Where inference executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDevice {
    Cpu,
    Gpu,
}

impl ComputeDevice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeDevice::Cpu => "CPU",
            ComputeDevice::Gpu => "GPU",
        }
    }
}

/// Channel order accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChannelOrderArg {
    Rgb,
    Bgr,
}

/// Pixel normalisation accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PixelScaleArg {
    /// 0-255, unnormalised
    Raw,
    /// 0-1
    Unit,
    /// ImageNet mean/std
    Imagenet,
}

/// Edge image inference module
#[derive(Parser, Debug, Clone)]
#[command(name = "edge-image-inference")]
#[command(version)]
#[command(about = "Classify images with an ONNX model and publish results to an edge endpoint", long_about = None)]
pub struct AppOptions {
    /// Camera to use (live capture is not performed by this module)
    #[arg(short = 'd', long = "device", env = "CAMERA_DEVICE")]
    pub device_id: Option<String>,

    /// Directory of images to classify, relative to the working directory
    #[arg(short = 'i', long = "imagedir", env = "IMAGE_DIR")]
    pub images_dir: Option<PathBuf>,

    /// Model file, relative to the working directory
    #[arg(short = 'm', long = "model", env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Run inference on the GPU
    #[arg(short = 'g', long = "gpu")]
    pub use_gpu: bool,

    /// Publish results to the edge endpoint
    #[arg(short = 'e', long = "edge", env = "USE_EDGE")]
    pub use_edge: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Labels file for models that output a score vector (defaults to labels.txt next to the model)
    #[arg(long = "labels", env = "LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// Square input size expected by the model
    #[arg(long, default_value_t = 224)]
    pub input_size: u32,

    /// Channel order expected by the model
    #[arg(long, value_enum, default_value_t = ChannelOrderArg::Bgr)]
    pub channel_order: ChannelOrderArg,

    /// Pixel normalisation expected by the model
    #[arg(long, value_enum, default_value_t = PixelScaleArg::Raw)]
    pub pixel_scale: PixelScaleArg,

    /// Delay after each edge publish, in milliseconds
    #[arg(long, default_value_t = DEFAULT_PUBLISH_INTERVAL_MS)]
    pub publish_interval_ms: u64,
}

impl AppOptions {
    /// Parse a command line, printing clap's output on failure
    ///
    /// Help and version requests end the process like any other parse
    /// failure, with the failure exit code, since no run takes place.
    pub fn parse_args<I, T>(args: I) -> Result<Self, i32>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| {
            let _ = e.print();
            EXIT_FAILURE
        })
    }

    /// Check that there is something to work on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = |v: Option<&str>| v.map_or(true, |s| s.trim().is_empty());
        // Non-UTF-8 paths are only blank when empty
        let missing_path = |p: Option<&Path>| {
            p.map_or(true, |p| {
                p.to_str()
                    .map_or(p.as_os_str().is_empty(), |s| s.trim().is_empty())
            })
        };

        if missing(self.device_id.as_deref()) && missing_path(self.images_dir.as_deref()) {
            return Err(ConfigError::MissingSource);
        }
        if self.input_size == 0 {
            return Err(ConfigError::InvalidInputSize);
        }
        Ok(())
    }

    pub fn compute_device(&self) -> ComputeDevice {
        if self.use_gpu {
            ComputeDevice::Gpu
        } else {
            ComputeDevice::Cpu
        }
    }

    pub fn tensor_layout(&self) -> TensorLayout {
        TensorLayout {
            width: self.input_size,
            height: self.input_size,
            channel_order: match self.channel_order {
                ChannelOrderArg::Rgb => ChannelOrder::Rgb,
                ChannelOrderArg::Bgr => ChannelOrder::Bgr,
            },
            pixel_scale: match self.pixel_scale {
                PixelScaleArg::Raw => PixelScale::Raw,
                PixelScaleArg::Unit => PixelScale::Unit,
                PixelScaleArg::Imagenet => PixelScale::ImageNet,
            },
        }
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }
}
