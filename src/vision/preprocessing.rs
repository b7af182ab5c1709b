// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for classification models
//!
//! Converts a decoded image into the NCHW `f32` tensor a model expects.
//! The default layout matches Custom Vision ONNX exports: 224x224, BGR,
//! unnormalised 0-255 pixel values.

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Default square input size for Custom Vision classifiers
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// ImageNet normalization mean values
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet normalization std values
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Order of the colour planes in the tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// How 8-bit pixel values are mapped to floats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelScale {
    /// Values kept in 0..=255
    Raw,
    /// Values divided by 255
    Unit,
    /// (pixel/255 - mean) / std with ImageNet statistics
    ImageNet,
}

/// Shape and encoding of a model's image input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensorLayout {
    pub width: u32,
    pub height: u32,
    pub channel_order: ChannelOrder,
    pub pixel_scale: PixelScale,
}

impl Default for TensorLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_INPUT_SIZE,
            height: DEFAULT_INPUT_SIZE,
            channel_order: ChannelOrder::Bgr,
            pixel_scale: PixelScale::Raw,
        }
    }
}

impl TensorLayout {
    /// Tensor shape `[1, 3, H, W]`
    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.height as usize, self.width as usize]
    }

    fn normalize(&self, value: u8, rgb_channel: usize) -> f32 {
        let v = value as f32;
        match self.pixel_scale {
            PixelScale::Raw => v,
            PixelScale::Unit => v / 255.0,
            PixelScale::ImageNet => (v / 255.0 - MEAN[rgb_channel]) / STD[rgb_channel],
        }
    }
}

/// Preprocess an image into the model's tensor layout
///
/// Steps:
/// 1. Resize to cover the target and center crop (no distortion)
/// 2. Convert to RGB, ignoring any alpha channel
/// 3. Scale pixel values per `layout.pixel_scale`
/// 4. Write planes in `layout.channel_order` as NCHW `[1, 3, H, W]`
pub fn image_to_tensor(image: &DynamicImage, layout: &TensorLayout) -> Array4<f32> {
    let resized = center_crop_resize(image, layout.width, layout.height);
    let rgb = resized.to_rgb8();

    let (width, height) = (layout.width as usize, layout.height as usize);
    let mut tensor = Array4::zeros((1, 3, height, width));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for rgb_channel in 0..3 {
            let plane = match layout.channel_order {
                ChannelOrder::Rgb => rgb_channel,
                ChannelOrder::Bgr => 2 - rgb_channel,
            };
            tensor[[0, plane, y, x]] = layout.normalize(pixel[rgb_channel], rgb_channel);
        }
    }

    tensor
}

/// Resize with center crop to exactly `target_w` x `target_h`
pub fn center_crop_resize(image: &DynamicImage, target_w: u32, target_h: u32) -> DynamicImage {
    let (orig_w, orig_h) = image.dimensions();

    if orig_w == 0 || orig_h == 0 {
        return DynamicImage::ImageRgb8(RgbImage::from_pixel(
            target_w,
            target_h,
            Rgb([128, 128, 128]),
        ));
    }
    if (orig_w, orig_h) == (target_w, target_h) {
        return image.clone();
    }

    // Scale to cover the target (use larger scale)
    let scale_w = target_w as f32 / orig_w as f32;
    let scale_h = target_h as f32 / orig_h as f32;
    let scale = scale_w.max(scale_h);

    let new_w = ((orig_w as f32 * scale).round() as u32).max(target_w);
    let new_h = ((orig_h as f32 * scale).round() as u32).max(target_h);

    let resized = image.resize_exact(new_w, new_h, FilterType::Triangle);

    let crop_x = (new_w - target_w) / 2;
    let crop_y = (new_h - target_h) / 2;

    resized.crop_imm(crop_x, crop_y, target_w, target_h)
}
