//! Image preprocessing for the face parsing network.
//!
//! The network was trained on 500x500 BGR images with the per-channel mean
//! removed, laid out channel-first. The steps below reproduce that exactly and
//! in the same order: resize, RGB to BGR, mean subtraction, `(C, H, W)` layout.

use std::path::Path;

use crate::errors::{FaceSegError, Result};
use image::{imageops, imageops::FilterType, DynamicImage, RgbImage};
use ndarray::prelude::*;

/// Spatial resolution (width and height) fed to the network.
pub const INPUT_SIZE: u32 = 500;

/// Mean pixel value per channel, in B, G, R order.
pub const CHANNEL_MEAN_BGR: [f64; 3] = [104.00698793, 116.66876762, 122.67891434];

/// Resampling filter used for the resize step.
pub const RESIZE_FILTER: FilterType = FilterType::Nearest;

/// Decode an image from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| FaceSegError::ImageProcessing {
        path: path.display().to_string(),
        operation: "image decode".to_string(),
        source: Box::new(e),
    })
}

/// Resize an image to the network resolution as 8-bit RGB.
pub fn resize_rgb(image: &DynamicImage) -> RgbImage {
    let rgb = image.to_rgb8();
    imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, RESIZE_FILTER)
}

/// Turn a decoded image into the `(3, 500, 500)` BGR, mean-subtracted tensor.
pub fn preprocess(image: &DynamicImage) -> Array3<f32> {
    let resized = resize_rgb(image);
    let (width, height) = resized.dimensions();

    // channel-first, channel axis reversed: RGB -> BGR
    Array3::from_shape_fn((3, height as usize, width as usize), |(c, y, x)| {
        let value = resized.get_pixel(x as u32, y as u32)[2 - c];
        (f64::from(value) - CHANNEL_MEAN_BGR[c]) as f32
    })
}
