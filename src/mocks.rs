use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{FaceSegError, Result};
use crate::preprocess::CHANNEL_MEAN_BGR;
use crate::traits::SegmentationNetwork;
use ndarray::prelude::*;

/// Test network that classifies pixels by blue intensity.
///
/// With `num_classes` classes, a pixel whose original blue value is `b`
/// gets label `b * num_classes / 256`: black is class 0 and pure blue is the
/// last class.
#[derive(Debug)]
pub struct MockSegmentationNetwork {
    pub num_classes: usize,
    calls: AtomicUsize,
}

impl MockSegmentationNetwork {
    pub const fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many forward passes ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SegmentationNetwork for MockSegmentationNetwork {
    fn infer(&self, tensor: ArrayView3<f32>) -> Result<Array3<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let (channels, height, width) = tensor.dim();
        if channels != 3 {
            return Err(FaceSegError::validation(
                "input tensor",
                format!("expected 3 channels, got {channels}"),
            ));
        }

        let blue = tensor.index_axis(Axis(0), 0);
        let classes = self.num_classes as f32;
        Ok(Array3::from_shape_fn(
            (self.num_classes, height, width),
            |(class, y, x)| {
                let value = blue[[y, x]] + CHANNEL_MEAN_BGR[0] as f32;
                let target = value * classes / 256.0;
                -(target - class as f32 - 0.5).powi(2)
            },
        ))
    }
}

/// Test network that always fails.
#[derive(Debug, Default)]
pub struct FailingNetwork;

impl SegmentationNetwork for FailingNetwork {
    fn infer(&self, _tensor: ArrayView3<f32>) -> Result<Array3<f32>> {
        Err(FaceSegError::Model {
            operation: "mock forward pass".to_string(),
            source: "network unavailable".into(),
        })
    }
}

pub const fn create_mock_network() -> MockSegmentationNetwork {
    MockSegmentationNetwork::new(3)
}
